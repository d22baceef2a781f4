//! Scanned-item model
//!
//! A `Qcable` is the resolved record behind one scanned barcode, as returned
//! by the remote lookup service. It is recreated on every lookup cycle and
//! entirely superseded by the next one; nothing merges incrementally.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Usage state of a scanned item.
///
/// The upstream service reports the state as a free-form string; only
/// `available` and `used` carry meaning for the rule chain, everything else
/// is preserved verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum QcableState {
    /// The item may be consumed by a conversion.
    Available,
    /// The item has already been consumed.
    Used,
    /// Any other upstream state (pending, destroyed, ...), kept verbatim.
    Other(String),
}

impl QcableState {
    /// Whether the item is still consumable.
    #[must_use]
    pub const fn is_available(&self) -> bool {
        matches!(self, Self::Available)
    }

    /// The upstream wire spelling of this state.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Available => "available",
            Self::Used => "used",
            Self::Other(raw) => raw,
        }
    }
}

impl From<String> for QcableState {
    fn from(raw: String) -> Self {
        // The service is not consistent about casing ("available" vs
        // "Available"); match case-insensitively, keep the raw spelling
        // for states we do not interpret.
        match raw.to_ascii_lowercase().as_str() {
            "available" => Self::Available,
            "used" => Self::Used,
            _ => Self::Other(raw),
        }
    }
}

impl From<&str> for QcableState {
    fn from(raw: &str) -> Self {
        Self::from(raw.to_string())
    }
}

impl From<QcableState> for String {
    fn from(state: QcableState) -> Self {
        state.as_str().to_string()
    }
}

impl fmt::Display for QcableState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One resolved scanned item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Qcable {
    /// Barcode / human identifier of the item.
    pub identifier: String,
    /// Usage state reported by the upstream service.
    pub state: QcableState,
    /// Identifier of the tag template attached to the item.
    pub template_id: String,
    /// Human-readable kind of the item, e.g. "Tag Plate".
    pub display_type: String,
    /// Manufacturing lot number.
    pub lot_number: String,
    /// Name of the tag layout in use.
    pub tag_layout_name: String,
    /// Upstream asset identifier, when the service reports one.
    pub asset_id: Option<String>,
}
