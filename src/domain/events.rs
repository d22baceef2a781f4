//! Status and event types shared with the presentation layer
//!
//! This module defines the field status machine states plus the two outbound
//! payloads a UI layer consumes: per-field panel updates and the overall
//! gate summary. The payload types export TypeScript bindings via ts-rs so
//! the frontend contract stays in lockstep with the Rust types.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::domain::qcable::Qcable;

/// Validation state of one barcode field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum FieldStatus {
    /// Initial state, also re-entered on every edit.
    Idle,
    /// A lookup is in flight.
    Pending,
    /// The field's item cleared validation (or passed vacuously).
    Passed,
    /// Lookup failed or the item violated at least one rule.
    Failed,
}

impl FieldStatus {
    /// Whether the status is a terminal lookup outcome.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Passed | Self::Failed)
    }

    /// Stable lowercase name for logs and telemetry.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Pending => "pending",
            Self::Passed => "passed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for FieldStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Visual weight of a panel alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum Severity {
    /// Affirmative styling.
    Success,
    /// Error styling.
    Danger,
}

/// One human-readable line for the field's info panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PanelAlert {
    /// All current messages for the field, joined into one line.
    pub message: String,
    /// Styling hint for the panel.
    pub severity: Severity,
}

/// Item details shown next to the field once a lookup resolved. These are
/// populated whenever an item came back, valid or not, so the operator can
/// see what was scanned even when it is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct QcableDetails {
    /// Manufacturing lot number.
    pub lot_number: String,
    /// Name of the tag layout in use.
    pub tag_layout_name: String,
    /// Upstream usage state, wire spelling.
    pub state: String,
    /// Upstream asset identifier, when present.
    pub asset_id: Option<String>,
    /// Identifier of the attached tag template.
    pub template_id: String,
}

impl From<&Qcable> for QcableDetails {
    fn from(item: &Qcable) -> Self {
        Self {
            lot_number: item.lot_number.clone(),
            tag_layout_name: item.tag_layout_name.clone(),
            state: item.state.as_str().to_string(),
            asset_id: item.asset_id.clone(),
            template_id: item.template_id.clone(),
        }
    }
}

/// Complete display state for one field's panel. A pure projection of
/// (status, messages, resolved item); the panel holds no state of its own
/// and each update fully replaces the previous one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PanelUpdate {
    /// Current field status.
    pub status: FieldStatus,
    /// Alert line, absent while there is nothing to report.
    pub alert: Option<PanelAlert>,
    /// Resolved item details, absent until a lookup returned an item.
    pub details: Option<QcableDetails>,
}

impl PanelUpdate {
    /// The blank panel shown after a reset.
    #[must_use]
    pub fn cleared() -> Self {
        Self {
            status: FieldStatus::Idle,
            alert: None,
            details: None,
        }
    }

    /// Projects monitor state into display state.
    #[must_use]
    pub fn project(status: FieldStatus, messages: &[String], item: Option<&Qcable>) -> Self {
        let alert = if messages.is_empty() {
            None
        } else {
            let severity = if status == FieldStatus::Passed {
                Severity::Success
            } else {
                Severity::Danger
            };
            Some(PanelAlert {
                message: messages.join(" "),
                severity,
            })
        };

        Self {
            status,
            alert,
            details: item.map(QcableDetails::from),
        }
    }
}

/// Outcome of one gate recomputation, pushed to the downstream action
/// control on every monitor status change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GateSummary {
    /// True when every registered field has passed.
    pub ready: bool,
    /// Summary line for the action control.
    pub summary: String,
    /// Labels of the fields currently holding the gate closed, in
    /// registration order. Empty when ready.
    pub blocking: Vec<String>,
    /// When this recomputation happened.
    pub decided_at: DateTime<Utc>,
}

/// Unique identifier of a field monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MonitorId(Uuid);

impl MonitorId {
    /// Creates a fresh monitor id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the inner UUID.
    #[must_use]
    pub fn inner(&self) -> Uuid {
        self.0
    }
}

impl Default for MonitorId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MonitorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<MonitorId> for Uuid {
    fn from(id: MonitorId) -> Self {
        id.0
    }
}
