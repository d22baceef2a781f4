//! Tag template metadata and the in-memory catalog
//!
//! The catalog is read-only after construction and shared by reference across
//! all field monitors. Misses resolve to a well-known unknown-template
//! sentinel instead of an absent value, so the rule chain never has to handle
//! a missing template.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Sentinel returned for every catalog miss. Shared, immutable, and never
/// entered into a catalog.
static UNKNOWN_TEMPLATE: Lazy<TagTemplate> = Lazy::new(|| TagTemplate {
    id: String::new(),
    recognized: false,
    approved_for_pipeline: false,
    used_already: false,
    dual_index_capable: false,
});

/// Metadata for one tag template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagTemplate {
    /// Catalog key.
    pub id: String,
    /// False only for the unknown-template sentinel; every cataloged entry
    /// is recognized by construction.
    pub recognized: bool,
    /// Whether the template is approved for the active pipeline.
    pub approved_for_pipeline: bool,
    /// Whether the template has been consumed before.
    pub used_already: bool,
    /// Whether the template carries dual indexes.
    pub dual_index_capable: bool,
}

impl TagTemplate {
    /// Creates a cataloged (recognized) template.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        approved_for_pipeline: bool,
        used_already: bool,
        dual_index_capable: bool,
    ) -> Self {
        Self {
            id: id.into(),
            recognized: true,
            approved_for_pipeline,
            used_already,
            dual_index_capable,
        }
    }

    /// The shared unknown-template sentinel.
    #[must_use]
    pub fn unknown() -> &'static Self {
        &UNKNOWN_TEMPLATE
    }

    /// Whether this value is the unknown-template sentinel.
    #[must_use]
    pub const fn is_unknown(&self) -> bool {
        !self.recognized
    }
}

/// Read-only mapping from template identifier to template metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemplateCatalog {
    entries: HashMap<String, TagTemplate>,
}

impl TemplateCatalog {
    /// Creates an empty catalog; every resolve yields the sentinel.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a catalog from a set of templates, keyed by their ids.
    #[must_use]
    pub fn from_entries(entries: impl IntoIterator<Item = TagTemplate>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|template| (template.id.clone(), template))
                .collect(),
        }
    }

    /// Resolves a template id, falling back to the unknown-template sentinel
    /// on a miss. Never fails.
    #[must_use]
    pub fn resolve(&self, template_id: &str) -> &TagTemplate {
        self.entries
            .get(template_id)
            .unwrap_or_else(|| TagTemplate::unknown())
    }

    /// Number of cataloged templates (the sentinel is not counted).
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
