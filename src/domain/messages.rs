//! User-facing message catalog for the validation engine
//!
//! Every string that reaches the operator lives here so that the wording of
//! panel alerts and gate summaries stays consistent across monitors, and so
//! tests can assert against a single source.

/// Shown when a lookup fails at the transport level or the barcode is unknown
/// upstream. Both cases collapse into one user-facing category.
pub const BARCODE_NOT_FOUND: &str =
    "The barcode could not be found. There may be network issues, or problems with the upstream service.";

/// Shown when the lookup response carried neither a resolved item nor a
/// domain error.
pub const UNEXPECTED_RESPONSE: &str =
    "An unexpected response was received. Please contact support.";

/// Gate summary when every registered field has passed.
pub const GATE_READY_SUMMARY: &str =
    "Marks the tag sources as used, and convert the tag plate.";

/// Gate summary while at least one field is not in a passed state.
pub const GATE_BLOCKED_SUMMARY: &str =
    "Tag plate conversion is blocked until every scanned barcode passes validation.";

/// Violation messages emitted by the suitability rule chain, one per rule,
/// in chain order.
pub mod rule {
    /// Rule 1: the scanned item must be in the available state.
    pub const ITEM_NOT_AVAILABLE: &str = "The scanned item is not available.";

    /// Rule 2: the item's template must exist in the catalog.
    pub const UNRECOGNISED_TEMPLATE: &str = "It is an unrecognised template.";

    /// Rule 3: the template must be approved for the active pipeline.
    pub const NOT_APPROVED_FOR_PIPELINE: &str =
        "It is not approved for use with this pipeline.";

    /// Rule 4: a dual-index template may only be used once.
    pub const TEMPLATE_ALREADY_USED: &str = "This template has already been used.";

    /// Rule 5: dual-indexed pools require dual-index templates.
    pub const DUAL_INDEX_REQUIRED: &str =
        "Pool has been tagged with a dual-indexed source. Dual-indexed templates must be used.";

    /// Rule 6: single-source pools reject dual-index templates.
    pub const DUAL_INDEX_UNSUPPORTED: &str =
        "Pool has been tagged with a single source. Dual-indexed templates are unsupported.";
}

/// Affirmative per-field line once an item clears the rule chain.
#[must_use]
pub fn suitable(display_type: &str) -> String {
    format!("The {display_type} is suitable.")
}

/// Leading per-field line when an item violates at least one rule; the
/// individual violation messages are appended after it.
#[must_use]
pub fn not_suitable(display_type: &str) -> String {
    format!("The {display_type} is not suitable.")
}
