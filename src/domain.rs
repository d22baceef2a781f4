//! Domain module - Core validation logic and entities
//!
//! This module contains the scanned-item and template models, the
//! suitability rule chain, the user-facing message catalog, and the event
//! types shared with the presentation layer.
//!
//! Modern Rust module organization (Rust 2018+ style):
//! - Each module is its own file in the domain/ directory
//! - Public exports are defined here for convenience

pub mod events;
pub mod messages;
pub mod qcable;
pub mod rules;
pub mod template;

// Re-export commonly used items for convenience
// Note: Be specific about re-exports to avoid ambiguous glob warnings
pub use events::{
    FieldStatus, GateSummary, MonitorId, PanelAlert, PanelUpdate, QcableDetails, Severity,
};
pub use qcable::{Qcable, QcableState};
pub use rules::{FieldContext, RuleChain, RuleOutcome, SuitabilityRule};
pub use template::{TagTemplate, TemplateCatalog};
