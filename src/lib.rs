//! Taggate - Asynchronous Barcode Validation and Gating Engine
//!
//! Validates scanned labware barcodes against a remote tracking service and
//! a tag template catalog, one state machine per input field, and gates the
//! downstream tag plate conversion on every field passing.

// Module declarations
pub mod application;
pub mod domain;
pub mod infrastructure;

// Re-export the surface most callers wire together
pub use application::{FieldMonitor, GateEventChannel, GateObserver, ValidationCollector};
pub use domain::events::{FieldStatus, GateSummary, PanelUpdate};
pub use domain::rules::{FieldContext, RuleChain};
pub use domain::template::{TagTemplate, TemplateCatalog};
pub use infrastructure::lookup::{HttpLookupClient, LookupClient, LookupError};
