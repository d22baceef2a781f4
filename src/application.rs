//! Application layer module
//!
//! Gate orchestration: per-field monitors feeding the shared collector
//! that decides whether the downstream action may run.

pub mod collector; // Conjunction gate over registered field slots
pub mod field_monitor; // Per-field validation state machine

// Re-export commonly used items
pub use collector::{GateEventChannel, GateObserver, MonitorHandle, ValidationCollector};
pub use field_monitor::{FieldMonitor, InfoPanel, MonitorSnapshot, TracingPanel};
