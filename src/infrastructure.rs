//! Infrastructure layer for external integrations
//!
//! This module provides the HTTP lookup client, configuration loading,
//! and logging setup backing the gate engine.

pub mod config; // Configuration loading and management
pub mod logging; // Logging infrastructure
pub mod lookup; // Remote barcode lookup over HTTP

// Re-export commonly used items
pub use config::{AppConfig, ConfigManager, LookupConfig};
pub use logging::{get_log_directory, init_logging, init_logging_with_config};
pub use lookup::{HttpLookupClient, LookupClient, LookupError};
