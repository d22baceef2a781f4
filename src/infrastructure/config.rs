//! Configuration infrastructure
//!
//! Loading and management of the gate engine's settings: where the barcode
//! lookup service lives and how logging behaves. Settings live in a JSON
//! file under the user's config directory and are created with defaults on
//! first run.

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::info;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Barcode lookup service settings
    pub lookup: LookupConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Settings for the remote barcode lookup service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupConfig {
    /// Root URL of the sample tracking service
    pub base_url: String,

    /// User agent sent with every lookup request
    pub user_agent: String,

    /// HTTP request timeout in seconds
    pub request_timeout_seconds: u64,

    /// Optional per-field lookup bound in seconds. When unset, a lookup
    /// that never resolves leaves its field pending and the gate closed.
    pub field_timeout_seconds: Option<u64>,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    pub level: String,

    /// Enable console output
    pub console_output: bool,

    /// Enable file output
    pub file_output: bool,

    /// Module-specific log level filters (e.g., "reqwest": "info", "hyper": "warn")
    pub module_filters: HashMap<String, String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            lookup: LookupConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::LOOKUP_BASE_URL.to_string(),
            user_agent: defaults::LOOKUP_USER_AGENT.to_string(),
            request_timeout_seconds: defaults::REQUEST_TIMEOUT_SECONDS,
            field_timeout_seconds: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::LOG_LEVEL.to_string(),
            console_output: defaults::LOG_CONSOLE_OUTPUT,
            file_output: defaults::LOG_FILE_OUTPUT,
            module_filters: {
                let mut filters = HashMap::new();
                filters.insert("reqwest".to_string(), "info".to_string());
                filters.insert("hyper".to_string(), "warn".to_string());
                filters.insert("taggate".to_string(), "info".to_string());
                filters
            },
        }
    }
}

/// Configuration manager for loading and saving settings
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Get the application configuration directory
    pub fn get_config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get user config directory")?
            .join("taggate");

        Ok(config_dir)
    }

    /// Create a new configuration manager pointing at the default location
    pub fn new() -> Result<Self> {
        let config_dir = Self::get_config_dir()?;
        let config_path = config_dir.join("taggate_config.json");

        Ok(Self { config_path })
    }

    /// Create a configuration manager for an explicit file path
    #[must_use]
    pub fn from_path(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    /// Load configuration from file, creating default if it doesn't exist
    pub async fn load_config(&self) -> Result<AppConfig> {
        if !self.config_path.exists() {
            info!("Configuration file not found, creating default: {:?}", self.config_path);
            let default_config = AppConfig::default();
            self.save_config(&default_config).await?;
            return Ok(default_config);
        }

        let content = fs::read_to_string(&self.config_path)
            .await
            .context("Failed to read configuration file")?;

        match serde_json::from_str::<AppConfig>(&content) {
            Ok(config) => {
                info!("Loaded configuration from: {:?}", self.config_path);
                Ok(config)
            }
            Err(parse_error) => {
                tracing::warn!("⚠️  Configuration file unreadable: {}", parse_error);
                tracing::warn!("⚠️  Resetting to default configuration");

                // Keep the unreadable file around for inspection.
                let backup_path = self.config_path.with_extension("json.corrupted");
                if let Err(e) = fs::copy(&self.config_path, &backup_path).await {
                    tracing::warn!("Failed to back up corrupted config: {}", e);
                } else {
                    info!("Backed up corrupted config to: {:?}", backup_path);
                }

                let default_config = AppConfig::default();
                self.save_config(&default_config)
                    .await
                    .context("Failed to save default configuration")?;

                Ok(default_config)
            }
        }
    }

    /// Save configuration to file
    pub async fn save_config(&self, config: &AppConfig) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .context("Failed to create config directory")?;
        }

        let content =
            serde_json::to_string_pretty(config).context("Failed to serialize configuration")?;

        fs::write(&self.config_path, content)
            .await
            .context("Failed to write configuration file")?;

        info!("Saved configuration to: {:?}", self.config_path);
        Ok(())
    }

    /// Update lookup settings in place
    pub async fn update_lookup_config<F>(&self, updater: F) -> Result<()>
    where
        F: FnOnce(&mut LookupConfig),
    {
        let mut config = self.load_config().await?;
        updater(&mut config.lookup);
        self.save_config(&config).await
    }

    /// Get the configuration file path
    #[must_use]
    pub fn config_path(&self) -> &PathBuf {
        &self.config_path
    }
}

/// Default configuration values
pub mod defaults {
    /// Default root URL of the sample tracking service
    pub const LOOKUP_BASE_URL: &str = "http://localhost:3000";

    /// Default user agent for lookup requests
    pub const LOOKUP_USER_AGENT: &str = "taggate/0.3 (gate engine)";

    /// Default HTTP request timeout in seconds
    pub const REQUEST_TIMEOUT_SECONDS: u64 = 30;

    /// Default log level
    pub const LOG_LEVEL: &str = "info";

    /// Default console output setting
    pub const LOG_CONSOLE_OUTPUT: bool = true;

    /// Default file output setting
    pub const LOG_FILE_OUTPUT: bool = false;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn creates_default_config_on_first_load() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ConfigManager::from_path(dir.path().join("taggate_config.json"));

        let config = manager.load_config().await.unwrap();

        assert_eq!(config.lookup.base_url, defaults::LOOKUP_BASE_URL);
        assert_eq!(config.lookup.request_timeout_seconds, 30);
        assert!(config.lookup.field_timeout_seconds.is_none());
        assert!(manager.config_path().exists());
    }

    #[tokio::test]
    async fn round_trips_saved_settings() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ConfigManager::from_path(dir.path().join("taggate_config.json"));

        manager
            .update_lookup_config(|lookup| {
                lookup.base_url = "http://tracking.internal:8080".to_string();
                lookup.field_timeout_seconds = Some(15);
            })
            .await
            .unwrap();

        let reloaded = manager.load_config().await.unwrap();
        assert_eq!(reloaded.lookup.base_url, "http://tracking.internal:8080");
        assert_eq!(reloaded.lookup.field_timeout_seconds, Some(15));
    }

    #[tokio::test]
    async fn corrupted_config_resets_to_defaults_with_backup() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("taggate_config.json");
        fs::write(&path, "{not json at all").await.unwrap();
        let manager = ConfigManager::from_path(path.clone());

        let config = manager.load_config().await.unwrap();

        assert_eq!(config.lookup.base_url, defaults::LOOKUP_BASE_URL);
        assert!(path.with_extension("json.corrupted").exists());
    }
}
