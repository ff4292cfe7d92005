//! Configuration structures
//!
//! Every section has defaults, so a partial file (or none at all) yields a
//! usable configuration. Loading from environment and files lives in
//! `flowstash-infra::config`.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_KEY_PREFIX, DEFAULT_QUOTA_BYTES, DEFAULT_WORKER_TOKEN_KEY, EXPORT_SCHEMA_VERSION,
};
use crate::errors::{FlowStashError, Result};

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub store: StoreConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
}

/// Versioned store settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Prefix shared by every managed key
    pub key_prefix: String,
    /// Exact key of the long-lived worker token
    pub worker_token_key: String,
    /// Schema version stamped on export documents
    pub export_schema_version: u32,
    /// Byte quota for the backend; `None` means unbounded
    pub quota_bytes: Option<usize>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            worker_token_key: DEFAULT_WORKER_TOKEN_KEY.to_string(),
            export_schema_version: EXPORT_SCHEMA_VERSION,
            quota_bytes: Some(DEFAULT_QUOTA_BYTES),
        }
    }
}

/// Durable backend settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite file; `None` keeps everything in memory
    pub path: Option<PathBuf>,
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), json: false }
    }
}

impl Config {
    /// Validate the configuration
    ///
    /// # Errors
    /// Returns `FlowStashError::Config` for an empty key prefix, an empty
    /// worker token key, a zero export schema version, a zero quota or an
    /// empty log level.
    pub fn validate(&self) -> Result<()> {
        let store = &self.store;

        if store.key_prefix.is_empty() {
            return Err(FlowStashError::Config("key_prefix must not be empty".to_string()));
        }
        if store.worker_token_key.is_empty() {
            return Err(FlowStashError::Config("worker_token_key must not be empty".to_string()));
        }
        if store.export_schema_version == 0 {
            return Err(FlowStashError::Config(
                "export_schema_version must be greater than 0".to_string(),
            ));
        }
        if store.quota_bytes == Some(0) {
            return Err(FlowStashError::Config("quota_bytes must be greater than 0".to_string()));
        }
        if self.logging.level.trim().is_empty() {
            return Err(FlowStashError::Config("logging.level must not be empty".to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.store.key_prefix, "v8:");
        assert_eq!(config.store.worker_token_key, "worker_token");
        assert_eq!(config.database.path, None);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.store.key_prefix.clear();
        assert!(matches!(config.validate(), Err(FlowStashError::Config(_))));

        let mut config = Config::default();
        config.store.quota_bytes = Some(0);
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.store.export_schema_version = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [store]
            key_prefix = "pg:"

            [logging]
            json = true
            "#,
        )
        .unwrap();

        assert_eq!(config.store.key_prefix, "pg:");
        assert_eq!(config.store.worker_token_key, "worker_token");
        assert!(config.logging.json);
        assert_eq!(config.logging.level, "info");
    }
}
