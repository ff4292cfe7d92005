//! Tracing subscriber setup
//!
//! The library crates only emit `tracing` events. Binaries and tests that
//! want to see them call [`init_tracing`] once at start-up.

use flowstash_domain::{FlowStashError, LoggingConfig, Result};
use tracing_subscriber::EnvFilter;

/// Install a global fmt subscriber
///
/// The filter comes from `RUST_LOG` when set, otherwise from
/// `config.level`. With `config.json` events are written as JSON lines.
///
/// Returns `Ok(false)` when a global subscriber is already installed, so
/// calling this more than once is harmless.
///
/// # Errors
/// Returns `FlowStashError::Config` when the configured level is not a
/// valid filter directive.
pub fn init_tracing(config: &LoggingConfig) -> Result<bool> {
    let filter = build_filter(config)?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);

    let installed = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    match installed {
        Ok(()) => {
            tracing::debug!(level = %config.level, json = config.json, "tracing initialised");
            Ok(true)
        }
        Err(_) => Ok(false),
    }
}

fn build_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(&config.level).map_err(|e| {
        FlowStashError::Config(format!("Invalid log level '{}': {}", config.level, e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_tracing_is_idempotent() {
        let config = LoggingConfig::default();
        assert!(init_tracing(&config).is_ok());
        assert!(!init_tracing(&config).unwrap());
    }

    #[test]
    fn test_filter_accepts_directives() {
        let config =
            LoggingConfig { level: "flowstash_core=debug,warn".to_string(), json: false };
        assert!(build_filter(&config).is_ok());
    }
}
