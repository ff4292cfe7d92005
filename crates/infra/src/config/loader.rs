//! Configuration loader
//!
//! Loads FlowStash configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If `FLOWSTASH_KEY_PREFIX` is unset, falls back to a config file
//! 3. Probes multiple paths for config files
//! 4. Uses built-in defaults when no file exists
//!
//! Every successfully loaded configuration is validated.
//!
//! ## Environment Variables
//! - `FLOWSTASH_KEY_PREFIX`: Managed key prefix (required for env loading)
//! - `FLOWSTASH_WORKER_TOKEN_KEY`: Exact key of the worker token
//! - `FLOWSTASH_QUOTA_BYTES`: Byte quota, or `none` for unbounded
//! - `FLOWSTASH_DB_PATH`: SQLite file; unset keeps data in memory
//! - `FLOWSTASH_LOG_LEVEL`: Default log filter
//! - `FLOWSTASH_LOG_JSON`: Emit JSON logs (true/false)
//!
//! ## File Locations
//! `flowstash.{toml,json}` and `config.{toml,json}` are probed in the current
//! directory, its parent and grandparent, then next to the executable.

use std::path::{Path, PathBuf};

use flowstash_domain::{Config, FlowStashError, Result};

const CONFIG_FILE_NAMES: [&str; 4] =
    ["flowstash.toml", "flowstash.json", "config.toml", "config.json"];

/// Load configuration with automatic fallback strategy
///
/// # Errors
/// Returns `FlowStashError::Config` if an environment variable or a probed
/// file is present but invalid.
pub fn load() -> Result<Config> {
    if std::env::var_os("FLOWSTASH_KEY_PREFIX").is_some() {
        let config = load_from_env()?;
        tracing::info!("Configuration loaded from environment variables");
        return Ok(config);
    }

    tracing::debug!("FLOWSTASH_KEY_PREFIX unset, trying file");
    match probe_config_paths() {
        Some(path) => load_from_file(Some(path)),
        None => {
            tracing::info!("No configuration file found, using defaults");
            Ok(Config::default())
        }
    }
}

/// Load configuration from environment variables
///
/// `FLOWSTASH_KEY_PREFIX` must be set; every other variable falls back to
/// its default.
///
/// # Errors
/// Returns `FlowStashError::Config` if the prefix is missing, a value does
/// not parse, or the result fails validation.
pub fn load_from_env() -> Result<Config> {
    let mut config = Config::default();

    config.store.key_prefix = env_var("FLOWSTASH_KEY_PREFIX")?;
    if let Ok(key) = std::env::var("FLOWSTASH_WORKER_TOKEN_KEY") {
        config.store.worker_token_key = key;
    }
    if let Ok(raw) = std::env::var("FLOWSTASH_QUOTA_BYTES") {
        config.store.quota_bytes = parse_quota(&raw)?;
    }
    config.database.path = std::env::var_os("FLOWSTASH_DB_PATH").map(PathBuf::from);
    if let Ok(level) = std::env::var("FLOWSTASH_LOG_LEVEL") {
        config.logging.level = level;
    }
    config.logging.json = env_bool("FLOWSTASH_LOG_JSON", false);

    config.validate()?;
    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes the standard locations. TOML and JSON are
/// detected by file extension; missing fields take their defaults.
///
/// # Errors
/// Returns `FlowStashError::Config` if the file is missing, unreadable,
/// malformed or fails validation.
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(FlowStashError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            FlowStashError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| FlowStashError::Config(format!("Failed to read config file: {}", e)))?;

    let config = parse_config(&contents, &config_path)?;
    config.validate()?;
    Ok(config)
}

/// Parse configuration from string content, by file extension
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| FlowStashError::Config(format!("Invalid TOML format: {}", e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| FlowStashError::Config(format!("Invalid JSON format: {}", e))),
        _ => Err(FlowStashError::Config(format!("Unsupported config format: {}", extension))),
    }
}

/// First existing config file in the standard locations
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut roots = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        roots.extend([cwd.clone(), cwd.join(".."), cwd.join("../..")]);
    }
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            roots.extend([exe_dir.to_path_buf(), exe_dir.join("..")]);
        }
    }

    roots
        .iter()
        .flat_map(|root| CONFIG_FILE_NAMES.iter().map(move |name| root.join(name)))
        .find(|path| path.exists())
}

/// `none`/`unlimited` disable the quota; anything else must be a byte count
fn parse_quota(raw: &str) -> Result<Option<usize>> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "none" | "unlimited" => Ok(None),
        value => value
            .parse::<usize>()
            .map(Some)
            .map_err(|e| FlowStashError::Config(format!("Invalid quota bytes: {}", e))),
    }
}

/// Get required environment variable
fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| {
        FlowStashError::Config(format!("Missing required environment variable: {}", key))
    })
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}
