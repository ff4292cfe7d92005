//! Storage constants
//!
//! Centralized location for key names and format versions.

/// Prefix shared by every key the versioned store manages
pub const DEFAULT_KEY_PREFIX: &str = "v8:";

/// Long-lived worker/service token key; outside the prefix and never
/// enumerated by flow scans
pub const DEFAULT_WORKER_TOKEN_KEY: &str = "worker_token";

/// Schema version written into export documents
pub const EXPORT_SCHEMA_VERSION: u32 = 1;

/// Default byte quota for bounded backends (5 MiB, a typical local storage
/// allowance)
pub const DEFAULT_QUOTA_BYTES: usize = 5 * 1024 * 1024;

/// Logical name written and removed by the availability probe
pub const AVAILABILITY_PROBE_NAME: &str = "__availability_probe__";

/// Separator between segments of a logical key name
pub const KEY_SEGMENT_SEPARATOR: char = ':';

// Well-known category keys under the default prefix
pub const TOKENS_KEY: &str = "v8:tokens";
pub const STEP_PROGRESS_KEY: &str = "v8:step_progress";
pub const CREDENTIALS_KEY: &str = "v8:credentials";
pub const DISCOVERY_KEY: &str = "v8:discovery";
pub const PREFERENCES_KEY: &str = "v8:preferences";
