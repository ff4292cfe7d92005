//! Export/import document shapes

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Snapshot of every managed key
///
/// `data` maps each key to its raw stored envelope. Serialized as
/// `{"version", "exportedAt", "data"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    /// Export schema version
    pub version: u32,
    pub exported_at: DateTime<Utc>,
    pub data: BTreeMap<String, Value>,
}

/// Outcome of an import
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    /// Entries written
    pub imported: usize,
    /// Entries left alone: existing keys without overwrite, foreign keys,
    /// invalid envelopes
    pub skipped: usize,
}
