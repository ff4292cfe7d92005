//! Storage usage statistics

use std::collections::BTreeMap;

use serde::Serialize;

/// Coarse usage report over the managed namespace
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    /// Managed keys present
    pub key_count: usize,
    /// Sum of key length plus stored value length, in bytes
    pub total_bytes: usize,
    /// Managed keys whose value does not decode as an envelope
    pub corrupt_entries: usize,
    /// Number of envelopes per flow tag
    pub flows: BTreeMap<String, usize>,
}
