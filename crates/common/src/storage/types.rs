//! Core storage trait definitions
//!
//! The versioned store is written against [`KeyValueStore`], a synchronous
//! string-to-string map in the spirit of a browser's local storage. Backends
//! may be in-process ([`super::MemoryStore`]) or durable (the SQLite backend
//! in `flowstash-infra`).

use std::fmt::Debug;

use super::error::StorageResult;

/// Synchronous key-value storage port
///
/// Implementations use interior mutability so a single instance can be
/// shared behind an `Arc`. Each call is individually atomic:
/// - `set` either stores the whole value or leaves the previous value in
///   place (for example when a quota would be exceeded)
/// - `remove` of a missing key succeeds
pub trait KeyValueStore: Send + Sync + Debug {
    /// Get the raw value stored under `key`
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Store `value` under `key`, replacing any previous value
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Remove `key` (idempotent)
    fn remove(&self, key: &str) -> StorageResult<()>;

    /// Enumerate every key currently stored
    fn keys(&self) -> StorageResult<Vec<String>>;

    /// Number of stored keys
    fn len(&self) -> StorageResult<usize> {
        Ok(self.keys()?.len())
    }

    /// Check whether the store holds no keys
    fn is_empty(&self) -> StorageResult<bool> {
        Ok(self.len()? == 0)
    }
}

/// Accounted size of one entry: key length plus value length, in bytes
///
/// This is the measure backends use for quotas and the versioned store uses
/// for size reporting; it is not the on-disk footprint.
#[must_use]
pub fn entry_size(key: &str, value: &str) -> usize {
    key.len() + value.len()
}
