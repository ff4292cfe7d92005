//! In-process key-value backend
//!
//! [`MemoryStore`] behaves like a browser's local storage: a synchronous
//! string map with insertion-ordered enumeration and an optional byte quota.
//! A write that would exceed the quota is rejected before anything changes,
//! so the previous value under the key stays readable.

use std::collections::HashMap;

use parking_lot::RwLock;

use super::error::{StorageError, StorageResult};
use super::metrics::{StorageMetrics, StorageMetricsSnapshot};
use super::types::{entry_size, KeyValueStore};

#[derive(Debug, Default)]
struct Inner {
    values: HashMap<String, String>,
    order: Vec<String>,
    used_bytes: usize,
}

/// Thread-safe in-memory [`KeyValueStore`] with an optional byte quota
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
    quota_bytes: Option<usize>,
    metrics: StorageMetrics,
}

impl MemoryStore {
    /// Create an unbounded store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that rejects writes once `quota_bytes` would be exceeded
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self { quota_bytes: Some(quota_bytes), ..Self::default() }
    }

    /// Configured quota, if any
    pub fn quota_bytes(&self) -> Option<usize> {
        self.quota_bytes
    }

    /// Bytes currently accounted against the quota
    pub fn used_bytes(&self) -> usize {
        self.inner.read().used_bytes
    }

    /// Operation counters
    pub fn metrics(&self) -> StorageMetricsSnapshot {
        self.metrics.snapshot()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        self.metrics.record_read();
        Ok(self.inner.read().values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let mut inner = self.inner.write();

        let previous = inner.values.get(key).map_or(0, |old| entry_size(key, old));
        let needed = inner.used_bytes - previous + entry_size(key, value);

        if let Some(limit) = self.quota_bytes {
            if needed > limit {
                self.metrics.record_quota_rejection();
                tracing::warn!(key, needed, limit, "memory store quota exceeded");
                return Err(StorageError::QuotaExceeded { needed, limit });
            }
        }

        if inner.values.insert(key.to_string(), value.to_string()).is_none() {
            inner.order.push(key.to_string());
        }
        inner.used_bytes = needed;
        self.metrics.record_write();
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        let mut inner = self.inner.write();
        if let Some(old) = inner.values.remove(key) {
            inner.used_bytes -= entry_size(key, &old);
            inner.order.retain(|existing| existing != key);
        }
        self.metrics.record_removal();
        Ok(())
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        Ok(self.inner.read().order.clone())
    }

    fn len(&self) -> StorageResult<usize> {
        Ok(self.inner.read().values.len())
    }
}
