//! Storage metrics tracking
//!
//! Provides simple operation counters for key-value backends without
//! external dependencies.

use std::sync::atomic::{AtomicU64, Ordering};

/// Simple storage metrics tracker
///
/// Tracks backend operations using atomic counters for thread-safe
/// operation without locks.
#[derive(Debug, Default)]
pub struct StorageMetrics {
    reads: AtomicU64,
    writes: AtomicU64,
    removals: AtomicU64,
    failed_writes: AtomicU64,
    quota_rejections: AtomicU64,
}

/// Point-in-time copy of [`StorageMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StorageMetricsSnapshot {
    pub reads: u64,
    pub writes: u64,
    pub removals: u64,
    pub failed_writes: u64,
    pub quota_rejections: u64,
}

impl StorageMetrics {
    /// Create a new metrics tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a read
    pub fn record_read(&self) {
        self.reads.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a committed write
    pub fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a removal
    pub fn record_removal(&self) {
        self.removals.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a write that did not commit
    pub fn record_failed_write(&self) {
        self.failed_writes.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a write rejected because of the byte quota
    pub fn record_quota_rejection(&self) {
        self.quota_rejections.fetch_add(1, Ordering::Relaxed);
        self.record_failed_write();
    }

    /// Take a snapshot of all counters
    pub fn snapshot(&self) -> StorageMetricsSnapshot {
        StorageMetricsSnapshot {
            reads: self.reads.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            removals: self.removals.load(Ordering::Relaxed),
            failed_writes: self.failed_writes.load(Ordering::Relaxed),
            quota_rejections: self.quota_rejections.load(Ordering::Relaxed),
        }
    }
}
