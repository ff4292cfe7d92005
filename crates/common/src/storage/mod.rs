//! Synchronous key-value storage primitives
//!
//! This module defines the platform port that versioned stores are built
//! on ([`KeyValueStore`]), its error type, simple operation metrics, and an
//! in-process backend with a byte quota ([`MemoryStore`]).

pub mod error;
pub mod memory;
pub mod metrics;
pub mod types;

// Re-export commonly used types
pub use error::{StorageError, StorageResult};
pub use memory::MemoryStore;
pub use metrics::{StorageMetrics, StorageMetricsSnapshot};
pub use types::{entry_size, KeyValueStore};
