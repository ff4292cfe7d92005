//! Common utilities shared across FlowStash crates.
//!
//! # Feature Tiers
//!
//! Enable cargo features to opt into the tiers you need:
//! - `foundation`: errors and clock abstractions
//! - `runtime`: the synchronous key-value storage port and its in-memory
//!   backend
//! - `observability`: tracing (pulled in by `runtime`)
//! - `test-utils`: mock clocks and fault-injecting stores for downstream tests

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

// Foundation tier
// -----------------------------------------------------------------
#[cfg(feature = "foundation")]
pub mod error;
#[cfg(feature = "foundation")]
pub mod time;

// Runtime tier
// --------------------------------------------------------------------
#[cfg(feature = "runtime")]
pub mod storage;

// Testing utilities
// ---------------------------------------------------------------
#[cfg(feature = "test-utils")]
pub mod testing;

// Re-export commonly used types and traits for convenience
// ------------------------
#[cfg(feature = "foundation")]
pub use error::{CommonError, ErrorClassification, ErrorSeverity};
#[cfg(feature = "runtime")]
pub use storage::{KeyValueStore, MemoryStore, StorageError, StorageResult};
#[cfg(feature = "foundation")]
pub use time::{Clock, SystemClock};
