//! # FlowStash Domain
//!
//! Data types shared by the storage core, the reset orchestrator and the
//! infrastructure adapters.
//!
//! This crate contains:
//! - The persisted envelope and export document shapes
//! - Reset categories, results and summaries
//! - Configuration structures
//! - Domain constants and the application error type
//!
//! ## Architecture
//! - No dependencies on other FlowStash crates
//! - Pure data structures, no I/O

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::{Config, DatabaseConfig, LoggingConfig, StoreConfig};
pub use errors::{FlowStashError, Result};
pub use types::*;
