//! # FlowStash Infrastructure
//!
//! Adapters and wiring around the storage core.
//!
//! This crate contains:
//! - `SqliteStore`, a durable `KeyValueStore` on rusqlite
//! - Configuration loading from environment and files
//! - Tracing subscriber initialisation
//! - `StoreContext`, the per-session service container
//!
//! ## Architecture
//! - Implements ports defined in `flowstash-common`
//! - Depends on `flowstash-domain` and `flowstash-core`
//! - Contains all "impure" code (file system, database)

pub mod config;
pub mod context;
pub mod database;
pub mod observability;

// Re-export commonly used items
pub use context::StoreContext;
pub use database::SqliteStore;
pub use observability::init_tracing;
