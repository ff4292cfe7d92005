//! # FlowStash Core
//!
//! Storage and reset logic - no infrastructure dependencies.
//!
//! This crate contains:
//! - `VersionedStore`: envelopes, lazy migration on read, flow grouping,
//!   expiry, export and import over any `KeyValueStore`
//! - `FlowResetService`: policy-driven bulk clears scoped to one flow
//!
//! ## Architecture Principles
//! - Only depends on `flowstash-common` and `flowstash-domain`
//! - No database or platform code
//! - Backends and clocks are injected through traits
//! - Synchronous, no background work

pub mod reset;
pub mod store;

// Re-export specific items to avoid ambiguity
pub use reset::policy::{ResetDecision, ResetPolicy, WorkerTokenPolicy};
pub use reset::FlowResetService;
pub use store::error::{StoreError, StoreResult};
pub use store::migration::{Migration, MigrationChain, MigrationFailure, MigrationOutcome};
pub use store::{StoreSettings, VersionedStore};
