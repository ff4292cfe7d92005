//! Domain types and models

pub mod envelope;
pub mod export;
pub mod reset;
pub mod stats;

pub use envelope::{Envelope, EnvelopeDecodeError, FlowEntry};
pub use export::{ExportDocument, ImportReport};
pub use reset::{ResetCategory, ResetResult, ResetSummary};
pub use stats::StoreStats;
