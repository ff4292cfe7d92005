//! Store error types

use flowstash_common::error::{ErrorClassification, ErrorSeverity};
use flowstash_common::storage::StorageError;
use flowstash_domain::FlowStashError;
use thiserror::Error;

/// Errors surfaced by [`VersionedStore`](super::VersionedStore)
///
/// Corrupt stored envelopes never show up here: every read path treats them
/// as absent.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to write '{key}': {source}")]
    Write {
        key: String,
        #[source]
        source: StorageError,
    },

    #[error("Failed to read storage: {0}")]
    Read(#[source] StorageError),

    #[error("Failed to delete '{key}': {source}")]
    Delete {
        key: String,
        #[source]
        source: StorageError,
    },

    #[error("Cleared {cleared} keys before failing to delete '{key}': {source}")]
    PartialClear {
        cleared: usize,
        key: String,
        #[source]
        source: StorageError,
    },

    #[error("Invalid import document: {0}")]
    ImportFormat(String),

    #[error("Migration {from} -> {to} failed for '{key}': {message}")]
    Migration { key: String, from: u32, to: u32, message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Store result type
pub type StoreResult<T> = Result<T, StoreError>;

impl StoreError {
    /// Map a backend failure on a read path
    pub(crate) fn from_read(err: StorageError) -> Self {
        match err {
            StorageError::Unavailable(message) => Self::Unavailable(message),
            other => Self::Read(other),
        }
    }

    /// Turn a failed delete into a partial-clear report
    pub(crate) fn partial(cleared: usize, err: Self) -> Self {
        match err {
            Self::Delete { key, source } => Self::PartialClear { cleared, key, source },
            other => other,
        }
    }

    fn storage_source(&self) -> Option<&StorageError> {
        match self {
            Self::Write { source, .. }
            | Self::Delete { source, .. }
            | Self::PartialClear { source, .. }
            | Self::Read(source) => Some(source),
            _ => None,
        }
    }
}

impl ErrorClassification for StoreError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::Unavailable(_) => true,
            _ => self.storage_source().is_some_and(ErrorClassification::is_retryable),
        }
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::InvalidInput(_) | Self::ImportFormat(_) => ErrorSeverity::Warning,
            Self::Unavailable(_) | Self::Migration { .. } | Self::Serialization(_) => {
                ErrorSeverity::Error
            }
            _ => self.storage_source().map_or(ErrorSeverity::Error, ErrorClassification::severity),
        }
    }
}

impl From<StoreError> for FlowStashError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::InvalidInput(message) => Self::InvalidInput(message),
            other @ StoreError::ImportFormat(_) => Self::InvalidInput(other.to_string()),
            other => Self::Storage(other.to_string()),
        }
    }
}
