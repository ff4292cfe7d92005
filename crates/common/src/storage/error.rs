//! Storage error types
//!
//! Defines error types for key-value backends, integrating with the common
//! error system.

use thiserror::Error;

use crate::error::{ErrorClassification, ErrorSeverity};

/// Storage error type
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Storage quota exceeded: {needed} bytes needed, limit is {limit} bytes")]
    QuotaExceeded { needed: usize, limit: usize },

    #[error("Storage backend error: {0}")]
    Backend(String),

    #[error("Storage lock poisoned: {0}")]
    LockPoisoned(String),

    #[error(transparent)]
    Common(#[from] crate::CommonError),

    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),
}

/// Storage result type
pub type StorageResult<T> = Result<T, StorageError>;

impl ErrorClassification for StorageError {
    /// Check if this error is retryable
    ///
    /// Lock contention and a temporarily unavailable backend may clear up;
    /// a full quota does not clear up without deleting data first.
    fn is_retryable(&self) -> bool {
        match self {
            Self::Unavailable(_) | Self::LockPoisoned(_) => true,
            Self::Common(common_err) => common_err.is_retryable(),
            _ => false,
        }
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Unavailable(_) => ErrorSeverity::Error,
            Self::QuotaExceeded { .. } => ErrorSeverity::Warning,
            Self::Backend(_) => ErrorSeverity::Error,
            Self::LockPoisoned(_) => ErrorSeverity::Critical,
            Self::Common(common_err) => common_err.severity(),
            Self::SerdeJson(_) => ErrorSeverity::Error,
        }
    }
}

impl StorageError {
    /// Add operation context to the error
    ///
    /// Creates a CommonError with the operation context for better debugging.
    pub fn with_operation(self, operation: impl Into<String>) -> Self {
        let operation = operation.into();
        Self::Common(crate::CommonError::Storage {
            message: self.to_string(),
            operation: Some(operation),
        })
    }
}

/// Convert StorageError to CommonError for integration
impl From<StorageError> for crate::CommonError {
    fn from(err: StorageError) -> Self {
        // If already a CommonError variant, preserve it
        if let StorageError::Common(common_err) = err {
            return common_err;
        }

        crate::CommonError::Storage { message: err.to_string(), operation: None }
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for storage::error.
    use super::*;

    /// Validates `StorageError` display formatting.
    ///
    /// Assertions:
    /// - Confirms `err.to_string()` equals `"Storage quota exceeded: 120 bytes
    ///   needed, limit is 100 bytes"`.
    #[test]
    fn test_error_display() {
        let err = StorageError::QuotaExceeded { needed: 120, limit: 100 };
        assert_eq!(err.to_string(), "Storage quota exceeded: 120 bytes needed, limit is 100 bytes");

        let err = StorageError::Unavailable("disabled".to_string());
        assert_eq!(err.to_string(), "Storage unavailable: disabled");
    }

    /// Validates `StorageError` retryability.
    ///
    /// Assertions:
    /// - Ensures `StorageError::Unavailable(..).is_retryable()` evaluates to
    ///   true.
    /// - Ensures `!StorageError::QuotaExceeded { .. }.is_retryable()` evaluates
    ///   to true.
    #[test]
    fn test_error_retryability() {
        assert!(StorageError::Unavailable("test".to_string()).is_retryable());
        assert!(!StorageError::QuotaExceeded { needed: 2, limit: 1 }.is_retryable());
        assert!(!StorageError::Backend("test".to_string()).is_retryable());
    }

    /// Validates `StorageError` severity and criticality.
    #[test]
    fn test_error_severity() {
        assert_eq!(
            StorageError::QuotaExceeded { needed: 2, limit: 1 }.severity(),
            ErrorSeverity::Warning
        );
        assert_eq!(StorageError::Backend("test".to_string()).severity(), ErrorSeverity::Error);
        assert!(StorageError::LockPoisoned("kv".to_string()).is_critical());
        assert!(!StorageError::Backend("test".to_string()).is_critical());
    }

    /// Validates `StorageError::with_operation` wraps the message.
    #[test]
    fn test_with_operation() {
        let err = StorageError::Backend("disk full".to_string()).with_operation("set");

        if let StorageError::Common(common_err) = err {
            assert!(common_err.to_string().contains("set"));
            assert!(common_err.to_string().contains("disk full"));
        } else {
            panic!("Expected Common error variant");
        }
    }

    /// Validates conversion into `CommonError`.
    #[test]
    fn test_into_common_error() {
        let common: crate::CommonError = StorageError::Backend("boom".to_string()).into();
        assert!(matches!(common, crate::CommonError::Storage { operation: None, .. }));
    }
}
