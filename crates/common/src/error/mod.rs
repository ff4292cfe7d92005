//! Error classification shared by FlowStash crates
//!
//! - **`ErrorClassification`**: asks an error whether it is retryable and
//!   how severe it is, so callers can pick a log level without matching on
//!   concrete variants
//! - **`ErrorSeverity`**: the unified severity scale
//! - **`CommonError`**: context-carrying error that backend errors wrap via
//!   `with_operation`
//!
//! | Level | Examples |
//! |-------|----------|
//! | **Info** | Expected conditions |
//! | **Warning** | Quota pressure, rejected import document |
//! | **Error** | Write failure, unavailable backend |
//! | **Critical** | Poisoned lock |

use std::fmt;

/// Error with the storage operation it happened in
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommonError {
    Storage { message: String, operation: Option<String> },
}

impl fmt::Display for CommonError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Storage { message, operation: Some(op) } => {
                write!(f, "Storage error during '{}': {}", op, message)
            }
            Self::Storage { message, operation: None } => write!(f, "Storage error: {}", message),
        }
    }
}

impl std::error::Error for CommonError {}

impl ErrorClassification for CommonError {
    fn is_retryable(&self) -> bool {
        false
    }

    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Error
    }
}

/// Error classification trait for consistent error handling across crates
pub trait ErrorClassification {
    /// Whether the same call may succeed later (a temporarily unavailable
    /// backend, lock contention)
    fn is_retryable(&self) -> bool;

    fn severity(&self) -> ErrorSeverity;

    /// Whether integrity is at risk
    fn is_critical(&self) -> bool {
        self.severity() == ErrorSeverity::Critical
    }
}

/// Error severity levels for logging
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warning => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for error handling functionality.

    use super::*;

    /// Validates `CommonError::Storage` display formatting.
    #[test]
    fn test_error_storage_with_operation() {
        let err = CommonError::Storage {
            message: "quota exceeded".to_string(),
            operation: Some("set".to_string()),
        };
        assert_eq!(err.to_string(), "Storage error during 'set': quota exceeded");
        assert!(!err.is_critical());
        assert!(!err.is_retryable());

        let err = CommonError::Storage { message: "gone".to_string(), operation: None };
        assert_eq!(err.to_string(), "Storage error: gone");
    }

    /// Validates `ErrorSeverity` ordering and display.
    #[test]
    fn test_error_severity_ordering_and_display() {
        assert!(ErrorSeverity::Info < ErrorSeverity::Warning);
        assert!(ErrorSeverity::Warning < ErrorSeverity::Error);
        assert!(ErrorSeverity::Error < ErrorSeverity::Critical);
        assert_eq!(ErrorSeverity::Warning.to_string(), "WARN");
        assert_eq!(ErrorSeverity::Critical.to_string(), "CRITICAL");
    }
}
