//! Unified error handling for the clone engine.
//!
//! This module provides a unified error type that wraps domain and engine
//! errors, with user-actionable suggestions.

use thiserror::Error;

use crate::application::CloneError;
use crate::domain::DomainError;

/// Root error type for prototype-core operations.
#[derive(Debug, Error, Clone)]
pub enum PrototypeError {
    /// Errors from the runtime type/value model.
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    /// Errors from a clone invocation.
    #[error("Clone error: {0}")]
    Clone(#[from] CloneError),

    /// Configuration or setup errors.
    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl PrototypeError {
    /// Get user-actionable suggestions for fixing this error.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Domain(e) => e.suggestions(),
            Self::Clone(e) => e.suggestions(),
            Self::Configuration { message } => vec![
                format!("Configuration issue: {}", message),
                "Check your options file and environment".into(),
            ],
        }
    }

    /// Get error category for display/styling purposes.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Domain(e) => match e.category() {
                crate::domain::ErrorCategory::Validation => ErrorCategory::Validation,
                crate::domain::ErrorCategory::Definition => ErrorCategory::Definition,
                crate::domain::ErrorCategory::NotFound => ErrorCategory::NotFound,
            },
            Self::Clone(e) => e.category(),
            Self::Configuration { .. } => ErrorCategory::Configuration,
        }
    }
}

/// Error categories for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Definition,
    Conversion,
    Callback,
    NotFound,
    Configuration,
    Internal,
}

/// Convenient result type alias.
pub type PrototypeResult<T> = Result<T, PrototypeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_layers() {
        let e: PrototypeError = DomainError::UnknownKind("complex64".into()).into();
        assert_eq!(e.category(), ErrorCategory::NotFound);

        let e: PrototypeError = CloneError::InvalidTarget {
            reason: "nil pointer".into(),
        }
        .into();
        assert_eq!(e.category(), ErrorCategory::Validation);
        assert!(!e.suggestions().is_empty());
    }
}
