//! Clone engine errors.
//!
//! Every failure the engine reports carries the full path of the node that
//! failed. Model misuse inside the engine (a value that does not fit its
//! slot) is wrapped as `Model`; user callbacks surface as `Callback`.

use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::domain::{DomainError, FullPath};
use crate::error::ErrorCategory;

/// Shared, cloneable cause of a parse or callback failure.
pub type Cause = Arc<dyn std::error::Error + Send + Sync + 'static>;

pub type CloneResult<T> = Result<T, CloneError>;

/// Stable classification of a [`CloneError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidTarget,
    Overflow,
    NegativeNumber,
    StringParse,
    UnsupportedType,
    UnsupportedValue,
    Convert,
    Callback,
    Aggregate,
    Model,
}

impl ErrorKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidTarget => "invalid_target",
            Self::Overflow => "overflow",
            Self::NegativeNumber => "negative_number",
            Self::StringParse => "string_parse",
            Self::UnsupportedType => "unsupported_type",
            Self::UnsupportedValue => "unsupported_value",
            Self::Convert => "convert",
            Self::Callback => "callback",
            Self::Aggregate => "aggregate",
            Self::Model => "model",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reason attached to cycle failures.
pub const CYCLE_REASON: &str = "cycle detected";

/// Errors raised while cloning.
#[derive(Debug, Error, Clone)]
pub enum CloneError {
    /// The entry target is not a non-nil pointer.
    #[error("invalid target: {reason}")]
    InvalidTarget { reason: String },

    #[error("{path}: value {value} overflows {target_type}")]
    Overflow {
        path: FullPath,
        target_type: String,
        value: String,
    },

    #[error("{path}: negative value {value} cannot be stored in {target_type}")]
    NegativeNumber {
        path: FullPath,
        target_type: String,
        value: String,
    },

    #[error("{path}: cannot parse {value:?} as {target_type}: {source}")]
    StringParse {
        path: FullPath,
        target_type: String,
        value: String,
        #[source]
        source: Cause,
    },

    #[error("{path}: cannot clone {source_type} into {target_type}")]
    UnsupportedType {
        path: FullPath,
        source_type: String,
        target_type: String,
    },

    #[error("{path}: unsupported value {value} for {target_type}: {reason}")]
    UnsupportedValue {
        path: FullPath,
        target_type: String,
        value: String,
        reason: String,
    },

    /// Narrowing a dynamic value into a native type failed.
    #[error("{path}: cannot convert into {target_type}: {reason}")]
    Convert {
        path: FullPath,
        target_type: String,
        reason: String,
    },

    /// A hook, accessor, behaviour or codec returned an error.
    #[error("{path}: {origin} failed: {source}")]
    Callback {
        path: FullPath,
        origin: String,
        #[source]
        source: Cause,
    },

    /// Several independent failures collected in best-effort mode.
    #[error("{} errors occurred; first: {}", .errors.len(), first_message(.errors))]
    Aggregate { errors: Vec<CloneError> },

    #[error("{path}: {source}")]
    Model {
        path: FullPath,
        #[source]
        source: DomainError,
    },
}

fn first_message(errors: &[CloneError]) -> String {
    errors.first().map(ToString::to_string).unwrap_or_default()
}

impl CloneError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidTarget { .. } => ErrorKind::InvalidTarget,
            Self::Overflow { .. } => ErrorKind::Overflow,
            Self::NegativeNumber { .. } => ErrorKind::NegativeNumber,
            Self::StringParse { .. } => ErrorKind::StringParse,
            Self::UnsupportedType { .. } => ErrorKind::UnsupportedType,
            Self::UnsupportedValue { .. } => ErrorKind::UnsupportedValue,
            Self::Convert { .. } => ErrorKind::Convert,
            Self::Callback { .. } => ErrorKind::Callback,
            Self::Aggregate { .. } => ErrorKind::Aggregate,
            Self::Model { .. } => ErrorKind::Model,
        }
    }

    /// Path of the failing node; `None` for entry and aggregate errors.
    pub fn path(&self) -> Option<&FullPath> {
        match self {
            Self::Overflow { path, .. }
            | Self::NegativeNumber { path, .. }
            | Self::StringParse { path, .. }
            | Self::UnsupportedType { path, .. }
            | Self::UnsupportedValue { path, .. }
            | Self::Convert { path, .. }
            | Self::Callback { path, .. }
            | Self::Model { path, .. } => Some(path),
            Self::InvalidTarget { .. } | Self::Aggregate { .. } => None,
        }
    }

    pub fn target_type(&self) -> Option<&str> {
        match self {
            Self::Overflow { target_type, .. }
            | Self::NegativeNumber { target_type, .. }
            | Self::StringParse { target_type, .. }
            | Self::UnsupportedType { target_type, .. }
            | Self::UnsupportedValue { target_type, .. }
            | Self::Convert { target_type, .. } => Some(target_type),
            _ => None,
        }
    }

    /// Literal of the offending source value.
    pub fn value(&self) -> Option<&str> {
        match self {
            Self::Overflow { value, .. }
            | Self::NegativeNumber { value, .. }
            | Self::StringParse { value, .. }
            | Self::UnsupportedValue { value, .. } => Some(value),
            _ => None,
        }
    }

    pub fn is_cycle(&self) -> bool {
        matches!(self, Self::UnsupportedValue { reason, .. } if reason == CYCLE_REASON)
    }

    /// The individual failures: the aggregate's members, or `self`.
    pub fn errors(&self) -> &[CloneError] {
        match self {
            Self::Aggregate { errors } => errors,
            other => std::slice::from_ref(other),
        }
    }

    /// Get user-actionable suggestions for fixing this error.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::InvalidTarget { .. } => vec![
                "Pass a non-nil pointer as the target, e.g. Value::ptr(Value::zero(&ty))".into(),
            ],
            Self::Overflow { target_type, .. } => vec![
                format!("Use a wider target type than '{}'", target_type),
                "Or register a kind hook to clamp the value".into(),
            ],
            Self::NegativeNumber { target_type, .. } => vec![
                format!("'{}' is unsigned; use a signed target type", target_type),
            ],
            Self::StringParse { target_type, .. } => vec![
                format!("Make sure the text is a canonical {} literal", target_type),
            ],
            Self::UnsupportedType {
                source_type,
                target_type,
                ..
            } => vec![
                format!("No conversion from '{}' to '{}'", source_type, target_type),
                "Register a type or kind hook for this pair".into(),
            ],
            Self::UnsupportedValue { .. } if self.is_cycle() => vec![
                "The source graph contains a cycle".into(),
                "Break the cycle or handle the field with a hook".into(),
            ],
            Self::Aggregate { errors } => errors.iter().flat_map(|e| e.suggestions()).collect(),
            Self::Model { source, .. } => source.suggestions(),
            _ => vec!["Check the error details above".into()],
        }
    }

    /// Get error category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidTarget { .. } => ErrorCategory::Validation,
            Self::Overflow { .. }
            | Self::NegativeNumber { .. }
            | Self::StringParse { .. }
            | Self::UnsupportedValue { .. }
            | Self::Convert { .. } => ErrorCategory::Conversion,
            Self::UnsupportedType { .. } => ErrorCategory::NotFound,
            Self::Callback { .. } => ErrorCategory::Callback,
            Self::Aggregate { errors } => errors
                .first()
                .map(CloneError::category)
                .unwrap_or(ErrorCategory::Internal),
            Self::Model { .. } => ErrorCategory::Validation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overflow() -> CloneError {
        CloneError::Overflow {
            path: FullPath::root().field("Age"),
            target_type: "uint8".into(),
            value: "300".into(),
        }
    }

    #[test]
    fn accessors() {
        let e = overflow();
        assert_eq!(e.kind(), ErrorKind::Overflow);
        assert_eq!(e.path().map(ToString::to_string), Some("$.Age".into()));
        assert_eq!(e.target_type(), Some("uint8"));
        assert_eq!(e.value(), Some("300"));
        assert_eq!(e.to_string(), "$.Age: value 300 overflows uint8");
    }

    #[test]
    fn aggregate_flattens() {
        let agg = CloneError::Aggregate {
            errors: vec![overflow(), CloneError::InvalidTarget { reason: "x".into() }],
        };
        assert_eq!(agg.errors().len(), 2);
        assert!(agg.to_string().starts_with("2 errors occurred"));
        assert_eq!(overflow().errors().len(), 1);
        assert_eq!(agg.category(), ErrorCategory::Conversion);
    }

    #[test]
    fn cycle_detection_flag() {
        let e = CloneError::UnsupportedValue {
            path: FullPath::root(),
            target_type: "map[string]any".into(),
            value: "map[...]".into(),
            reason: CYCLE_REASON.into(),
        };
        assert!(e.is_cycle());
        assert!(!overflow().is_cycle());
        assert_eq!(e.suggestions().len(), 2);
    }

    #[test]
    fn parse_errors_keep_their_cause() {
        let cause = "x".parse::<i64>().unwrap_err();
        let e = CloneError::StringParse {
            path: FullPath::root(),
            target_type: "int".into(),
            value: "x".into(),
            source: Arc::new(cause),
        };
        assert!(std::error::Error::source(&e).is_some());
    }
}
