// ============================================================================
// domain/error.rs - RUNTIME MODEL ERRORS
// ============================================================================

use thiserror::Error;

/// Root domain error type.
///
/// Raised when the runtime type/value model is misused: malformed type
/// definitions, values that do not fit their declared type, non-comparable
/// map keys. The clone engine never produces these for well-formed inputs.
///
/// All errors are:
/// - Cloneable (they travel inside engine errors)
/// - Categorizable (for display)
/// - Actionable (provides suggestions)
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    // ========================================================================
    // Catalogue lookups
    // ========================================================================
    #[error("unknown kind: {0}")]
    UnknownKind(String),

    #[error("unknown well-known type: {0}")]
    UnknownWellKnown(String),

    // ========================================================================
    // Type definition errors
    // ========================================================================
    #[error("type '{type_name}' is already defined")]
    AlreadyDefined { type_name: String },

    #[error("type '{type_name}' is missing its {part}")]
    IncompleteType {
        type_name: String,
        part: &'static str,
    },

    #[error("duplicate field '{field}' in struct '{type_name}'")]
    DuplicateField { type_name: String, field: String },

    #[error("embedded field '{field}' in '{type_name}' must be a struct or pointer to struct")]
    InvalidEmbedding { type_name: String, field: String },

    #[error("field '{field}' makes '{type_name}' contain itself by value")]
    RecursiveType { type_name: String, field: String },

    #[error("map key type '{key_type}' is not comparable")]
    UncomparableKey { key_type: String },

    #[error("invalid struct tag {tag:?}: {reason}")]
    InvalidTag { tag: String, reason: String },

    // ========================================================================
    // Value access errors
    // ========================================================================
    #[error("cannot use value of type '{actual}' as '{expected}'")]
    TypeMismatch { expected: String, actual: String },

    #[error("{operation} not supported on kind {kind}")]
    WrongKind {
        operation: &'static str,
        kind: String,
    },

    #[error("value {value} does not fit in '{type_name}'")]
    ValueOutOfRange { value: String, type_name: String },

    #[error("index {index} out of range for length {len}")]
    OutOfRange { index: usize, len: usize },

    #[error("no field named '{field}' in '{type_name}'")]
    NoSuchField { type_name: String, field: String },

    #[error("dereference of nil pointer of type '{type_name}'")]
    NilDereference { type_name: String },
}

impl DomainError {
    /// Get user-actionable suggestions for fixing this error.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::UnknownKind(kind) => vec![
                format!("'{}' is not a recognised kind", kind),
                "Use one of: bool, int*, uint*, float32, float64, string, time, array, slice, map, struct, ptr, interface".into(),
            ],
            Self::AlreadyDefined { type_name } => vec![
                format!("'{}' was built twice from the same builder handle", type_name),
                "Call build() exactly once per TypeBuilder".into(),
            ],
            Self::InvalidEmbedding { field, .. } => vec![
                format!("Declare '{}' as a named field instead of embedding it", field),
            ],
            Self::RecursiveType { field, .. } => vec![
                format!("Make '{}' a pointer, slice or map", field),
            ],
            Self::UncomparableKey { key_type } => vec![
                format!("'{}' cannot be hashed", key_type),
                "Use a string, bool, numeric, pointer, array or struct key".into(),
            ],
            Self::TypeMismatch { expected, .. } => vec![
                format!("Build the value with Value::zero of '{}' first", expected),
            ],
            _ => vec!["See documentation for more details".into()],
        }
    }

    /// Error category for display styling.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::UnknownKind(_) | Self::UnknownWellKnown(_) => ErrorCategory::NotFound,
            Self::NoSuchField { .. } => ErrorCategory::NotFound,
            Self::AlreadyDefined { .. }
            | Self::IncompleteType { .. }
            | Self::DuplicateField { .. }
            | Self::InvalidEmbedding { .. }
            | Self::RecursiveType { .. }
            | Self::InvalidTag { .. } => ErrorCategory::Definition,
            Self::UncomparableKey { .. }
            | Self::TypeMismatch { .. }
            | Self::WrongKind { .. }
            | Self::OutOfRange { .. }
            | Self::ValueOutOfRange { .. }
            | Self::NilDereference { .. } => ErrorCategory::Validation,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Definition,
    NotFound,
}
