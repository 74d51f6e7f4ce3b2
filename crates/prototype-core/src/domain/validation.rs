use crate::domain::{entities::types::TypeBuilder, error::DomainError};

/// Centralized domain validation.
///
/// Definitions are checked once, when they are published; nothing in the
/// engine re-validates a published type.
pub struct DomainValidator;

impl DomainValidator {
    pub fn validate_builder(builder: &TypeBuilder) -> Result<(), DomainError> {
        builder.validate()
    }
}
