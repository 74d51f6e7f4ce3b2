// ============================================================================
//  CLEAN MODULE BOUNDARIES
// ============================================================================

//! Runtime type/value model.
//!
//! This module is the reflective substrate the clone engine walks: kinds,
//! types, values, struct tags, method tables and the scalar conversion
//! registry. It performs no cloning itself.
//!
//! ## Boundaries
//!
//! - **No engine logic**: conversions are *described* here
//!   (`capabilities`), applied in `application`
//! - **No I/O**: nothing here touches the filesystem or environment
//! - **Identity types**: `Type` handles compare by identity, `Value`s by
//!   deep equality
//!
// Public API - what the world sees
pub mod capabilities;
pub mod common;
pub mod entities;
pub mod error;
pub mod value_objects;

// Private implementation details - not visible outside domain
mod validation;

// Re-exports for convenience
pub use entities::{
    methods::{Ambient, Behaviour, BoxError, Method, MethodFn},
    tag::{StructTag, TagSpec},
    types::{StructField, Type, TypeBuilder, TypeId},
    value::{Cell, MapKey, Time, Value, epoch},
    wellknown::{self, well_known_type},
};

pub use capabilities::{Conversion, ScalarClass, TargetClass};
pub use common::{FullPath, PathSegment};
pub use error::{DomainError, ErrorCategory};
pub use validation::DomainValidator;
pub use value_objects::{Kind, Receiver, WELL_KNOWN_ALL, WellKnown};

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    // ========================================================================
    // Value Object Tests
    // ========================================================================

    #[test]
    fn kind_parses_correctly() {
        assert_eq!(Kind::from_str("int64").unwrap(), Kind::Int64);
        assert_eq!(Kind::from_str("BYTE").unwrap(), Kind::Uint8);
        assert_eq!(Kind::from_str("any").unwrap(), Kind::Interface);
        assert!(matches!(
            Kind::from_str("complex128"),
            Err(DomainError::UnknownKind(_))
        ));
    }

    #[test]
    fn kind_ranges() {
        assert_eq!(Kind::Int8.int_range(), (-128, 127));
        assert_eq!(Kind::Uint16.uint_max(), 65_535);
        assert_eq!(Kind::Float32.bits(), 32);
        assert!(Kind::Map.is_nillable());
        assert!(!Kind::Array.is_nillable());
    }

    #[test]
    fn well_known_parses_case_insensitively() {
        assert_eq!(
            WellKnown::from_str("nullstring").unwrap(),
            WellKnown::NullString
        );
        assert!(WellKnown::from_str("NullUUID").is_err());
        assert_eq!(WELL_KNOWN_ALL.len(), 19);
    }

    #[test]
    fn pointer_receivers_need_addressable_sources() {
        assert!(Receiver::Value.callable(false));
        assert!(!Receiver::Pointer.callable(false));
        assert!(Receiver::Pointer.callable(true));
    }

    // ========================================================================
    // Model Tests
    // ========================================================================

    #[test]
    fn builder_validation_goes_through_validator() {
        let builder = TypeBuilder::new("Broken", Kind::Slice);
        assert!(matches!(
            DomainValidator::validate_builder(&builder),
            Err(DomainError::IncompleteType { .. })
        ));
    }

    #[test]
    fn named_slice_keeps_element() {
        let ids = TypeBuilder::named("Ids", &Type::slice_of(&Type::int64()))
            .build()
            .unwrap();
        assert_eq!(ids.kind(), Kind::Slice);
        assert_eq!(ids.elem(), Some(&Type::int64()));
        assert_ne!(ids, Type::slice_of(&Type::int64()));

        let v = Value::new_slice(&ids, vec![Value::int64(1)]).unwrap();
        assert_eq!(v.ty(), &ids);
    }

    #[test]
    fn methods_are_found_by_name() {
        let user = TypeBuilder::structure("User")
            .field("name", &Type::string())
            .method(Method::getter("Name", |v| {
                Ok(v.field(0).cloned().unwrap_or_else(|| Value::string("")))
            }))
            .build()
            .unwrap();

        let getter = user.method("Name").unwrap();
        assert!(getter.is_getter());
        assert_eq!(getter.receiver(), Receiver::Value);
        assert!(user.method("SetName").is_none());
    }

    #[test]
    fn error_categories() {
        assert_eq!(
            DomainError::UnknownKind("x".into()).category(),
            ErrorCategory::NotFound
        );
        assert_eq!(
            DomainError::DuplicateField {
                type_name: "T".into(),
                field: "A".into()
            }
            .category(),
            ErrorCategory::Definition
        );
        assert!(
            !DomainError::UncomparableKey {
                key_type: "[]int".into()
            }
            .suggestions()
            .is_empty()
        );
    }
}
