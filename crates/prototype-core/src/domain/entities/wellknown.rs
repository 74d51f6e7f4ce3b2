//! Built-in wrapper struct types.
//!
//! Each [`WellKnown`] variant maps to one process-wide struct type:
//!
//! | family      | layout                              |
//! |-------------|-------------------------------------|
//! | `Null*`     | `{ <Scalar>: T, Valid: bool }`      |
//! | `*Value`    | `{ Value: T }`                      |
//! | `Timestamp` | `{ Seconds: int64, Nanos: int32 }`  |
//! | `Duration`  | `{ Seconds: int64, Nanos: int32 }`  |

use std::sync::OnceLock;

use crate::domain::entities::types::{Type, TypeBuilder};
use crate::domain::entities::value::{Time, Value};
use crate::domain::error::DomainError;
use crate::domain::value_objects::{WELL_KNOWN_ALL, WellKnown};

const NANOS_PER_SECOND: i64 = 1_000_000_000;

fn scalar_type(wk: WellKnown) -> Type {
    match wk {
        WellKnown::BytesValue => Type::bytes(),
        other => Type::basic(other.value_kind()).unwrap_or_else(Type::any),
    }
}

fn define(wk: WellKnown) -> Type {
    let builder = TypeBuilder::well_known(wk);
    let builder = if wk.is_single_valued() {
        let builder = builder.field(wk.value_field(), &scalar_type(wk));
        if wk.is_nullable() {
            builder.field("Valid", &Type::bool())
        } else {
            builder
        }
    } else {
        builder
            .field("Seconds", &Type::int64())
            .field("Nanos", &Type::int32())
    };
    builder.finish()
}

/// The struct type of a well-known wrapper.
pub fn well_known_type(wk: WellKnown) -> Type {
    static TYPES: OnceLock<Vec<Type>> = OnceLock::new();
    let types = TYPES.get_or_init(|| WELL_KNOWN_ALL.iter().copied().map(define).collect());
    WELL_KNOWN_ALL
        .iter()
        .position(|w| *w == wk)
        .and_then(|i| types.get(i).cloned())
        .unwrap_or_else(|| define(wk))
}

/// A single-valued wrapper holding `inner`, or an invalid (null) one.
pub fn wrap(wk: WellKnown, inner: Option<Value>) -> Result<Value, DomainError> {
    let ty = well_known_type(wk);
    if !wk.is_single_valued() {
        return Err(DomainError::WrongKind {
            operation: "wrap",
            kind: wk.to_string(),
        });
    }
    let mut out = Value::zero(&ty);
    if let Some(inner) = inner {
        out.set_field(wk.value_field(), inner)?;
        if wk.is_nullable() {
            out.set_field("Valid", Value::bool(true))?;
        }
    } else if !wk.is_nullable() {
        return Err(DomainError::NilDereference {
            type_name: ty.to_string(),
        });
    }
    Ok(out)
}

/// Split nanoseconds into Go-style `(seconds, nanos)` with matching signs.
pub(crate) fn split_nanos(total: i64) -> (i64, i64) {
    (total / NANOS_PER_SECOND, total % NANOS_PER_SECOND)
}

pub(crate) fn join_nanos(seconds: i64, nanos: i64) -> Option<i64> {
    seconds
        .checked_mul(NANOS_PER_SECOND)
        .and_then(|s| s.checked_add(nanos))
}

/// A `Timestamp` for `t`.
pub fn timestamp(t: &Time) -> Value {
    let mut out = Value::zero(&well_known_type(WellKnown::Timestamp));
    let _ = out.set_field("Seconds", Value::int64(t.timestamp()));
    let _ = out.set_field("Nanos", Value::int32(t.timestamp_subsec_nanos() as i32));
    out
}

/// A `Duration` wrapper of `nanos` nanoseconds.
pub fn duration(nanos: i64) -> Value {
    let (seconds, rest) = split_nanos(nanos);
    let mut out = Value::zero(&well_known_type(WellKnown::Duration));
    let _ = out.set_field("Seconds", Value::int64(seconds));
    let _ = out.set_field("Nanos", Value::int32(rest as i32));
    out
}

/// Seconds and nanos of a `Timestamp`/`Duration` value.
pub(crate) fn seconds_nanos(v: &Value) -> (i64, i64) {
    let seconds = v.field(0).and_then(Value::as_i64).unwrap_or_default();
    let nanos = v.field(1).and_then(Value::as_i64).unwrap_or_default();
    (seconds, nanos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    #[test]
    fn types_are_cached() {
        let a = well_known_type(WellKnown::NullString);
        let b = well_known_type(WellKnown::NullString);
        assert_eq!(a, b);
        assert_eq!(a.well_known(), Some(WellKnown::NullString));
        assert_eq!(a.fields()[0].name(), "String");
        assert_eq!(a.fields()[1].name(), "Valid");
    }

    #[test]
    fn wrapper_layouts() {
        let bytes = well_known_type(WellKnown::BytesValue);
        assert!(bytes.fields()[0].ty().is_bytes());
        let ts = well_known_type(WellKnown::Timestamp);
        assert_eq!(ts.fields().len(), 2);
        assert_eq!(ts.fields()[1].ty(), &Type::int32());
    }

    #[test]
    fn wrap_sets_valid() {
        let v = wrap(WellKnown::NullInt64, Some(Value::int64(7))).unwrap();
        assert_eq!(v.field_by_name("Valid").and_then(Value::as_bool), Some(true));
        let null = wrap(WellKnown::NullInt64, None).unwrap();
        assert!(null.is_zero());
        assert!(wrap(WellKnown::Int64Value, None).is_err());
        assert!(wrap(WellKnown::NullInt64, Some(Value::int(7))).is_err());
    }

    #[test]
    fn timestamp_parts() {
        let t = DateTime::from_timestamp(10, 5).unwrap().fixed_offset();
        assert_eq!(seconds_nanos(&timestamp(&t)), (10, 5));
        assert_eq!(seconds_nanos(&duration(-1_500_000_000)), (-1, -500_000_000));
        assert_eq!(join_nanos(-1, -500_000_000), Some(-1_500_000_000));
    }
}
