//! Bridges between native Rust values and [`Value`].
//!
//! [`IntoValue`] is infallible; [`FromValue`] narrows through the clone
//! engine, so `"42"` reads as `42u8` and `300` fails to. Narrowing
//! failures are reported as [`CloneError::Convert`].

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::application::error::{CloneError, CloneResult};
use crate::application::services::clone_as;
use crate::domain::entities::value::Repr;
use crate::domain::{FullPath, MapKey, Time, Type, Value};

/// The runtime type a native type maps to.
pub trait Reflect {
    fn reflect_type() -> Type;
}

pub trait IntoValue {
    fn into_value(self) -> Value;
}

pub trait FromValue: Sized {
    fn from_value(value: &Value) -> CloneResult<Self>;
}

fn narrow(value: &Value, ty: &Type) -> CloneResult<Value> {
    clone_as(ty, value).map_err(|e| CloneError::Convert {
        path: e.path().cloned().unwrap_or_else(FullPath::root),
        target_type: ty.to_string(),
        reason: e.to_string(),
    })
}

fn mismatch(ty: &Type, value: &Value) -> CloneError {
    CloneError::Convert {
        path: FullPath::root(),
        target_type: ty.to_string(),
        reason: format!("got {value:?}"),
    }
}

macro_rules! scalar_value {
    ($($native:ty => $ctor:ident, $read:ident);* $(;)?) => {$(
        impl Reflect for $native {
            fn reflect_type() -> Type {
                Type::$ctor()
            }
        }

        impl IntoValue for $native {
            fn into_value(self) -> Value {
                Value::$ctor(self)
            }
        }

        impl FromValue for $native {
            fn from_value(value: &Value) -> CloneResult<Self> {
                let ty = Self::reflect_type();
                let narrowed = narrow(value, &ty)?;
                narrowed
                    .$read()
                    .and_then(|n| <$native>::try_from(n).ok())
                    .ok_or_else(|| mismatch(&ty, &narrowed))
            }
        }
    )*};
}

scalar_value! {
    i8 => int8, as_i64;
    i16 => int16, as_i64;
    i32 => int32, as_i64;
    i64 => int64, as_i64;
    u8 => uint8, as_u64;
    u16 => uint16, as_u64;
    u32 => uint32, as_u64;
    u64 => uint64, as_u64;
    bool => bool, as_bool;
}

impl Reflect for f32 {
    fn reflect_type() -> Type {
        Type::float32()
    }
}

impl IntoValue for f32 {
    fn into_value(self) -> Value {
        Value::float32(self)
    }
}

impl FromValue for f32 {
    fn from_value(value: &Value) -> CloneResult<Self> {
        let narrowed = narrow(value, &Type::float32())?;
        narrowed
            .as_f64()
            .map(|x| x as f32)
            .ok_or_else(|| mismatch(&Type::float32(), &narrowed))
    }
}

impl Reflect for f64 {
    fn reflect_type() -> Type {
        Type::float64()
    }
}

impl IntoValue for f64 {
    fn into_value(self) -> Value {
        Value::float64(self)
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> CloneResult<Self> {
        let narrowed = narrow(value, &Type::float64())?;
        narrowed
            .as_f64()
            .ok_or_else(|| mismatch(&Type::float64(), &narrowed))
    }
}

impl Reflect for String {
    fn reflect_type() -> Type {
        Type::string()
    }
}

impl IntoValue for String {
    fn into_value(self) -> Value {
        Value::string(self)
    }
}

impl IntoValue for &str {
    fn into_value(self) -> Value {
        Value::string(self)
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> CloneResult<Self> {
        let narrowed = narrow(value, &Type::string())?;
        narrowed
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| mismatch(&Type::string(), &narrowed))
    }
}

impl Reflect for Time {
    fn reflect_type() -> Type {
        Type::time()
    }
}

impl IntoValue for Time {
    fn into_value(self) -> Value {
        Value::time(self)
    }
}

impl FromValue for Time {
    fn from_value(value: &Value) -> CloneResult<Self> {
        let narrowed = narrow(value, &Type::time())?;
        narrowed
            .as_time()
            .copied()
            .ok_or_else(|| mismatch(&Type::time(), &narrowed))
    }
}

impl<T: Reflect> Reflect for Vec<T> {
    fn reflect_type() -> Type {
        Type::slice_of(&T::reflect_type())
    }
}

impl<T: Reflect + IntoValue> IntoValue for Vec<T> {
    fn into_value(self) -> Value {
        let items = self.into_iter().map(IntoValue::into_value).collect();
        Value::from_parts(
            Self::reflect_type(),
            Repr::Slice(Some(Arc::new(RwLock::new(items)))),
        )
    }
}

impl<T: Reflect + FromValue> FromValue for Vec<T> {
    fn from_value(value: &Value) -> CloneResult<Self> {
        narrow(value, &Self::reflect_type())?
            .items()
            .iter()
            .map(T::from_value)
            .collect()
    }
}

/// `None` maps to a nil pointer.
impl<T: Reflect> Reflect for Option<T> {
    fn reflect_type() -> Type {
        Type::ptr_to(&T::reflect_type())
    }
}

impl<T: Reflect + IntoValue> IntoValue for Option<T> {
    fn into_value(self) -> Value {
        match self {
            Some(v) => Value::ptr(v.into_value()),
            None => Value::nil_ptr(&T::reflect_type()),
        }
    }
}

impl<T: Reflect + FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> CloneResult<Self> {
        match narrow(value, &Self::reflect_type())?.elem() {
            Some(pointee) => T::from_value(&pointee).map(Some),
            None => Ok(None),
        }
    }
}

impl<T: Reflect> Reflect for BTreeMap<String, T> {
    fn reflect_type() -> Type {
        Type::map_of(&Type::string(), &T::reflect_type())
    }
}

impl<T: Reflect + IntoValue> IntoValue for BTreeMap<String, T> {
    fn into_value(self) -> Value {
        let entries = self
            .into_iter()
            .map(|(k, v)| (MapKey::Str(k.clone()), (Value::string(k), v.into_value())))
            .collect();
        Value::from_parts(
            Self::reflect_type(),
            Repr::Map(Some(Arc::new(RwLock::new(entries)))),
        )
    }
}

impl<T: Reflect + FromValue> FromValue for BTreeMap<String, T> {
    fn from_value(value: &Value) -> CloneResult<Self> {
        narrow(value, &Self::reflect_type())?
            .map_entries()
            .into_iter()
            .map(|(k, v)| Ok((k.as_str().unwrap_or_default().to_string(), T::from_value(&v)?)))
            .collect()
    }
}

impl Reflect for Value {
    fn reflect_type() -> Type {
        Type::any()
    }
}

impl IntoValue for Value {
    fn into_value(self) -> Value {
        self
    }
}

impl FromValue for Value {
    fn from_value(value: &Value) -> CloneResult<Self> {
        Ok(value.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::error::ErrorKind;

    #[test]
    fn natives_round_trip() {
        assert_eq!(i32::from_value(&(-5i32).into_value()).unwrap(), -5);
        assert_eq!(String::from_value(&"x".into_value()).unwrap(), "x");
        assert!(bool::from_value(&true.into_value()).unwrap());
    }

    #[test]
    fn narrowing_converts() {
        assert_eq!(u8::from_value(&Value::string("42")).unwrap(), 42);
        assert_eq!(String::from_value(&Value::int(7)).unwrap(), "7");
        assert_eq!(f64::from_value(&Value::boxed(Value::int(2))).unwrap(), 2.0);
    }

    #[test]
    fn narrowing_failures_are_convert_errors() {
        let err = u8::from_value(&Value::int(300)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Convert);
        assert_eq!(err.target_type(), Some("uint8"));
        assert!(err.to_string().contains("overflows"));
    }

    #[test]
    fn collections() {
        let v = vec![1i64, 2, 3].into_value();
        assert_eq!(v.ty(), &Type::slice_of(&Type::int64()));
        assert_eq!(Vec::<u8>::from_value(&v).unwrap(), [1, 2, 3]);

        let mut scores = BTreeMap::new();
        scores.insert("a".to_string(), 1u32);
        let m = scores.clone().into_value();
        assert_eq!(m.map_get(&Value::string("a")), Some(Value::uint32(1)));
        assert_eq!(BTreeMap::<String, u32>::from_value(&m).unwrap(), scores);

        assert_eq!(Option::<i64>::from_value(&None::<i64>.into_value()).unwrap(), None);
        assert_eq!(Option::<i64>::from_value(&Some(4i64).into_value()).unwrap(), Some(4));
    }
}
