//! `serde_json` interop for dynamic values.
//!
//! JSON maps onto the engine's dynamic shapes: objects become
//! `map[string]any`, arrays `[]any`, integers `int64` (or `uint64` above
//! `i64::MAX`) and other numbers `float64`. Decoding into a concrete type
//! goes through the clone engine, so JSON strings can feed numeric fields
//! and objects can feed structs.

use serde_json::{Map, Number, Value as Json};

use prototype_core::application::{DefaultTimeCodec, Options, TimeCodec, clone_as_with};
use prototype_core::domain::{Kind, Type, Value};

use crate::error::{AdapterError, AdapterResult};

const MAX_DEPTH: usize = 512;

/// The dynamic value for `json`.
pub fn from_json(json: &Json) -> AdapterResult<Value> {
    Ok(match json {
        Json::Null => Value::nil(),
        Json::Bool(b) => Value::bool(*b),
        Json::Number(n) => match (n.as_i64(), n.as_u64()) {
            (Some(i), _) => Value::int64(i),
            (None, Some(u)) => Value::uint64(u),
            _ => Value::float64(n.as_f64().unwrap_or(f64::NAN)),
        },
        Json::String(s) => Value::string(s.as_str()),
        Json::Array(items) => {
            let items = items.iter().map(from_json).collect::<AdapterResult<Vec<_>>>()?;
            Value::slice(&Type::any(), items)?
        }
        Json::Object(fields) => {
            let pairs = fields
                .iter()
                .map(|(k, v)| Ok((Value::string(k.as_str()), from_json(v)?)))
                .collect::<AdapterResult<Vec<_>>>()?;
            Value::map(&Type::string(), &Type::any(), pairs)?
        }
    })
}

/// Decode `json` into a fresh value of type `ty`.
pub fn decode(ty: &Type, json: &Json, opts: &Options) -> AdapterResult<Value> {
    let dynamic = from_json(json)?;
    Ok(clone_as_with(ty, &dynamic, opts)?)
}

/// The JSON form of `value`. Struct fields use their declared names and
/// unexported fields are skipped; timestamps render as RFC3339 strings.
pub fn to_json(value: &Value) -> AdapterResult<Json> {
    encode(value, 0)
}

fn unrepresentable(value: &Value, reason: &str) -> AdapterError {
    AdapterError::Json {
        value: format!("{value:?}"),
        reason: reason.to_string(),
    }
}

fn encode(value: &Value, depth: usize) -> AdapterResult<Json> {
    if depth > MAX_DEPTH {
        return Err(AdapterError::Json {
            value: value.ty().to_string(),
            reason: "nesting too deep (cyclic value?)".into(),
        });
    }
    if value.is_nil() {
        return Ok(Json::Null);
    }
    let next = depth + 1;
    Ok(match value.kind() {
        Kind::Bool => Json::Bool(value.as_bool().unwrap_or_default()),
        Kind::Int | Kind::Int8 | Kind::Int16 | Kind::Int32 | Kind::Int64 => {
            Json::from(value.as_i64().unwrap_or_default())
        }
        Kind::Uint | Kind::Uint8 | Kind::Uint16 | Kind::Uint32 | Kind::Uint64 => {
            Json::from(value.as_u64().unwrap_or_default())
        }
        Kind::Float32 | Kind::Float64 => {
            let x = value.as_f64().unwrap_or_default();
            Json::Number(Number::from_f64(x).ok_or_else(|| unrepresentable(value, "non-finite"))?)
        }
        Kind::String => Json::String(value.as_str().unwrap_or_default().to_string()),
        Kind::Time => match value.as_time() {
            Some(t) => Json::String(DefaultTimeCodec.format(t)),
            None => Json::Null,
        },
        Kind::Slice | Kind::Array => Json::Array(
            value
                .items()
                .iter()
                .map(|item| encode(item, next))
                .collect::<AdapterResult<_>>()?,
        ),
        Kind::Map => {
            let mut object = Map::new();
            for (k, v) in value.map_entries() {
                object.insert(k.to_string(), encode(&v, next)?);
            }
            Json::Object(object)
        }
        Kind::Struct => {
            let mut object = Map::new();
            for (field, v) in value.ty().fields().iter().zip(value.fields()) {
                if field.is_exported() {
                    object.insert(field.name().to_string(), encode(v, next)?);
                }
            }
            Json::Object(object)
        }
        Kind::Ptr => match value.elem() {
            Some(pointee) => encode(&pointee, next)?,
            None => Json::Null,
        },
        Kind::Interface => match value.payload() {
            Some(payload) => encode(payload, next)?,
            None => Json::Null,
        },
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use prototype_core::domain::TypeBuilder;

    #[test]
    fn objects_become_dynamic_maps() {
        let v = from_json(&json!({"a": 1, "b": [true, null], "c": 1.5, "d": u64::MAX})).unwrap();
        assert_eq!(v.ty(), &Type::map_of(&Type::string(), &Type::any()));
        assert_eq!(v.map_get(&Value::string("a")), Some(Value::boxed(Value::int64(1))));
        assert_eq!(
            v.map_get(&Value::string("d")),
            Some(Value::boxed(Value::uint64(u64::MAX)))
        );
        let b = v.map_get(&Value::string("b")).unwrap();
        assert_eq!(b.payload().map(Value::len), Some(2));
    }

    #[test]
    fn decode_targets_concrete_types() {
        let user = TypeBuilder::structure("User")
            .field("Name", &Type::string())
            .tagged_field("Age", &Type::uint8(), r#"prototype:"age""#)
            .field("Tags", &Type::slice_of(&Type::string()))
            .build()
            .unwrap();
        let out = decode(
            &user,
            &json!({"name": "ada", "age": "36", "Tags": ["x"]}),
            &Options::default(),
        )
        .unwrap();
        assert_eq!(out.field_by_name("Name"), Some(&Value::string("ada")));
        assert_eq!(out.field_by_name("Age"), Some(&Value::uint8(36)));
        assert_eq!(out.field_by_name("Tags").map(Value::len), Some(1));

        let err = decode(&user, &json!({"age": 300}), &Options::default()).unwrap_err();
        assert!(matches!(err, AdapterError::Clone(_)));
    }

    #[test]
    fn encodes_structs_and_pointers() {
        let point = TypeBuilder::structure("Point")
            .field("X", &Type::int32())
            .field("hidden", &Type::int32())
            .field("Next", &Type::ptr_to(&Type::float64()))
            .build()
            .unwrap();
        let v = Value::structure(
            &point,
            vec![Value::int32(-1), Value::int32(9), Value::ptr(Value::float64(0.5))],
        )
        .unwrap();
        assert_eq!(to_json(&v).unwrap(), json!({"X": -1, "Next": 0.5}));
    }

    #[test]
    fn round_trips_dynamic_json() {
        let doc = json!({"list": [1, "two", {"three": 3.5}], "ok": false, "none": null});
        assert_eq!(to_json(&from_json(&doc).unwrap()).unwrap(), doc);
    }

    #[test]
    fn cycles_and_nan_are_rejected() {
        assert!(to_json(&Value::float64(f64::NAN)).is_err());

        let mut m = Value::map(&Type::string(), &Type::any(), vec![]).unwrap();
        let shared = m.clone();
        m.map_insert(Value::string("self"), shared).unwrap();
        assert!(matches!(to_json(&m), Err(AdapterError::Json { .. })));
    }
}
