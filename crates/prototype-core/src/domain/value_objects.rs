//! Domain value objects: Kind, WellKnown, Receiver.
//!
//! # Design
//!
//! These are pure value types — `Copy`, equality-by-value, no identity.
//! They hold NO conversion logic. Which kind converts into which lives in
//! `capabilities.rs`. This file's only job is to define the catalogue, the
//! string representations, the `FromStr` parsers and a handful of numeric
//! facts (bit sizes and ranges) the set helpers rely on.
//!
//! # Adding New Variants
//!
//! 1. Add the enum variant here
//! 2. Add the `as_str` arm and the `FromStr` arm here
//! 3. Add a conversion entry in `capabilities.rs` if it is a scalar
//! 4. Done — nothing else changes

use crate::domain::error::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ── Kind ─────────────────────────────────────────────────────────────────────

/// The structural class of a runtime type.
///
/// `Int` and `Uint` are 64 bits wide. `Time` is a scalar timestamp rather
/// than an aggregate, so it gets its own row in the conversion registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    Bool,
    Int,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Float32,
    Float64,
    String,
    Time,
    Array,
    Slice,
    Map,
    Struct,
    Ptr,
    Interface,
}

impl Kind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Int8 => "int8",
            Self::Int16 => "int16",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::Uint => "uint",
            Self::Uint8 => "uint8",
            Self::Uint16 => "uint16",
            Self::Uint32 => "uint32",
            Self::Uint64 => "uint64",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
            Self::String => "string",
            Self::Time => "time",
            Self::Array => "array",
            Self::Slice => "slice",
            Self::Map => "map",
            Self::Struct => "struct",
            Self::Ptr => "ptr",
            Self::Interface => "interface",
        }
    }

    pub const fn is_int(self) -> bool {
        matches!(
            self,
            Self::Int | Self::Int8 | Self::Int16 | Self::Int32 | Self::Int64
        )
    }

    pub const fn is_uint(self) -> bool {
        matches!(
            self,
            Self::Uint | Self::Uint8 | Self::Uint16 | Self::Uint32 | Self::Uint64
        )
    }

    pub const fn is_float(self) -> bool {
        matches!(self, Self::Float32 | Self::Float64)
    }

    pub const fn is_numeric(self) -> bool {
        self.is_int() || self.is_uint() || self.is_float()
    }

    /// Kinds whose zero value is `nil`.
    pub const fn is_nillable(self) -> bool {
        matches!(self, Self::Slice | Self::Map | Self::Ptr | Self::Interface)
    }

    /// Kinds that may be used as map keys.
    pub const fn is_comparable(self) -> bool {
        !matches!(self, Self::Slice | Self::Map)
    }

    /// Width in bits for numeric kinds, `0` otherwise.
    pub const fn bits(self) -> u32 {
        match self {
            Self::Int8 | Self::Uint8 => 8,
            Self::Int16 | Self::Uint16 => 16,
            Self::Int32 | Self::Uint32 | Self::Float32 => 32,
            Self::Int | Self::Int64 | Self::Uint | Self::Uint64 | Self::Float64 => 64,
            _ => 0,
        }
    }

    /// Inclusive range of a signed kind.
    pub const fn int_range(self) -> (i64, i64) {
        match self {
            Self::Int8 => (i8::MIN as i64, i8::MAX as i64),
            Self::Int16 => (i16::MIN as i64, i16::MAX as i64),
            Self::Int32 => (i32::MIN as i64, i32::MAX as i64),
            _ => (i64::MIN, i64::MAX),
        }
    }

    /// Upper bound of an unsigned kind.
    pub const fn uint_max(self) -> u64 {
        match self {
            Self::Uint8 => u8::MAX as u64,
            Self::Uint16 => u16::MAX as u64,
            Self::Uint32 => u32::MAX as u64,
            _ => u64::MAX,
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Kind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bool" | "boolean" => Ok(Self::Bool),
            "int" => Ok(Self::Int),
            "int8" => Ok(Self::Int8),
            "int16" => Ok(Self::Int16),
            "int32" => Ok(Self::Int32),
            "int64" => Ok(Self::Int64),
            "uint" => Ok(Self::Uint),
            "uint8" | "byte" => Ok(Self::Uint8),
            "uint16" => Ok(Self::Uint16),
            "uint32" => Ok(Self::Uint32),
            "uint64" => Ok(Self::Uint64),
            "float32" => Ok(Self::Float32),
            "float64" => Ok(Self::Float64),
            "string" => Ok(Self::String),
            "time" => Ok(Self::Time),
            "array" => Ok(Self::Array),
            "slice" => Ok(Self::Slice),
            "map" => Ok(Self::Map),
            "struct" => Ok(Self::Struct),
            "ptr" | "pointer" => Ok(Self::Ptr),
            "interface" | "any" => Ok(Self::Interface),
            other => Err(DomainError::UnknownKind(other.to_string())),
        }
    }
}

// ── WellKnown ────────────────────────────────────────────────────────────────

/// Recognised single-valued wrapper structs.
///
/// The `Null*` family carries a value field plus a `Valid` flag; the
/// protobuf-style wrappers carry a single `Value` field. `Timestamp` and
/// `Duration` carry `Seconds` and `Nanos`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WellKnown {
    NullBool,
    NullByte,
    NullInt16,
    NullInt32,
    NullInt64,
    NullFloat64,
    NullString,
    NullTime,
    BoolValue,
    Int32Value,
    Int64Value,
    UInt32Value,
    UInt64Value,
    FloatValue,
    DoubleValue,
    StringValue,
    BytesValue,
    Timestamp,
    Duration,
}

impl WellKnown {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NullBool => "NullBool",
            Self::NullByte => "NullByte",
            Self::NullInt16 => "NullInt16",
            Self::NullInt32 => "NullInt32",
            Self::NullInt64 => "NullInt64",
            Self::NullFloat64 => "NullFloat64",
            Self::NullString => "NullString",
            Self::NullTime => "NullTime",
            Self::BoolValue => "BoolValue",
            Self::Int32Value => "Int32Value",
            Self::Int64Value => "Int64Value",
            Self::UInt32Value => "UInt32Value",
            Self::UInt64Value => "UInt64Value",
            Self::FloatValue => "FloatValue",
            Self::DoubleValue => "DoubleValue",
            Self::StringValue => "StringValue",
            Self::BytesValue => "BytesValue",
            Self::Timestamp => "Timestamp",
            Self::Duration => "Duration",
        }
    }

    /// Nullable wrappers carry a `Valid` flag as their second field.
    pub const fn is_nullable(self) -> bool {
        matches!(
            self,
            Self::NullBool
                | Self::NullByte
                | Self::NullInt16
                | Self::NullInt32
                | Self::NullInt64
                | Self::NullFloat64
                | Self::NullString
                | Self::NullTime
        )
    }

    /// Wrappers that hold exactly one scalar (as opposed to seconds/nanos pairs).
    pub const fn is_single_valued(self) -> bool {
        !matches!(self, Self::Timestamp | Self::Duration)
    }

    /// Name of the field holding the wrapped scalar.
    pub const fn value_field(self) -> &'static str {
        match self {
            Self::NullBool => "Bool",
            Self::NullByte => "Byte",
            Self::NullInt16 => "Int16",
            Self::NullInt32 => "Int32",
            Self::NullInt64 => "Int64",
            Self::NullFloat64 => "Float64",
            Self::NullString => "String",
            Self::NullTime => "Time",
            Self::Timestamp | Self::Duration => "Seconds",
            _ => "Value",
        }
    }

    /// Kind of the wrapped scalar.
    pub const fn value_kind(self) -> Kind {
        match self {
            Self::NullBool | Self::BoolValue => Kind::Bool,
            Self::NullByte => Kind::Uint8,
            Self::NullInt16 => Kind::Int16,
            Self::NullInt32 | Self::Int32Value => Kind::Int32,
            Self::NullInt64 | Self::Int64Value => Kind::Int64,
            Self::UInt32Value => Kind::Uint32,
            Self::UInt64Value => Kind::Uint64,
            Self::NullFloat64 | Self::DoubleValue => Kind::Float64,
            Self::FloatValue => Kind::Float32,
            Self::NullString | Self::StringValue => Kind::String,
            Self::NullTime | Self::Timestamp => Kind::Time,
            Self::BytesValue => Kind::Slice,
            Self::Duration => Kind::Int64,
        }
    }
}

impl fmt::Display for WellKnown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WellKnown {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WELL_KNOWN_ALL
            .iter()
            .copied()
            .find(|w| w.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| DomainError::UnknownWellKnown(s.to_string()))
    }
}

/// Every well-known wrapper, in declaration order.
pub const WELL_KNOWN_ALL: &[WellKnown] = &[
    WellKnown::NullBool,
    WellKnown::NullByte,
    WellKnown::NullInt16,
    WellKnown::NullInt32,
    WellKnown::NullInt64,
    WellKnown::NullFloat64,
    WellKnown::NullString,
    WellKnown::NullTime,
    WellKnown::BoolValue,
    WellKnown::Int32Value,
    WellKnown::Int64Value,
    WellKnown::UInt32Value,
    WellKnown::UInt64Value,
    WellKnown::FloatValue,
    WellKnown::DoubleValue,
    WellKnown::StringValue,
    WellKnown::BytesValue,
    WellKnown::Timestamp,
    WellKnown::Duration,
];

// ── Receiver ─────────────────────────────────────────────────────────────────

/// Whether a method or behaviour is declared on the value or on its pointer.
///
/// Pointer-receiver getters and `clone_to` behaviours are only usable when the
/// source is addressable (reached through a pointer or a slice element).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Receiver {
    #[default]
    Value,
    Pointer,
}

impl Receiver {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Value => "value",
            Self::Pointer => "pointer",
        }
    }

    /// Whether a method with this receiver can be called on a source with
    /// the given addressability.
    pub const fn callable(self, addressable: bool) -> bool {
        match self {
            Self::Value => true,
            Self::Pointer => addressable,
        }
    }
}

impl fmt::Display for Receiver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
