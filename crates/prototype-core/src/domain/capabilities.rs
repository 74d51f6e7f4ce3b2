//! Scalar conversion registry.
//!
//! # Design Rationale
//!
//! Which scalar converts into which target, and how, is described exactly
//! once: each `(source class, target class)` pair has at most one
//! [`ConversionDef`] in [`CONVERSION_REGISTRY`]. The scalar cloners look the
//! pair up and apply the strategy; a missing pair falls through to the hook
//! layer.
//!
//! # Adding a Conversion
//!
//! 1. Add a [`Conversion`] variant if no existing strategy fits
//! 2. Add one [`ConversionDef`] entry to [`CONVERSION_REGISTRY`]
//! 3. Teach `application::cloners::scalar` to apply the new strategy

use crate::domain::entities::types::Type;
use crate::domain::value_objects::Kind;
use std::fmt;

// ── Classes ──────────────────────────────────────────────────────────────────

/// Source-side classification of a scalar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarClass {
    Bool,
    Int,
    Uint,
    Float,
    String,
    Time,
}

impl ScalarClass {
    pub const fn of(kind: Kind) -> Option<Self> {
        match kind {
            Kind::Bool => Some(Self::Bool),
            Kind::Int | Kind::Int8 | Kind::Int16 | Kind::Int32 | Kind::Int64 => Some(Self::Int),
            Kind::Uint | Kind::Uint8 | Kind::Uint16 | Kind::Uint32 | Kind::Uint64 => {
                Some(Self::Uint)
            }
            Kind::Float32 | Kind::Float64 => Some(Self::Float),
            Kind::String => Some(Self::String),
            Kind::Time => Some(Self::Time),
            _ => None,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Uint => "uint",
            Self::Float => "float",
            Self::String => "string",
            Self::Time => "time",
        }
    }
}

impl fmt::Display for ScalarClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Target-side classification of a (dereferenced) slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetClass {
    Bool,
    Int,
    Uint,
    Float,
    String,
    Bytes,
    Time,
    /// An interface slot.
    Dynamic,
    /// A well-known wrapper struct.
    Wrapper,
    /// Anything else: structs, maps, non-byte sequences.
    Other,
}

impl TargetClass {
    pub fn of(ty: &Type) -> Self {
        if ty.well_known().is_some() {
            return Self::Wrapper;
        }
        match ty.kind() {
            Kind::Bool => Self::Bool,
            Kind::Int | Kind::Int8 | Kind::Int16 | Kind::Int32 | Kind::Int64 => Self::Int,
            Kind::Uint | Kind::Uint8 | Kind::Uint16 | Kind::Uint32 | Kind::Uint64 => Self::Uint,
            Kind::Float32 | Kind::Float64 => Self::Float,
            Kind::String => Self::String,
            Kind::Time => Self::Time,
            Kind::Slice if ty.is_bytes() => Self::Bytes,
            Kind::Interface => Self::Dynamic,
            _ => Self::Other,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Uint => "uint",
            Self::Float => "float",
            Self::String => "string",
            Self::Bytes => "bytes",
            Self::Time => "time",
            Self::Dynamic => "dynamic",
            Self::Wrapper => "wrapper",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for TargetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Strategies ───────────────────────────────────────────────────────────────

/// How a scalar is written into a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Conversion {
    /// Same class, no range to check.
    Assign,
    /// `x != 0`.
    Truthiness,
    /// `false → 0`, `true → 1`.
    ZeroOne,
    /// Numeric to numeric, rejecting values outside the target range.
    RangeChecked,
    /// Canonical decimal / boolean parse.
    Parse,
    /// Canonical text form.
    Format,
    /// Raw bytes of the text.
    ByteCopy,
    /// Through the time codec's integer form.
    TimeToNumber,
    NumberToTime,
    /// Through the time codec's text form.
    TimeToText,
    TextToTime,
    /// Through the target's `text_unmarshal` behaviour.
    TextUnmarshal,
    /// Box into the dynamic slot, widening numerics to 64 bits.
    Boxed,
    /// Write the wrapper's inner field and mark it present.
    Wrap,
}

/// One entry of the conversion matrix.
#[derive(Debug, Clone, Copy)]
pub struct ConversionDef {
    pub source: ScalarClass,
    pub target: TargetClass,
    pub conversion: Conversion,
}

const fn def(source: ScalarClass, target: TargetClass, conversion: Conversion) -> ConversionDef {
    ConversionDef {
        source,
        target,
        conversion,
    }
}

use Conversion as C;
use ScalarClass as S;
use TargetClass as T;

/// Single source of truth for scalar conversions.
pub static CONVERSION_REGISTRY: &[ConversionDef] = &[
    // ── bool ─────────────────────────────────────────────────────────────────
    def(S::Bool, T::Bool, C::Assign),
    def(S::Bool, T::Int, C::ZeroOne),
    def(S::Bool, T::Uint, C::ZeroOne),
    def(S::Bool, T::Float, C::ZeroOne),
    def(S::Bool, T::String, C::Format),
    def(S::Bool, T::Dynamic, C::Boxed),
    def(S::Bool, T::Wrapper, C::Wrap),
    // ── int ──────────────────────────────────────────────────────────────────
    def(S::Int, T::Bool, C::Truthiness),
    def(S::Int, T::Int, C::RangeChecked),
    def(S::Int, T::Uint, C::RangeChecked),
    def(S::Int, T::Float, C::RangeChecked),
    def(S::Int, T::String, C::Format),
    def(S::Int, T::Time, C::NumberToTime),
    def(S::Int, T::Dynamic, C::Boxed),
    def(S::Int, T::Wrapper, C::Wrap),
    // ── uint ─────────────────────────────────────────────────────────────────
    def(S::Uint, T::Bool, C::Truthiness),
    def(S::Uint, T::Int, C::RangeChecked),
    def(S::Uint, T::Uint, C::RangeChecked),
    def(S::Uint, T::Float, C::RangeChecked),
    def(S::Uint, T::String, C::Format),
    def(S::Uint, T::Time, C::NumberToTime),
    def(S::Uint, T::Dynamic, C::Boxed),
    def(S::Uint, T::Wrapper, C::Wrap),
    // ── float ────────────────────────────────────────────────────────────────
    def(S::Float, T::Bool, C::Truthiness),
    def(S::Float, T::Int, C::RangeChecked),
    def(S::Float, T::Uint, C::RangeChecked),
    def(S::Float, T::Float, C::RangeChecked),
    def(S::Float, T::String, C::Format),
    def(S::Float, T::Time, C::NumberToTime),
    def(S::Float, T::Dynamic, C::Boxed),
    def(S::Float, T::Wrapper, C::Wrap),
    // ── string ───────────────────────────────────────────────────────────────
    def(S::String, T::Bool, C::Parse),
    def(S::String, T::Int, C::Parse),
    def(S::String, T::Uint, C::Parse),
    def(S::String, T::Float, C::Parse),
    def(S::String, T::String, C::Assign),
    def(S::String, T::Bytes, C::ByteCopy),
    def(S::String, T::Time, C::TextToTime),
    def(S::String, T::Dynamic, C::Boxed),
    def(S::String, T::Wrapper, C::Wrap),
    def(S::String, T::Other, C::TextUnmarshal),
    // ── time ─────────────────────────────────────────────────────────────────
    def(S::Time, T::Int, C::TimeToNumber),
    def(S::Time, T::Uint, C::TimeToNumber),
    def(S::Time, T::Float, C::TimeToNumber),
    def(S::Time, T::String, C::TimeToText),
    def(S::Time, T::Bytes, C::TimeToText),
    def(S::Time, T::Time, C::Assign),
    def(S::Time, T::Dynamic, C::Boxed),
    def(S::Time, T::Wrapper, C::Wrap),
];

// ── Lookups ──────────────────────────────────────────────────────────────────

pub fn find_conversion(source: ScalarClass, target: TargetClass) -> Option<&'static ConversionDef> {
    CONVERSION_REGISTRY
        .iter()
        .find(|d| d.source == source && d.target == target)
}

/// The strategy for writing a `source` scalar into a `target` slot, if any.
pub fn conversion(source: ScalarClass, target: TargetClass) -> Option<Conversion> {
    find_conversion(source, target).map(|d| d.conversion)
}

pub fn supported(source: ScalarClass, target: TargetClass) -> bool {
    find_conversion(source, target).is_some()
}

/// Every target class a source class can be written into.
pub fn targets_for(source: ScalarClass) -> impl Iterator<Item = TargetClass> {
    CONVERSION_REGISTRY
        .iter()
        .filter(move |d| d.source == source)
        .map(|d| d.target)
}

/// Panics if the registry is inconsistent. Called from tests.
#[doc(hidden)]
pub fn assert_registry_integrity() {
    for (i, a) in CONVERSION_REGISTRY.iter().enumerate() {
        for b in &CONVERSION_REGISTRY[i + 1..] {
            assert!(
                !(a.source == b.source && a.target == b.target),
                "duplicate conversion for ({}, {})",
                a.source,
                a.target
            );
        }

        let same_class = matches!(
            (a.source, a.target),
            (S::Bool, T::Bool) | (S::String, T::String) | (S::Time, T::Time)
        );
        assert_eq!(
            a.conversion == C::Assign,
            same_class,
            "Assign is reserved for identical classes: ({}, {})",
            a.source,
            a.target
        );
    }
}
