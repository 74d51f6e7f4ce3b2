//! Range-checked numeric assignment.

use crate::application::context::Context;
use crate::application::error::CloneError;
use crate::domain::entities::value::Repr;
use crate::domain::{Kind, Type, Value};

/// A numeric operand, as read from any scalar representation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Num {
    Int(i64),
    Uint(u64),
    Float(f64),
}

impl Num {
    /// Booleans read as `0`/`1`.
    pub(crate) fn of(v: &Value) -> Option<Num> {
        match v.repr() {
            Repr::Int(n) => Some(Num::Int(*n)),
            Repr::Uint(n) => Some(Num::Uint(*n)),
            Repr::Float(x) => Some(Num::Float(*x)),
            Repr::Bool(b) => Some(Num::Int(i64::from(*b))),
            _ => None,
        }
    }

    pub(crate) fn is_nonzero(self) -> bool {
        match self {
            Num::Int(n) => n != 0,
            Num::Uint(n) => n != 0,
            Num::Float(x) => x != 0.0,
        }
    }
}

/// Why a number does not fit a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Rejection {
    Overflow,
    Negative,
    NonFinite,
}

pub(crate) fn to_int(kind: Kind, num: Num) -> Result<i64, Rejection> {
    let (lo, hi) = kind.int_range();
    match num {
        Num::Int(n) if n < lo || n > hi => Err(Rejection::Overflow),
        Num::Int(n) => Ok(n),
        Num::Uint(n) => i64::try_from(n)
            .ok()
            .filter(|n| *n <= hi)
            .ok_or(Rejection::Overflow),
        Num::Float(x) if !x.is_finite() => Err(Rejection::NonFinite),
        Num::Float(x) => {
            let t = x.trunc();
            if t >= lo as f64 && t < hi as f64 + 1.0 {
                Ok(t as i64)
            } else {
                Err(Rejection::Overflow)
            }
        }
    }
}

pub(crate) fn to_uint(kind: Kind, num: Num) -> Result<u64, Rejection> {
    let max = kind.uint_max();
    match num {
        Num::Int(n) if n < 0 => Err(Rejection::Negative),
        Num::Int(n) => Some(n as u64)
            .filter(|n| *n <= max)
            .ok_or(Rejection::Overflow),
        Num::Uint(n) if n > max => Err(Rejection::Overflow),
        Num::Uint(n) => Ok(n),
        Num::Float(x) if !x.is_finite() => Err(Rejection::NonFinite),
        Num::Float(x) => {
            let t = x.trunc();
            if t < 0.0 {
                Err(Rejection::Negative)
            } else if t >= max as f64 + 1.0 {
                Err(Rejection::Overflow)
            } else {
                Ok(t as u64)
            }
        }
    }
}

pub(crate) fn to_float(kind: Kind, num: Num) -> Result<f64, Rejection> {
    let x = match num {
        Num::Int(n) => n as f64,
        Num::Uint(n) => n as f64,
        Num::Float(x) => x,
    };
    if kind != Kind::Float32 {
        return Ok(x);
    }
    if x.is_finite() && x.abs() > f64::from(f32::MAX) {
        return Err(Rejection::Overflow);
    }
    Ok(f64::from(x as f32))
}

/// The representation of `num` in a slot of numeric kind `kind`.
pub(crate) fn assign(kind: Kind, num: Num) -> Result<Repr, Rejection> {
    if kind.is_int() {
        to_int(kind, num).map(Repr::Int)
    } else if kind.is_uint() {
        to_uint(kind, num).map(Repr::Uint)
    } else {
        to_float(kind, num).map(Repr::Float)
    }
}

pub(crate) fn reject(ctx: &Context<'_>, ty: &Type, src: &Value, rejection: Rejection) -> CloneError {
    match rejection {
        Rejection::Overflow => ctx.overflow(ty, src),
        Rejection::Negative => ctx.negative(ty, src),
        Rejection::NonFinite => ctx.unsupported_value(ty, src, "non-finite float"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INT_KINDS: [Kind; 5] = [Kind::Int, Kind::Int8, Kind::Int16, Kind::Int32, Kind::Int64];
    const UINT_KINDS: [Kind; 5] = [
        Kind::Uint,
        Kind::Uint8,
        Kind::Uint16,
        Kind::Uint32,
        Kind::Uint64,
    ];

    #[test]
    fn signed_bounds_are_inclusive() {
        for kind in INT_KINDS {
            let (lo, hi) = kind.int_range();
            assert_eq!(to_int(kind, Num::Int(lo)), Ok(lo));
            assert_eq!(to_int(kind, Num::Int(hi)), Ok(hi));
            if hi < i64::MAX {
                assert_eq!(to_int(kind, Num::Int(hi + 1)), Err(Rejection::Overflow));
                assert_eq!(to_int(kind, Num::Int(lo - 1)), Err(Rejection::Overflow));
            }
        }
        assert_eq!(to_int(Kind::Int64, Num::Uint(u64::MAX)), Err(Rejection::Overflow));
    }

    #[test]
    fn unsigned_rejects_negatives_separately() {
        for kind in UINT_KINDS {
            assert_eq!(to_uint(kind, Num::Int(-1)), Err(Rejection::Negative));
            assert_eq!(to_uint(kind, Num::Float(-1.5)), Err(Rejection::Negative));
            assert_eq!(to_uint(kind, Num::Uint(kind.uint_max())), Ok(kind.uint_max()));
        }
        assert_eq!(to_uint(Kind::Uint8, Num::Int(300)), Err(Rejection::Overflow));
        assert_eq!(to_uint(Kind::Uint8, Num::Float(-0.5)), Ok(0));
    }

    #[test]
    fn floats_truncate_and_check() {
        assert_eq!(to_int(Kind::Int8, Num::Float(127.9)), Ok(127));
        assert_eq!(to_int(Kind::Int8, Num::Float(128.0)), Err(Rejection::Overflow));
        assert_eq!(to_int(Kind::Int64, Num::Float(9.3e18)), Err(Rejection::Overflow));
        assert_eq!(to_int(Kind::Int, Num::Float(f64::NAN)), Err(Rejection::NonFinite));
        assert_eq!(to_uint(Kind::Uint64, Num::Float(1.9e19)), Err(Rejection::Overflow));
    }

    #[test]
    fn float32_range() {
        assert_eq!(to_float(Kind::Float32, Num::Float(1e39)), Err(Rejection::Overflow));
        assert_eq!(to_float(Kind::Float32, Num::Float(f64::INFINITY)), Ok(f64::INFINITY));
        assert_eq!(to_float(Kind::Float32, Num::Int(3)), Ok(3.0));
        assert_eq!(to_float(Kind::Float64, Num::Float(1e39)), Ok(1e39));
    }

    #[test]
    fn bools_read_as_bits() {
        assert_eq!(Num::of(&Value::bool(true)), Some(Num::Int(1)));
        assert!(!Num::of(&Value::float64(0.0)).unwrap().is_nonzero());
        assert!(Num::of(&Value::string("1")).is_none());
        assert!(matches!(assign(Kind::Float32, Num::Int(1)), Ok(Repr::Float(x)) if x == 1.0));
    }
}
