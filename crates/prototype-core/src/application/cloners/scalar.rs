//! Scalar sources: bool, integers, floats, strings and time.

use std::sync::Arc;

use thiserror::Error;

use super::set::{self, Num};
use super::{ClonerFn, custom, hooks, settle, wellknown};
use crate::application::context::Context;
use crate::application::error::CloneResult;
use crate::domain::capabilities::conversion;
use crate::domain::entities::value::Repr;
use crate::domain::{Conversion, Kind, ScalarClass, TargetClass, Value};

/// `strconv`-style rejection of a boolean literal.
#[derive(Debug, Error)]
#[error("invalid syntax")]
pub(crate) struct SyntaxError;

pub(crate) fn parse_bool(s: &str) -> Result<bool, SyntaxError> {
    match s {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
        _ => Err(SyntaxError),
    }
}

pub(super) fn cloner() -> ClonerFn {
    Arc::new(|ctx, tgt, src| {
        settle(ctx, tgt, src, |ctx, slot| {
            if custom::clone_from(ctx, slot, src)? {
                return Ok(());
            }
            write_scalar(ctx, slot, src)
        })
    })
}

/// Write the scalar `src` into the settled `slot`.
pub(super) fn write_scalar(ctx: &mut Context<'_>, slot: &mut Value, src: &Value) -> CloneResult<()> {
    // text targets decode every foreign string, string-kinded ones included
    if let Some(text) = src.as_str() {
        if src.ty() != slot.ty() {
            if let Some(unmarshal) = slot.ty().behaviour().text_unmarshal.clone() {
                return unmarshal(slot, text).map_err(|e| ctx.parse_boxed(slot.ty(), text, e));
            }
        }
    }

    let Some(class) = ScalarClass::of(src.kind()) else {
        return hooks::fallback(ctx, slot, src);
    };
    let Some(strategy) = conversion(class, TargetClass::of(slot.ty())) else {
        return hooks::fallback(ctx, slot, src);
    };

    match strategy {
        Conversion::Assign => {
            slot.put(src.repr().clone());
            Ok(())
        }
        Conversion::Truthiness => {
            let truthy = Num::of(src).is_some_and(Num::is_nonzero);
            slot.put(Repr::Bool(truthy));
            Ok(())
        }
        Conversion::ZeroOne | Conversion::RangeChecked => assign_number(ctx, slot, src),
        Conversion::Parse => parse_into(ctx, slot, src),
        Conversion::Format => format_into(ctx, slot, src),
        Conversion::ByteCopy => {
            let text = src.as_str().unwrap_or_default();
            write_bytes(ctx, slot, text.as_bytes())
        }
        Conversion::TimeToNumber => {
            let Some(t) = src.as_time() else {
                return hooks::fallback(ctx, slot, src);
            };
            let n = ctx.opts().time_codec.to_int(t);
            match set::assign(slot.kind(), Num::Int(n)) {
                Ok(repr) => {
                    slot.put(repr);
                    Ok(())
                }
                Err(rejection) => Err(set::reject(ctx, slot.ty(), src, rejection)),
            }
        }
        Conversion::NumberToTime => {
            let Some(num) = Num::of(src) else {
                return hooks::fallback(ctx, slot, src);
            };
            let n = set::to_int(Kind::Int64, num)
                .map_err(|rejection| set::reject(ctx, slot.ty(), src, rejection))?;
            let t = ctx
                .opts()
                .time_codec
                .from_int(n)
                .map_err(|e| ctx.callback("time codec", e))?;
            slot.put(Repr::Time(t));
            Ok(())
        }
        Conversion::TimeToText => {
            let Some(t) = src.as_time() else {
                return hooks::fallback(ctx, slot, src);
            };
            let text = ctx.opts().time_codec.format(t);
            if slot.ty().is_bytes() {
                write_bytes(ctx, slot, text.as_bytes())
            } else {
                slot.put(Repr::Str(text));
                Ok(())
            }
        }
        Conversion::TextToTime => {
            let text = src.as_str().unwrap_or_default();
            let t = ctx
                .opts()
                .time_codec
                .parse(text)
                .map_err(|e| ctx.parse_boxed(slot.ty(), text, e))?;
            slot.put(Repr::Time(t));
            Ok(())
        }
        Conversion::TextUnmarshal => hooks::fallback(ctx, slot, src),
        Conversion::Boxed => {
            let widened = widen(src);
            let boxed = Value::boxed_as(slot.ty(), widened).map_err(|e| ctx.model(e))?;
            *slot = boxed;
            Ok(())
        }
        Conversion::Wrap => wellknown::wrap_into(ctx, slot, src),
    }
}

fn assign_number(ctx: &mut Context<'_>, slot: &mut Value, src: &Value) -> CloneResult<()> {
    let Some(num) = Num::of(src) else {
        return hooks::fallback(ctx, slot, src);
    };
    match set::assign(slot.kind(), num) {
        Ok(repr) => {
            slot.put(repr);
            Ok(())
        }
        Err(rejection) => Err(set::reject(ctx, slot.ty(), src, rejection)),
    }
}

fn parse_into(ctx: &mut Context<'_>, slot: &mut Value, src: &Value) -> CloneResult<()> {
    let text = src.as_str().unwrap_or_default();
    let kind = slot.kind();
    if kind == Kind::Bool {
        let b = parse_bool(text).map_err(|e| ctx.parse(slot.ty(), text, e))?;
        slot.put(Repr::Bool(b));
        return Ok(());
    }
    let num = if kind.is_int() {
        Num::Int(text.parse::<i64>().map_err(|e| ctx.parse(slot.ty(), text, e))?)
    } else if kind.is_uint() {
        if let Ok(n) = text.parse::<i64>() {
            if n < 0 {
                return Err(ctx.negative(slot.ty(), text));
            }
        }
        Num::Uint(text.parse::<u64>().map_err(|e| ctx.parse(slot.ty(), text, e))?)
    } else {
        Num::Float(text.parse::<f64>().map_err(|e| ctx.parse(slot.ty(), text, e))?)
    };
    match set::assign(kind, num) {
        Ok(repr) => {
            slot.put(repr);
            Ok(())
        }
        Err(rejection) => Err(set::reject(ctx, slot.ty(), src, rejection)),
    }
}

fn format_into(ctx: &mut Context<'_>, slot: &mut Value, src: &Value) -> CloneResult<()> {
    let text = match src.repr() {
        Repr::Bool(b) => b.to_string(),
        Repr::Int(n) => n.to_string(),
        Repr::Uint(n) => n.to_string(),
        Repr::Float(x) if !x.is_finite() => {
            return Err(ctx.unsupported_value(slot.ty(), src, "non-finite float"));
        }
        Repr::Float(x) if src.kind() == Kind::Float32 => (*x as f32).to_string(),
        Repr::Float(x) => x.to_string(),
        _ => return hooks::fallback(ctx, slot, src),
    };
    slot.put(Repr::Str(text));
    Ok(())
}

fn write_bytes(ctx: &mut Context<'_>, slot: &mut Value, bytes: &[u8]) -> CloneResult<()> {
    let Some(elem) = slot.ty().elem().cloned() else {
        return Err(super::incomplete(ctx, slot.ty(), "element type"));
    };
    let items = bytes
        .iter()
        .map(|b| Value::from_parts(elem.clone(), Repr::Uint(u64::from(*b))))
        .collect();
    let fresh = Value::new_slice(slot.ty(), items).map_err(|e| ctx.model(e))?;
    *slot = fresh;
    Ok(())
}

/// Dynamic widening: 64-bit numerics, plain strings, bools and times.
fn widen(src: &Value) -> Value {
    match src.repr() {
        Repr::Bool(b) => Value::bool(*b),
        Repr::Int(n) => Value::int64(*n),
        Repr::Uint(n) => Value::uint64(*n),
        Repr::Float(x) => Value::float64(*x),
        Repr::Str(s) => Value::string(s.clone()),
        Repr::Time(t) => Value::time(*t),
        _ => src.clone(),
    }
}
