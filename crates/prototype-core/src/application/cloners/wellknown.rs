//! Well-known wrapper shortcuts.
//!
//! A wrapper source is unwrapped to its scalar unless the target is the
//! same wrapper type, a plain struct or a map; those go through the generic
//! struct cloner. Writing a scalar into a wrapper target fills its value
//! field and marks nullable wrappers valid.

use std::sync::Arc;

use chrono::{DateTime, TimeDelta};

use super::{ClonerFn, clone_value, custom, hooks, settle, structs, write_nil};
use crate::application::context::Context;
use crate::application::error::CloneResult;
use crate::domain::wellknown as wrappers;
use crate::domain::{Kind, PathSegment, Type, Value, WellKnown};

pub(super) fn cloner(ty: &Type) -> ClonerFn {
    let Some(wk) = ty.well_known() else {
        return structs::cloner();
    };
    Arc::new(move |ctx, tgt, src| {
        if wk.is_nullable() && !is_valid(src) && redirects(&leaf_type(tgt.ty()), src.ty()) {
            write_nil(tgt);
            return Ok(());
        }
        settle(ctx, tgt, src, |ctx, slot| {
            if custom::clone_from(ctx, slot, src)? {
                return Ok(());
            }
            if !redirects(slot.ty(), src.ty()) {
                return structs::dispatch(ctx, slot, src);
            }
            match unwrap(ctx, slot.ty(), src, wk)? {
                Some(inner) => clone_value(ctx, slot, &inner),
                None => {
                    write_nil(slot);
                    Ok(())
                }
            }
        })
    })
}

fn is_valid(src: &Value) -> bool {
    src.field(1).and_then(Value::as_bool).unwrap_or(false)
}

fn leaf_type(ty: &Type) -> Type {
    let mut leaf = ty.clone();
    while leaf.kind() == Kind::Ptr {
        match leaf.elem() {
            Some(elem) if *elem != leaf => leaf = elem.clone(),
            _ => break,
        }
    }
    leaf
}

fn redirects(slot: &Type, src: &Type) -> bool {
    if slot == src {
        return false;
    }
    slot.well_known().is_some() || !matches!(slot.kind(), Kind::Struct | Kind::Map)
}

/// The scalar a wrapper stands for; `None` for an invalid nullable.
fn unwrap(
    ctx: &Context<'_>,
    target: &Type,
    src: &Value,
    wk: WellKnown,
) -> CloneResult<Option<Value>> {
    match wk {
        _ if wk.is_nullable() && !is_valid(src) => Ok(None),
        WellKnown::Timestamp => {
            let (seconds, nanos) = wrappers::seconds_nanos(src);
            DateTime::from_timestamp(seconds, 0)
                .and_then(|t| t.checked_add_signed(TimeDelta::nanoseconds(nanos)))
                .map(|t| Some(Value::time(t.fixed_offset())))
                .ok_or_else(|| ctx.unsupported_value(target, src, "timestamp out of range"))
        }
        WellKnown::Duration => {
            let (seconds, nanos) = wrappers::seconds_nanos(src);
            wrappers::join_nanos(seconds, nanos)
                .map(|n| Some(Value::duration(n)))
                .ok_or_else(|| ctx.overflow(&Type::duration(), src))
        }
        _ => Ok(src.field(0).cloned()),
    }
}

/// Write the scalar `src` into the wrapper `slot`.
pub(super) fn wrap_into(ctx: &mut Context<'_>, slot: &mut Value, src: &Value) -> CloneResult<()> {
    let Some(wk) = slot.ty().well_known() else {
        return hooks::fallback(ctx, slot, src);
    };
    let wrapped = match wk {
        WellKnown::Timestamp => {
            let mut t = Value::zero(&Type::time());
            clone_value(ctx, &mut t, src)?;
            wrappers::timestamp(&t.as_time().copied().unwrap_or_else(crate::domain::epoch))
        }
        WellKnown::Duration => {
            let mut d = Value::zero(&Type::duration());
            clone_value(ctx, &mut d, src)?;
            wrappers::duration(d.as_i64().unwrap_or_default())
        }
        _ => {
            let field = wk.value_field();
            let Some(field_ty) = slot.ty().fields().first().map(|f| f.ty().clone()) else {
                return Err(super::incomplete(ctx, slot.ty(), "fields"));
            };
            let mut inner = Value::zero(&field_ty);
            ctx.with_segment(PathSegment::Field(field.to_string()), |ctx| {
                clone_value(ctx, &mut inner, src)
            })?;
            let mut out = slot.clone();
            out.set_field(field, inner).map_err(|e| ctx.model(e))?;
            if wk.is_nullable() {
                out.set_field("Valid", Value::bool(true))
                    .map_err(|e| ctx.model(e))?;
            }
            out
        }
    };
    *slot = wrapped;
    Ok(())
}
