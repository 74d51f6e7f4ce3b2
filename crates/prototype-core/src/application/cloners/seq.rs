//! Slice and array sources.

use std::sync::Arc;

use super::{ClonerFn, clone_item, cloner_for, custom, hooks, incomplete, settle};
use crate::application::context::{Context, Identity};
use crate::application::error::CloneResult;
use crate::domain::entities::value::Repr;
use crate::domain::{Kind, PathSegment, Type, Value};

pub(super) fn cloner(ty: &Type) -> ClonerFn {
    let elem = ty.elem().map(cloner_for);
    Arc::new(move |ctx, tgt, src| {
        if src.kind() != Kind::Slice {
            return clone_seq(ctx, tgt, src, elem.as_ref());
        }
        let Some(base) = src.identity() else {
            return Ok(());
        };
        let target_type = tgt.ty().clone();
        ctx.guard(Identity::Slice(base, src.len()), src, &target_type, |ctx| {
            clone_seq(ctx, tgt, src, elem.as_ref())
        })
    })
}

fn clone_seq(
    ctx: &mut Context<'_>,
    tgt: &mut Value,
    src: &Value,
    elem: Option<&ClonerFn>,
) -> CloneResult<()> {
    settle(ctx, tgt, src, |ctx, slot| {
        if custom::clone_from(ctx, slot, src)? {
            return Ok(());
        }
        let byte_elems = src.ty().elem().is_some_and(|e| e.kind() == Kind::Uint8);
        if slot.kind() == Kind::String && byte_elems {
            return bytes_to_string(ctx, slot, src);
        }
        // slice elements live behind the slice header; array elements are
        // as addressable as the array itself
        let addressable = src.kind() == Kind::Slice || ctx.addressable();
        match slot.kind() {
            Kind::Slice => into_slice(ctx, slot, src, elem, addressable),
            Kind::Array => into_array(ctx, slot, src, elem, addressable),
            Kind::Interface => into_dynamic(ctx, slot, src, elem, addressable),
            _ => hooks::fallback(ctx, slot, src),
        }
    })
}

fn bytes_to_string(ctx: &mut Context<'_>, slot: &mut Value, src: &Value) -> CloneResult<()> {
    let bytes: Vec<u8> = src
        .items()
        .iter()
        .filter_map(|b| b.as_u64().and_then(|n| u8::try_from(n).ok()))
        .collect();
    match String::from_utf8(bytes) {
        Ok(text) => {
            slot.put(Repr::Str(text));
            Ok(())
        }
        Err(_) => Err(ctx.unsupported_value(slot.ty(), src, "invalid UTF-8")),
    }
}

fn clone_elements(
    ctx: &mut Context<'_>,
    items: &[Value],
    mut slots: impl FnMut(usize) -> Value,
    elem: Option<&ClonerFn>,
    addressable: bool,
) -> CloneResult<Vec<Option<Value>>> {
    let mut out = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        let mut slot = slots(i);
        let result = ctx.with_segment(PathSegment::Index(i), |ctx| {
            ctx.with_addressable(addressable, |ctx| clone_item(ctx, &mut slot, item, elem))
        });
        match result {
            Ok(()) => out.push(Some(slot)),
            Err(e) => {
                ctx.absorb(Err(e))?;
                out.push(None);
            }
        }
    }
    Ok(out)
}

fn into_slice(
    ctx: &mut Context<'_>,
    slot: &mut Value,
    src: &Value,
    elem: Option<&ClonerFn>,
    addressable: bool,
) -> CloneResult<()> {
    let Some(t_elem) = slot.ty().elem().cloned() else {
        return Err(incomplete(ctx, slot.ty(), "element type"));
    };
    let items = src.items();
    let cloned = clone_elements(ctx, &items, |_| Value::zero(&t_elem), elem, addressable)?;
    // elements that failed in best-effort mode are dropped
    let fresh = Value::new_slice(slot.ty(), cloned.into_iter().flatten().collect())
        .map_err(|e| ctx.model(e))?;
    *slot = fresh;
    Ok(())
}

fn into_array(
    ctx: &mut Context<'_>,
    slot: &mut Value,
    src: &Value,
    elem: Option<&ClonerFn>,
    addressable: bool,
) -> CloneResult<()> {
    let Some(t_elem) = slot.ty().elem().cloned() else {
        return Err(incomplete(ctx, slot.ty(), "element type"));
    };
    let len = slot.ty().array_len();
    let mut items = src.items();
    items.truncate(len);
    let cloned = clone_elements(ctx, &items, |_| Value::zero(&t_elem), elem, addressable)?;
    let mut out: Vec<Value> = cloned
        .into_iter()
        .map(|v| v.unwrap_or_else(|| Value::zero(&t_elem)))
        .collect();
    out.resize_with(len, || Value::zero(&t_elem));
    slot.put(Repr::Array(out));
    Ok(())
}

/// Widen into `[]any`.
fn into_dynamic(
    ctx: &mut Context<'_>,
    slot: &mut Value,
    src: &Value,
    elem: Option<&ClonerFn>,
    addressable: bool,
) -> CloneResult<()> {
    let items = src.items();
    let cloned = clone_elements(ctx, &items, |_| Value::nil(), elem, addressable)?;
    let list = Value::slice(&Type::any(), cloned.into_iter().flatten().collect())
        .map_err(|e| ctx.model(e))?;
    slot.set(list).map_err(|e| ctx.model(e))
}
