//! Map sources.
//!
//! Entries are visited in the order of their stringified keys, which is also
//! the key used for path segments and for struct field lookup.

use std::sync::Arc;

use super::{ClonerFn, clone_item, clone_value, cloner_for, custom, hooks, incomplete, settle};
use crate::application::context::{Context, Identity};
use crate::application::error::CloneResult;
use crate::application::index::index_of;
use crate::domain::{Kind, PathSegment, ScalarClass, Type, Value};

use super::structs;

type Entry = (String, Value, Value);

pub(super) fn cloner(ty: &Type) -> ClonerFn {
    let key = ty.key().map(cloner_for);
    let elem = ty.elem().map(cloner_for);
    Arc::new(move |ctx, tgt, src| {
        let Some(id) = src.identity() else {
            return Ok(());
        };
        let target_type = tgt.ty().clone();
        ctx.guard(Identity::Map(id), src, &target_type, |ctx| {
            settle(ctx, tgt, src, |ctx, slot| {
                if custom::clone_from(ctx, slot, src)? {
                    return Ok(());
                }
                let entries = sorted_entries(ctx, src)?;
                match slot.kind() {
                    Kind::Map => map_to_map(ctx, slot, &entries, key.as_ref(), elem.as_ref()),
                    Kind::Struct => map_to_struct(ctx, slot, &entries),
                    Kind::Interface => map_to_dynamic(ctx, slot, &entries),
                    _ => hooks::fallback(ctx, slot, src),
                }
            })
        })
    })
}

fn sorted_entries(ctx: &Context<'_>, src: &Value) -> CloneResult<Vec<Entry>> {
    let mut entries = src
        .map_entries()
        .into_iter()
        .map(|(k, v)| Ok((key_string(ctx, &k)?, k, v)))
        .collect::<CloneResult<Vec<_>>>()?;
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(entries)
}

/// Text form of a map key.
pub(crate) fn key_string(ctx: &Context<'_>, key: &Value) -> CloneResult<String> {
    let behaviour = key.ty().behaviour();
    if let Some(marshal) = &behaviour.text_marshal {
        return marshal(key).map_err(|e| ctx.callback("text_marshal", e));
    }
    if let Some(stringer) = &behaviour.stringer {
        return Ok(stringer(key));
    }
    match key.kind() {
        Kind::Interface => match key.payload() {
            Some(payload) => key_string(ctx, payload),
            None => Ok("<nil>".to_string()),
        },
        Kind::Time => Ok(key
            .as_time()
            .map(|t| ctx.opts().time_codec.format(t))
            .unwrap_or_default()),
        kind if ScalarClass::of(kind).is_some() => Ok(key.to_string()),
        _ => Err(ctx.unsupported_type(key.ty(), &Type::string())),
    }
}

fn map_to_map(
    ctx: &mut Context<'_>,
    slot: &mut Value,
    entries: &[Entry],
    key: Option<&ClonerFn>,
    elem: Option<&ClonerFn>,
) -> CloneResult<()> {
    let (Some(key_ty), Some(elem_ty)) = (slot.ty().key().cloned(), slot.ty().elem().cloned())
    else {
        return Err(incomplete(ctx, slot.ty(), "key and element types"));
    };
    if slot.ensure_map(ctx.deep()).is_none() {
        return Err(incomplete(ctx, slot.ty(), "map storage"));
    }

    for (text, k, v) in entries {
        let result = ctx.with_segment(PathSegment::Key(text.clone()), |ctx| {
            ctx.with_addressable(false, |ctx| {
                let mut new_key = Value::zero(&key_ty);
                clone_item(ctx, &mut new_key, k, key)?;
                if new_key.kind() == Kind::Interface && new_key.is_nil() {
                    return Ok(());
                }
                let mut new_value = Value::zero(&elem_ty);
                clone_item(ctx, &mut new_value, v, elem)?;
                slot.map_insert(new_key, new_value).map_err(|e| ctx.model(e))
            })
        });
        ctx.absorb(result)?;
    }
    Ok(())
}

fn map_to_struct(ctx: &mut Context<'_>, slot: &mut Value, entries: &[Entry]) -> CloneResult<()> {
    let opts = ctx.opts();
    let t_idx = index_of(slot.ty(), &opts.target_tag_key, opts);
    for (text, _, v) in entries {
        let Some(fd) = t_idx.dominant(text, opts) else {
            continue;
        };
        let result = ctx.with_segment(PathSegment::Key(text.clone()), |ctx| {
            structs::write_field(ctx, slot, fd, v, false)
        });
        ctx.absorb(result)?;
    }
    Ok(())
}

/// Widen into `map[string]any`.
fn map_to_dynamic(ctx: &mut Context<'_>, slot: &mut Value, entries: &[Entry]) -> CloneResult<()> {
    let mut out = Value::zero(&Type::map_of(&Type::string(), &Type::any()));
    out.ensure_map(true);
    for (text, _, v) in entries {
        let result = ctx.with_segment(PathSegment::Key(text.clone()), |ctx| {
            let mut item = Value::nil();
            clone_value(ctx, &mut item, v)?;
            out.map_insert(Value::string(text.clone()), item)
                .map_err(|e| ctx.model(e))
        });
        ctx.absorb(result)?;
    }
    slot.set(out).map_err(|e| ctx.model(e))
}
