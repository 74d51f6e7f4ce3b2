//! Struct sources.

use std::borrow::Cow;
use std::sync::Arc;

use super::{ClonerFn, clone_value, custom, hooks, incomplete, settle};
use crate::application::context::Context;
use crate::application::error::CloneResult;
use crate::application::index::{FieldDescriptor, index_of};
use crate::domain::{DomainError, Kind, MethodFn, PathSegment, Type, Value};

pub(super) fn cloner() -> ClonerFn {
    Arc::new(|ctx, tgt, src| {
        settle(ctx, tgt, src, |ctx, slot| {
            if custom::clone_from(ctx, slot, src)? {
                return Ok(());
            }
            dispatch(ctx, slot, src)
        })
    })
}

pub(super) fn dispatch(ctx: &mut Context<'_>, slot: &mut Value, src: &Value) -> CloneResult<()> {
    match slot.kind() {
        Kind::Struct => struct_to_struct(ctx, slot, src),
        Kind::Map => struct_to_map(ctx, slot, src),
        Kind::Interface => struct_to_dynamic(ctx, slot, src),
        _ => hooks::fallback(ctx, slot, src),
    }
}

fn struct_to_struct(ctx: &mut Context<'_>, slot: &mut Value, src: &Value) -> CloneResult<()> {
    let opts = ctx.opts();
    let s_idx = index_of(src.ty(), &opts.source_tag_key, opts);
    let t_idx = index_of(slot.ty(), &opts.target_tag_key, opts);
    let addressable = ctx.addressable();

    for sfd in s_idx.dominants() {
        let Some(tfd) = t_idx.dominant(&sfd.label, opts) else {
            continue;
        };
        let result = ctx.with_segment(PathSegment::Field(sfd.label.clone()), |ctx| {
            transfer(ctx, slot, tfd, src, sfd, addressable)
        });
        ctx.absorb(result)?;
    }

    // promoted fields shadowed by a shallower one only pair up by full name
    for label in s_idx.recessive_labels() {
        let targets = t_idx.recessives(label, opts);
        if targets.is_empty() {
            continue;
        }
        for sfd in s_idx.recessives(label, opts) {
            for tfd in targets
                .iter()
                .filter(|tfd| opts.names_match(&tfd.full_name, &sfd.full_name))
            {
                let result = ctx.with_segment(PathSegment::Field(sfd.full_name.clone()), |ctx| {
                    transfer(ctx, slot, tfd, src, sfd, addressable)
                });
                ctx.absorb(result)?;
            }
        }
    }
    Ok(())
}

fn transfer(
    ctx: &mut Context<'_>,
    slot: &mut Value,
    tfd: &FieldDescriptor,
    src: &Value,
    sfd: &FieldDescriptor,
    addressable: bool,
) -> CloneResult<()> {
    match read_field(ctx, src, sfd, addressable)? {
        Some((value, value_addressable)) => write_field(ctx, slot, tfd, &value, value_addressable),
        None => Ok(()),
    }
}

/// The struct declaring the field at `path` below `src`, and whether it is
/// addressable. `None` when a pointer on the way is nil.
fn owner_of<'v>(src: &'v Value, path: &[usize], addressable: bool) -> Option<(Cow<'v, Value>, bool)> {
    let mut owner = Cow::Borrowed(src);
    let mut addressable = addressable;
    for &i in path {
        let field = owner.field(i)?;
        let next = if field.kind() == Kind::Ptr {
            addressable = true;
            field.elem()?
        } else {
            field.clone()
        };
        owner = Cow::Owned(next);
    }
    Some((owner, addressable))
}

/// Read a source field through its getter, or directly when exported.
/// `None` when the field is unreachable, unreadable or omitted as empty.
pub(super) fn read_field(
    ctx: &Context<'_>,
    src: &Value,
    fd: &FieldDescriptor,
    addressable: bool,
) -> CloneResult<Option<(Value, bool)>> {
    let Some((&last, parents)) = fd.index.split_last() else {
        return Ok(None);
    };
    let Some((owner, owner_addressable)) = owner_of(src, parents, addressable) else {
        return Ok(None);
    };

    let getter = fd
        .getter
        .as_ref()
        .filter(|m| m.receiver().callable(owner_addressable));
    let (value, value_addressable) = match getter {
        Some(getter) => {
            let produced = match getter.func() {
                MethodFn::Getter(f) => f(&owner),
                MethodFn::ContextGetter(f) => f(&owner, &ctx.opts().context),
                _ => return Ok(None),
            };
            let value =
                produced.map_err(|e| ctx.callback(format!("getter {}", getter.name()), e))?;
            (value, false)
        }
        None if fd.exported => match owner.field(last) {
            Some(value) => (value.clone(), owner_addressable),
            None => return Ok(None),
        },
        None => return Ok(None),
    };

    if ctx.opts().omit_empty && fd.omit_empty && value.is_zero() {
        return Ok(None);
    }
    Ok(Some((value, value_addressable)))
}

/// Write `value` into the target field, through its setter when one exists.
pub(super) fn write_field(
    ctx: &mut Context<'_>,
    slot: &mut Value,
    fd: &FieldDescriptor,
    value: &Value,
    addressable: bool,
) -> CloneResult<()> {
    let Some((&last, parents)) = fd.index.split_last() else {
        return Ok(());
    };
    with_owner_mut(ctx, slot, parents, |ctx, owner| {
        if let Some(setter) = &fd.setter {
            let Some(param) = setter.param() else {
                return Ok(());
            };
            let mut arg = Value::zero(param);
            ctx.with_addressable(addressable, |ctx| clone_value(ctx, &mut arg, value))?;
            let applied = match setter.func() {
                MethodFn::Setter { f, .. } => f(owner, arg),
                MethodFn::ContextSetter { f, .. } => f(owner, &ctx.opts().context, arg),
                _ => Ok(()),
            };
            return applied.map_err(|e| ctx.callback(format!("setter {}", setter.name()), e));
        }
        if !fd.exported {
            return Ok(());
        }
        let owner_ty = owner.ty().clone();
        let Some(field) = owner.field_mut(last) else {
            return Err(ctx.model(DomainError::NoSuchField {
                type_name: owner_ty.to_string(),
                field: fd.name.clone(),
            }));
        };
        ctx.with_addressable(addressable, |ctx| clone_value(ctx, field, value))
    })
}

/// Run `f` on the struct at `path` below `owner`, allocating nil embedded
/// pointers on the way.
fn with_owner_mut<F>(ctx: &mut Context<'_>, owner: &mut Value, path: &[usize], f: F) -> CloneResult<()>
where
    F: FnOnce(&mut Context<'_>, &mut Value) -> CloneResult<()>,
{
    let Some((&first, rest)) = path.split_first() else {
        return f(ctx, owner);
    };
    let owner_ty = owner.ty().clone();
    let Some(declared) = owner_ty.fields().get(first) else {
        return Err(incomplete(ctx, &owner_ty, "fields"));
    };
    let Some(field) = owner.field_mut(first) else {
        return Err(incomplete(ctx, &owner_ty, "fields"));
    };
    if field.kind() != Kind::Ptr {
        return with_owner_mut(ctx, field, rest, f);
    }
    if field.is_nil() && !declared.is_exported() {
        return Err(ctx.unsupported_value(
            field.ty(),
            "nil",
            format!(
                "cannot allocate unexported embedded pointer {}.{}",
                owner_ty,
                declared.name()
            ),
        ));
    }
    let Some(cell) = field.alloc_cell(false) else {
        return Err(incomplete(ctx, field.ty(), "element type"));
    };
    let mut inner = cell.read().clone();
    let result = with_owner_mut(ctx, &mut inner, rest, f);
    *cell.write() = inner;
    result
}

fn struct_to_map(ctx: &mut Context<'_>, slot: &mut Value, src: &Value) -> CloneResult<()> {
    let (Some(key_ty), Some(elem_ty)) = (slot.ty().key().cloned(), slot.ty().elem().cloned())
    else {
        return Err(incomplete(ctx, slot.ty(), "key and element types"));
    };
    if slot.ensure_map(ctx.deep()).is_none() {
        return Err(incomplete(ctx, slot.ty(), "map storage"));
    }
    let opts = ctx.opts();
    let s_idx = index_of(src.ty(), &opts.source_tag_key, opts);
    let addressable = ctx.addressable();

    for sfd in s_idx.dominants() {
        let result = ctx.with_segment(PathSegment::Field(sfd.label.clone()), |ctx| {
            let Some((value, value_addressable)) = read_field(ctx, src, sfd, addressable)? else {
                return Ok(());
            };
            let mut key = Value::zero(&key_ty);
            clone_value(ctx, &mut key, &Value::string(sfd.label.clone()))?;
            let mut item = Value::zero(&elem_ty);
            ctx.with_addressable(value_addressable, |ctx| clone_value(ctx, &mut item, &value))?;
            slot.map_insert(key, item).map_err(|e| ctx.model(e))
        });
        ctx.absorb(result)?;
    }
    Ok(())
}

/// Widen a struct into `map[string]any`.
fn struct_to_dynamic(ctx: &mut Context<'_>, slot: &mut Value, src: &Value) -> CloneResult<()> {
    let mut map = Value::zero(&Type::map_of(&Type::string(), &Type::any()));
    struct_to_map(ctx, &mut map, src)?;
    slot.set(map).map_err(|e| ctx.model(e))
}
