//! Per-type cloners.
//!
//! Every source type gets one [`ClonerFn`], built on first use and cached
//! process-wide. Building a cloner may need the cloner of the same type
//! (`type Tree []Tree`), so a forwarding sentinel is published before the
//! real cloner is built; recursive lookups receive the sentinel.
//!
//! Cloners read the source and write into the target slot. Targets are
//! settled first: pointers are allocated and followed, interfaces holding
//! pointers are followed, and the cloner then works on the leaf slot.

mod custom;
mod hooks;
mod indirect;
mod maps;
mod scalar;
pub(crate) mod set;
mod seq;
mod structs;
mod wellknown;

use std::sync::{Arc, OnceLock};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::debug;

use crate::application::context::Context;
use crate::application::error::{CloneError, CloneResult};
use crate::domain::{DomainError, Kind, Type, TypeId, Value};

/// Stack left before a node switches to a fresh segment. One node costs a
/// dozen frames between two calls to [`clone_with`].
const STACK_RED_ZONE: usize = 128 * 1024;
const STACK_SEGMENT: usize = 2 * 1024 * 1024;

pub(crate) type ClonerFn =
    Arc<dyn Fn(&mut Context<'_>, &mut Value, &Value) -> CloneResult<()> + Send + Sync>;

fn cache() -> &'static DashMap<TypeId, ClonerFn> {
    static CACHE: OnceLock<DashMap<TypeId, ClonerFn>> = OnceLock::new();
    CACHE.get_or_init(DashMap::new)
}

/// The cloner for values of type `ty`.
pub(crate) fn cloner_for(ty: &Type) -> ClonerFn {
    if let Some(found) = cache().get(&ty.id()) {
        return found.clone();
    }

    let slot: Arc<OnceLock<ClonerFn>> = Arc::new(OnceLock::new());
    let sentinel: ClonerFn = {
        let slot = slot.clone();
        let ty = ty.clone();
        Arc::new(move |ctx, tgt, src| match slot.get() {
            Some(real) => real(ctx, tgt, src),
            None => build(&ty)(ctx, tgt, src),
        })
    };
    match cache().entry(ty.id()) {
        Entry::Occupied(existing) => return existing.get().clone(),
        Entry::Vacant(vacant) => {
            vacant.insert(sentinel);
        }
    }

    let real = build(ty);
    let _ = slot.set(real.clone());
    cache().insert(ty.id(), real.clone());
    debug!(type_name = %ty, kind = %ty.kind(), "cloner built");
    real
}

fn build(ty: &Type) -> ClonerFn {
    let base = if ty.well_known().is_some() {
        wellknown::cloner(ty)
    } else {
        match ty.kind() {
            Kind::Struct => structs::cloner(),
            Kind::Map => maps::cloner(ty),
            Kind::Slice | Kind::Array => seq::cloner(ty),
            Kind::Ptr => indirect::ptr_cloner(ty),
            Kind::Interface => indirect::iface_cloner(),
            _ => scalar::cloner(),
        }
    };
    custom::with_clone_to(ty, base)
}

/// Clone `src` into `tgt`: hooks first, then the source type's cloner.
pub(crate) fn clone_value(ctx: &mut Context<'_>, tgt: &mut Value, src: &Value) -> CloneResult<()> {
    let cloner = cloner_for(src.ty());
    clone_with(ctx, tgt, src, &cloner)
}

pub(crate) fn clone_with(
    ctx: &mut Context<'_>,
    tgt: &mut Value,
    src: &Value,
    cloner: &ClonerFn,
) -> CloneResult<()> {
    ctx.enter();
    let result = stacker::maybe_grow(STACK_RED_ZONE, STACK_SEGMENT, || {
        match hooks::intercept(ctx, tgt, src) {
            Some(hooked) => hooked,
            None => cloner(ctx, tgt, src),
        }
    });
    ctx.leave();
    result
}

/// Clone an element whose cloner was resolved ahead of time.
fn clone_item(
    ctx: &mut Context<'_>,
    tgt: &mut Value,
    src: &Value,
    cloner: Option<&ClonerFn>,
) -> CloneResult<()> {
    match cloner {
        Some(cloner) => clone_with(ctx, tgt, src, cloner),
        None => clone_value(ctx, tgt, src),
    }
}

/// Follow `tgt` through pointers and pointer-holding interfaces, then run
/// `f` on the leaf slot. Nil pointers on the way are allocated; with
/// `deep_clone` every pointer gets a fresh pointee.
pub(crate) fn settle<F>(ctx: &mut Context<'_>, tgt: &mut Value, src: &Value, f: F) -> CloneResult<()>
where
    F: FnOnce(&mut Context<'_>, &mut Value) -> CloneResult<()>,
{
    settle_at(ctx, tgt, src, f, false)
}

fn settle_at<F>(
    ctx: &mut Context<'_>,
    tgt: &mut Value,
    src: &Value,
    f: F,
    derefed: bool,
) -> CloneResult<()>
where
    F: FnOnce(&mut Context<'_>, &mut Value) -> CloneResult<()>,
{
    match tgt.kind() {
        Kind::Ptr => {
            let Some(cell) = tgt.alloc_cell(ctx.deep()) else {
                return Err(incomplete(ctx, tgt.ty(), "element type"));
            };
            let mut pointee = cell.read().clone();
            let result = settle_at(ctx, &mut pointee, src, f, true);
            *cell.write() = pointee;
            result
        }
        Kind::Interface if tgt.payload_cell().is_some() => {
            let Some(mut inner) = tgt.payload().cloned() else {
                return f(ctx, tgt);
            };
            let result = settle_at(ctx, &mut inner, src, f, true);
            tgt.set(inner).map_err(|e| ctx.model(e))?;
            result
        }
        _ => {
            if derefed {
                if let Some(hooked) = hooks::intercept(ctx, tgt, src) {
                    return hooked;
                }
            }
            f(ctx, tgt)
        }
    }
}

/// Zero a nillable slot; other kinds are left untouched.
pub(crate) fn write_nil(tgt: &mut Value) {
    if tgt.kind().is_nillable() {
        *tgt = Value::zero(tgt.ty());
    }
}

fn incomplete(ctx: &Context<'_>, ty: &Type, part: &'static str) -> CloneError {
    ctx.model(DomainError::IncompleteType {
        type_name: ty.to_string(),
        part,
    })
}
