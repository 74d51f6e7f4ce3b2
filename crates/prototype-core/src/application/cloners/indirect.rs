//! Pointer and interface sources.

use std::sync::Arc;

use super::{ClonerFn, clone_item, clone_value, cloner_for, write_nil};
use crate::application::context::Identity;
use crate::domain::{Kind, Type, Value};

/// A nil pointer is a no-op; otherwise the pointee is cloned into the
/// target as an addressable source.
pub(super) fn ptr_cloner(ty: &Type) -> ClonerFn {
    let elem = ty.elem().map(cloner_for);
    Arc::new(move |ctx, tgt, src| {
        let (Some(id), Some(pointee)) = (src.identity(), src.elem()) else {
            return Ok(());
        };
        let target_type = tgt.ty().clone();
        ctx.guard(Identity::Ptr(id), src, &target_type, |ctx| {
            ctx.with_addressable(true, |ctx| clone_item(ctx, tgt, &pointee, elem.as_ref()))
        })
    })
}

/// Unwrap the payload. A bare interface target receives a fresh value of
/// the payload's own type, so interface to interface keeps concrete types.
pub(super) fn iface_cloner() -> ClonerFn {
    Arc::new(|ctx, tgt, src| {
        let Some(payload) = src.payload() else {
            write_nil(tgt);
            return Ok(());
        };
        if tgt.kind() == Kind::Interface && tgt.payload_cell().is_none() {
            let mut fresh = Value::zero(payload.ty());
            clone_value(ctx, &mut fresh, payload)?;
            return tgt.set(fresh).map_err(|e| ctx.model(e));
        }
        clone_value(ctx, tgt, payload)
    })
}
