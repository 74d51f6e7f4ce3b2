//! `clone_to` / `clone_from` behaviours.

use std::sync::Arc;

use tracing::trace;

use super::ClonerFn;
use crate::application::context::Context;
use crate::application::error::CloneResult;
use crate::domain::{Type, Value};

/// Wrap `base` so a source-side `clone_to` takes over when its receiver is
/// callable on the current source.
pub(super) fn with_clone_to(ty: &Type, base: ClonerFn) -> ClonerFn {
    let Some((receiver, f)) = ty.behaviour().clone_to.clone() else {
        return base;
    };
    Arc::new(move |ctx, tgt, src| {
        if !receiver.callable(ctx.addressable()) {
            return base(ctx, tgt, src);
        }
        trace!(path = %ctx.path(), source_type = %src.ty(), %receiver, "clone_to");
        f(src, tgt).map_err(|e| ctx.callback("clone_to", e))
    })
}

/// Hand `src` to the slot's `clone_from`. `Ok(true)` when it took over.
pub(super) fn clone_from(ctx: &mut Context<'_>, slot: &mut Value, src: &Value) -> CloneResult<bool> {
    let Some(f) = slot.ty().behaviour().clone_from.clone() else {
        return Ok(false);
    };
    trace!(path = %ctx.path(), target_type = %slot.ty(), "clone_from");
    f(slot, src).map_err(|e| ctx.callback("clone_from", e))?;
    Ok(true)
}
