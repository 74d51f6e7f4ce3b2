//! Hook interception.

use tracing::trace;

use crate::application::context::Context;
use crate::application::error::CloneResult;
use crate::domain::Value;

/// Run the first matching hook for `src → tgt`, if any.
pub(crate) fn intercept(
    ctx: &mut Context<'_>,
    tgt: &mut Value,
    src: &Value,
) -> Option<CloneResult<()>> {
    let hooks = &ctx.opts().hooks;
    if hooks.is_empty() {
        return None;
    }
    let (level, hook) = hooks.lookup(tgt, src)?;
    trace!(
        path = %ctx.path(),
        %level,
        source_type = %src.ty(),
        target_type = %tgt.ty(),
        "hook matched"
    );
    Some(hook(ctx.path(), tgt, src).map_err(|e| ctx.callback(format!("{level} hook"), e)))
}

/// Last resort for a pair with no built-in conversion.
pub(crate) fn fallback(ctx: &mut Context<'_>, slot: &mut Value, src: &Value) -> CloneResult<()> {
    intercept(ctx, slot, src).unwrap_or_else(|| Err(ctx.unsupported_type(src.ty(), slot.ty())))
}
