//! Per-invocation clone state.
//!
//! A [`Context`] threads the options, the recursion depth, the current path
//! and the cycle-detection set through one `clone` call. Its heap buffers are
//! pooled and reused across invocations.

use std::collections::HashSet;
use std::error::Error as StdError;
use std::fmt::Display;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::application::error::{CYCLE_REASON, CloneError, CloneResult};
use crate::application::options::Options;
use crate::domain::{BoxError, DomainError, FullPath, PathSegment, Type, Value};

const POOL_CAPACITY: usize = 32;

/// Address of a shared node, as remembered by the cycle detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Identity {
    Ptr(usize),
    Map(usize),
    /// Base address and length.
    Slice(usize, usize),
}

#[derive(Default)]
struct Scratch {
    seen: HashSet<Identity>,
    path: FullPath,
    errors: Vec<CloneError>,
}

impl Scratch {
    fn reset(&mut self) {
        self.seen.clear();
        self.path.clear();
        self.errors.clear();
    }
}

static POOL: Mutex<Vec<Scratch>> = parking_lot::const_mutex(Vec::new());

pub(crate) struct Context<'o> {
    opts: &'o Options,
    depth: usize,
    addressable: bool,
    scratch: Scratch,
}

impl<'o> Context<'o> {
    pub(crate) fn acquire(opts: &'o Options) -> Self {
        let scratch = POOL.lock().pop().unwrap_or_default();
        Self {
            opts,
            depth: 0,
            addressable: false,
            scratch,
        }
    }

    /// Return the buffers to the pool, handing back the collected errors.
    pub(crate) fn release(mut self) -> Vec<CloneError> {
        let errors = std::mem::take(&mut self.scratch.errors);
        self.scratch.reset();
        let mut pool = POOL.lock();
        if pool.len() < POOL_CAPACITY {
            pool.push(self.scratch);
        }
        errors
    }

    pub(crate) fn opts(&self) -> &'o Options {
        self.opts
    }

    pub(crate) fn deep(&self) -> bool {
        self.opts.deep_clone
    }

    pub(crate) fn path(&self) -> &FullPath {
        &self.scratch.path
    }

    /// Whether the current source node was reached through a pointer or a
    /// slice element.
    pub(crate) fn addressable(&self) -> bool {
        self.addressable
    }

    pub(crate) fn enter(&mut self) {
        self.depth += 1;
    }

    pub(crate) fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    pub(crate) fn with_segment<R>(
        &mut self,
        segment: PathSegment,
        f: impl FnOnce(&mut Self) -> R,
    ) -> R {
        self.scratch.path.push(segment);
        let result = f(self);
        self.scratch.path.pop();
        result
    }

    pub(crate) fn with_addressable<R>(
        &mut self,
        addressable: bool,
        f: impl FnOnce(&mut Self) -> R,
    ) -> R {
        let saved = std::mem::replace(&mut self.addressable, addressable);
        let result = f(self);
        self.addressable = saved;
        result
    }

    /// Run `f` with `id` marked as in progress. Tracking starts once the
    /// depth passes the cycle threshold; re-entering a tracked node fails.
    pub(crate) fn guard(
        &mut self,
        id: Identity,
        src: &Value,
        target_type: &Type,
        f: impl FnOnce(&mut Self) -> CloneResult<()>,
    ) -> CloneResult<()> {
        if self.depth <= self.opts.cycle_threshold {
            return f(self);
        }
        if !self.scratch.seen.insert(id) {
            debug!(path = %self.path(), source_type = %src.ty(), "cycle detected");
            return Err(self.unsupported_value(target_type, format!("<{}>", src.ty()), CYCLE_REASON));
        }
        let result = f(self);
        self.scratch.seen.remove(&id);
        result
    }

    /// Keep going after `result` failed when running best-effort.
    pub(crate) fn absorb(&mut self, result: CloneResult<()>) -> CloneResult<()> {
        match result {
            Err(e) if !self.opts.interrupt_on_error => {
                match e {
                    CloneError::Aggregate { errors } => self.scratch.errors.extend(errors),
                    other => self.scratch.errors.push(other),
                }
                Ok(())
            }
            other => other,
        }
    }

    // ── error constructors ───────────────────────────────────────────────

    pub(crate) fn overflow(&self, ty: &Type, value: impl Display) -> CloneError {
        CloneError::Overflow {
            path: self.path().clone(),
            target_type: ty.to_string(),
            value: value.to_string(),
        }
    }

    pub(crate) fn negative(&self, ty: &Type, value: impl Display) -> CloneError {
        CloneError::NegativeNumber {
            path: self.path().clone(),
            target_type: ty.to_string(),
            value: value.to_string(),
        }
    }

    pub(crate) fn parse<E>(&self, ty: &Type, literal: &str, cause: E) -> CloneError
    where
        E: StdError + Send + Sync + 'static,
    {
        self.parse_boxed(ty, literal, Box::new(cause))
    }

    pub(crate) fn parse_boxed(&self, ty: &Type, literal: &str, cause: BoxError) -> CloneError {
        CloneError::StringParse {
            path: self.path().clone(),
            target_type: ty.to_string(),
            value: literal.to_string(),
            source: Arc::from(cause),
        }
    }

    pub(crate) fn unsupported_type(&self, source: &Type, target: &Type) -> CloneError {
        CloneError::UnsupportedType {
            path: self.path().clone(),
            source_type: source.to_string(),
            target_type: target.to_string(),
        }
    }

    pub(crate) fn unsupported_value(
        &self,
        ty: &Type,
        value: impl Display,
        reason: impl Into<String>,
    ) -> CloneError {
        CloneError::UnsupportedValue {
            path: self.path().clone(),
            target_type: ty.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn callback(&self, origin: impl Into<String>, cause: BoxError) -> CloneError {
        CloneError::Callback {
            path: self.path().clone(),
            origin: origin.into(),
            source: Arc::from(cause),
        }
    }

    pub(crate) fn model(&self, source: DomainError) -> CloneError {
        CloneError::Model {
            path: self.path().clone(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::error::ErrorKind;
    use crate::application::options::OptionsBuilder;

    #[test]
    fn segments_are_scoped() {
        let opts = Options::default();
        let mut ctx = Context::acquire(&opts);
        ctx.with_segment(PathSegment::Field("A".into()), |ctx| {
            ctx.with_segment(PathSegment::Index(1), |ctx| {
                assert_eq!(ctx.path().to_string(), "$.A[1]");
            });
        });
        assert!(ctx.path().is_root());
        ctx.release();
    }

    #[test]
    fn addressability_is_restored() {
        let opts = Options::default();
        let mut ctx = Context::acquire(&opts);
        ctx.with_addressable(true, |ctx| assert!(ctx.addressable()));
        assert!(!ctx.addressable());
        ctx.release();
    }

    #[test]
    fn guard_only_tracks_past_threshold() {
        let opts = OptionsBuilder::new().cycle_threshold(1).build();
        let mut ctx = Context::acquire(&opts);
        let src = Value::int(0);
        let id = Identity::Ptr(0x10);

        // depth 0: untracked, re-entry allowed
        let r = ctx.guard(id, &src, &Type::int(), |ctx| {
            ctx.guard(id, &src, &Type::int(), |_| Ok(()))
        });
        assert!(r.is_ok());

        ctx.enter();
        ctx.enter();
        let r = ctx.guard(id, &src, &Type::int(), |ctx| {
            ctx.guard(id, &src, &Type::int(), |_| Ok(()))
        });
        let err = r.unwrap_err();
        assert!(err.is_cycle());
        assert_eq!(err.kind(), ErrorKind::UnsupportedValue);

        // the identity is dropped on exit
        assert!(ctx.guard(id, &src, &Type::int(), |_| Ok(())).is_ok());
        ctx.release();
    }

    #[test]
    fn absorb_collects_in_best_effort_mode() {
        let opts = OptionsBuilder::new().interrupt_on_error(false).build();
        let mut ctx = Context::acquire(&opts);
        let err = ctx.overflow(&Type::uint8(), 300);
        assert!(ctx.absorb(Err(err)).is_ok());
        let errors = ctx.release();
        assert_eq!(errors.len(), 1);

        let opts = Options::default();
        let mut ctx = Context::acquire(&opts);
        let err = ctx.negative(&Type::uint8(), -1);
        assert!(ctx.absorb(Err(err)).is_err());
        assert!(ctx.release().is_empty());
    }
}
