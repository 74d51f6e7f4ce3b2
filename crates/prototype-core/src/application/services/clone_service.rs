//! Clone entry points.
//!
//! The entry validates the target, allocates a [`Context`], runs the
//! cloner of the source's runtime type against the target's pointee and
//! writes the pointee back. Partial writes stay in the target on error.

use std::sync::OnceLock;

use tracing::{debug, instrument, warn};

use crate::application::cloners::{clone_value, write_nil};
use crate::application::context::Context;
use crate::application::error::{CloneError, CloneResult};
use crate::application::options::Options;
use crate::domain::{Kind, Type, Value};

fn default_options() -> &'static Options {
    static DEFAULTS: OnceLock<Options> = OnceLock::new();
    DEFAULTS.get_or_init(Options::default)
}

/// Clone `source` into the pointee of `target` with default options.
///
/// ```rust
/// use prototype_core::application::clone;
/// use prototype_core::domain::{Type, Value};
///
/// let target = Value::ptr(Value::zero(&Type::uint8()));
/// clone(&target, &Value::string("42")).unwrap();
/// assert_eq!(target.elem(), Some(Value::uint8(42)));
/// ```
pub fn clone(target: &Value, source: &Value) -> CloneResult<()> {
    clone_with(target, source, default_options())
}

/// Clone `source` into the pointee of `target`.
#[instrument(
    level = "debug",
    skip_all,
    fields(target_type = %target.ty(), source_type = %source.ty())
)]
pub fn clone_with(target: &Value, source: &Value, opts: &Options) -> CloneResult<()> {
    if target.kind() != Kind::Ptr {
        return Err(CloneError::InvalidTarget {
            reason: format!("target must be a pointer, got {}", target.ty()),
        });
    }
    let Some(cell) = target.cell() else {
        return Err(CloneError::InvalidTarget {
            reason: format!("nil pointer of type {}", target.ty()),
        });
    };

    let mut ctx = Context::acquire(opts);
    let mut dest = cell.read().clone();
    let result = if source.kind() == Kind::Interface && source.is_nil() {
        write_nil(&mut dest);
        Ok(())
    } else {
        clone_value(&mut ctx, &mut dest, source)
    };
    *cell.write() = dest;

    let mut errors = ctx.release();
    match result {
        Ok(()) => {}
        Err(CloneError::Aggregate { errors: more }) => errors.extend(more),
        Err(e) => errors.push(e),
    }
    if errors.len() > 1 {
        warn!(errors = errors.len(), "clone finished with errors");
        return Err(CloneError::Aggregate { errors });
    }
    match errors.pop() {
        Some(e) => {
            debug!(error = %e, "clone failed");
            Err(e)
        }
        None => Ok(()),
    }
}

/// Clone `source` into a fresh value of type `ty`.
pub fn clone_as(ty: &Type, source: &Value) -> CloneResult<Value> {
    clone_as_with(ty, source, default_options())
}

pub fn clone_as_with(ty: &Type, source: &Value, opts: &Options) -> CloneResult<Value> {
    let target = Value::ptr(Value::zero(ty));
    clone_with(&target, source, opts)?;
    Ok(target.elem().unwrap_or_else(|| Value::zero(ty)))
}

/// A clone service bound to one set of options.
///
/// ```rust
/// use prototype_core::application::{Options, Prototype};
/// use prototype_core::domain::{Type, Value};
///
/// let prototype = Prototype::new(Options::builder().deep_clone(true).build());
/// let copy = prototype.clone_as(&Type::string(), &Value::int(7)).unwrap();
/// assert_eq!(copy, Value::string("7"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Prototype {
    options: Options,
}

impl Prototype {
    pub fn new(options: Options) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Clone `source` into the pointee of `target`.
    pub fn clone_into(&self, target: &Value, source: &Value) -> CloneResult<()> {
        clone_with(target, source, &self.options)
    }

    pub fn clone_as(&self, ty: &Type, source: &Value) -> CloneResult<Value> {
        clone_as_with(ty, source, &self.options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::error::ErrorKind;

    #[test]
    fn rejects_non_pointer_targets() {
        let err = clone(&Value::int(0), &Value::int(1)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidTarget);
        assert!(err.to_string().contains("got int"));

        let err = clone(&Value::nil_ptr(&Type::int()), &Value::int(1)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidTarget);
        assert!(err.to_string().contains("nil pointer"));
    }

    #[test]
    fn nil_source_clears_nillable_targets() {
        let items = Value::slice(&Type::int(), vec![Value::int(1)]).unwrap();
        let target = Value::ptr(items);
        clone(&target, &Value::nil()).unwrap();
        assert!(target.elem().unwrap().is_nil());

        let target = Value::ptr(Value::int(5));
        clone(&target, &Value::nil()).unwrap();
        assert_eq!(target.elem(), Some(Value::int(5)));
    }

    #[test]
    fn clone_as_builds_a_fresh_value() {
        let v = clone_as(&Type::float64(), &Value::string("1.5")).unwrap();
        assert_eq!(v, Value::float64(1.5));
        let err = clone_as(&Type::int8(), &Value::int(200)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Overflow);
    }

    #[test]
    fn prototype_uses_its_options() {
        let prototype = Prototype::new(Options::builder().interrupt_on_error(false).build());
        assert!(!prototype.options().interrupt_on_error());
        let target = Value::ptr(Value::zero(&Type::uint8()));
        prototype.clone_into(&target, &Value::int(9)).unwrap();
        assert_eq!(target.elem(), Some(Value::uint8(9)));
    }
}
