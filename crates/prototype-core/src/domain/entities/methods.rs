//! Methods and behaviours attached to runtime types.
//!
//! Rust has no runtime method lookup, so a type carries an explicit table:
//! field accessors (getters and setters, optionally taking the ambient
//! context) and a set of optional behaviours the engine recognises
//! (`clone_from`, `clone_to`, text marshalling, `stringer`).

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::domain::entities::types::Type;
use crate::domain::entities::value::Value;
use crate::domain::value_objects::Receiver;

/// Error type returned by user callbacks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Ambient value handed to accessors that accept a context.
pub type Ambient = Arc<dyn Any + Send + Sync>;

pub type GetterFn = Arc<dyn Fn(&Value) -> Result<Value, BoxError> + Send + Sync>;
pub type ContextGetterFn = Arc<dyn Fn(&Value, &Ambient) -> Result<Value, BoxError> + Send + Sync>;
pub type SetterFn = Arc<dyn Fn(&mut Value, Value) -> Result<(), BoxError> + Send + Sync>;
pub type ContextSetterFn =
    Arc<dyn Fn(&mut Value, &Ambient, Value) -> Result<(), BoxError> + Send + Sync>;

/// `clone_from(self, source)`: target-side override.
pub type CloneFromFn = Arc<dyn Fn(&mut Value, &Value) -> Result<(), BoxError> + Send + Sync>;
/// `clone_to(self, target)`: source-side override.
pub type CloneToFn = Arc<dyn Fn(&Value, &mut Value) -> Result<(), BoxError> + Send + Sync>;
pub type TextMarshalFn = Arc<dyn Fn(&Value) -> Result<String, BoxError> + Send + Sync>;
pub type TextUnmarshalFn = Arc<dyn Fn(&mut Value, &str) -> Result<(), BoxError> + Send + Sync>;
pub type StringerFn = Arc<dyn Fn(&Value) -> String + Send + Sync>;

/// The callable part of a method, classified by shape.
#[derive(Clone)]
pub enum MethodFn {
    /// `fn(&self) -> T`
    Getter(GetterFn),
    /// `fn(&self, ctx) -> T`
    ContextGetter(ContextGetterFn),
    /// `fn(&mut self, T)`
    Setter { param: Type, f: SetterFn },
    /// `fn(&mut self, ctx, T)`
    ContextSetter { param: Type, f: ContextSetterFn },
}

/// A named method on a struct type.
#[derive(Clone)]
pub struct Method {
    name: String,
    receiver: Receiver,
    func: MethodFn,
}

impl Method {
    pub fn getter<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Value) -> Result<Value, BoxError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            receiver: Receiver::Value,
            func: MethodFn::Getter(Arc::new(f)),
        }
    }

    pub fn context_getter<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Value, &Ambient) -> Result<Value, BoxError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            receiver: Receiver::Value,
            func: MethodFn::ContextGetter(Arc::new(f)),
        }
    }

    /// Setters default to a pointer receiver.
    pub fn setter<F>(name: impl Into<String>, param: &Type, f: F) -> Self
    where
        F: Fn(&mut Value, Value) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            receiver: Receiver::Pointer,
            func: MethodFn::Setter {
                param: param.clone(),
                f: Arc::new(f),
            },
        }
    }

    pub fn context_setter<F>(name: impl Into<String>, param: &Type, f: F) -> Self
    where
        F: Fn(&mut Value, &Ambient, Value) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            receiver: Receiver::Pointer,
            func: MethodFn::ContextSetter {
                param: param.clone(),
                f: Arc::new(f),
            },
        }
    }

    pub fn with_receiver(mut self, receiver: Receiver) -> Self {
        self.receiver = receiver;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn receiver(&self) -> Receiver {
        self.receiver
    }

    pub fn func(&self) -> &MethodFn {
        &self.func
    }

    pub fn is_getter(&self) -> bool {
        matches!(
            self.func,
            MethodFn::Getter(_) | MethodFn::ContextGetter(_)
        )
    }

    pub fn is_setter(&self) -> bool {
        matches!(
            self.func,
            MethodFn::Setter { .. } | MethodFn::ContextSetter { .. }
        )
    }

    /// The value type a setter accepts.
    pub fn param(&self) -> Option<&Type> {
        match &self.func {
            MethodFn::Setter { param, .. } | MethodFn::ContextSetter { param, .. } => Some(param),
            _ => None,
        }
    }
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shape = match &self.func {
            MethodFn::Getter(_) => "getter",
            MethodFn::ContextGetter(_) => "context getter",
            MethodFn::Setter { .. } => "setter",
            MethodFn::ContextSetter { .. } => "context setter",
        };
        f.debug_struct("Method")
            .field("name", &self.name)
            .field("receiver", &self.receiver)
            .field("shape", &shape)
            .finish()
    }
}

/// Optional behaviours the engine recognises on a type.
#[derive(Clone, Default)]
pub struct Behaviour {
    pub(crate) clone_from: Option<CloneFromFn>,
    pub(crate) clone_to: Option<(Receiver, CloneToFn)>,
    pub(crate) text_marshal: Option<TextMarshalFn>,
    pub(crate) text_unmarshal: Option<TextUnmarshalFn>,
    pub(crate) stringer: Option<StringerFn>,
}

impl Behaviour {
    pub fn has_clone_from(&self) -> bool {
        self.clone_from.is_some()
    }

    pub fn has_clone_to(&self) -> bool {
        self.clone_to.is_some()
    }

    pub fn has_text_marshal(&self) -> bool {
        self.text_marshal.is_some()
    }

    pub fn has_text_unmarshal(&self) -> bool {
        self.text_unmarshal.is_some()
    }

    pub fn has_stringer(&self) -> bool {
        self.stringer.is_some()
    }
}

impl fmt::Debug for Behaviour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Behaviour")
            .field("clone_from", &self.has_clone_from())
            .field("clone_to", &self.clone_to.as_ref().map(|(r, _)| *r))
            .field("text_marshal", &self.has_text_marshal())
            .field("text_unmarshal", &self.has_text_unmarshal())
            .field("stringer", &self.has_stringer())
            .finish()
    }
}
