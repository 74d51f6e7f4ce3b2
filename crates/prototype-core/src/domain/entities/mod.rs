pub mod methods;
pub mod tag;
pub mod types;
pub mod value;
pub mod wellknown;

pub use crate::domain::DomainError;
pub use methods::{Ambient, Behaviour, BoxError, Method, MethodFn};
pub use tag::{StructTag, TagSpec};
pub use types::{StructField, Type, TypeBuilder, TypeId};
pub use value::{Cell, MapKey, Time, Value};
