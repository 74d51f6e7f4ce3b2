//! Prototype Core - Hexagonal Architecture Implementation
//!
//! A reflective clone engine: it copies any runtime value into any target
//! slot, converting between compatible shapes on the way (structs to maps,
//! strings to numbers, timestamps to wrappers) and never following a cycle
//! forever.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │      prototype-adapters (Infrastructure)│
//! │  (time codecs, config loader, JSON)     │
//! └──────────────────┬──────────────────────┘
//!                    │ implements ports / calls
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │         Application Services            │
//! │   (clone, clone_as, Prototype)          │
//! │   Options · Hooks · Cloner cache        │
//! └──────────────────┬──────────────────────┘
//!                    │ walks
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │         Domain Layer (Pure Model)       │
//! │   (Kind, Type, Value, StructTag,        │
//! │    Method, conversion registry)         │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use prototype_core::prelude::*;
//!
//! let user = TypeBuilder::structure("User")
//!     .field("Name", &Type::string())
//!     .tagged_field("Age", &Type::int(), r#"prototype:"age""#)
//!     .build()
//!     .unwrap();
//! let row = TypeBuilder::structure("Row")
//!     .tagged_field("Years", &Type::uint8(), r#"prototype:"age""#)
//!     .field("Name", &Type::string())
//!     .build()
//!     .unwrap();
//!
//! let src = Value::structure(&user, vec![Value::string("ada"), Value::int(36)]).unwrap();
//! let out = clone_as(&row, &src).unwrap();
//! assert_eq!(out.field_by_name("Years"), Some(&Value::uint8(36)));
//! assert_eq!(out.field_by_name("Name"), Some(&Value::string("ada")));
//! ```

pub mod domain;

pub mod application;

pub mod error;

/// The names most callers need.
pub mod prelude {
    pub use crate::application::{
        CloneError, CloneResult, ErrorKind, FromValue, IntoValue, Options, OptionsBuilder,
        Prototype, Reflect, TimeCodec, clone, clone_as, clone_as_with, clone_with,
    };
    pub use crate::domain::{
        FullPath, Kind, Method, PathSegment, Receiver, Time, Type, TypeBuilder, Value, WellKnown,
    };
    pub use crate::error::{PrototypeError, PrototypeResult};
}

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
