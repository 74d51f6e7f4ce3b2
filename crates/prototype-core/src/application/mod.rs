//! Application layer for the clone engine.
//!
//! This layer contains:
//! - **Services**: the `clone` entry points and the [`Prototype`] facade
//! - **Options**: per-invocation configuration and user hooks
//! - **Ports**: traits for collaborators supplied from outside (`TimeCodec`)
//! - **Cloners**: the per-type cloner cache and the node cloners
//! - **Errors**: [`CloneError`] and its classification
//!
//! The type/value model it walks lives in `crate::domain`.

pub mod convert;
pub mod error;
pub mod hooks;
pub mod options;
pub mod ports;
pub mod services;

pub(crate) mod cloners;
pub(crate) mod context;
pub(crate) mod index;

pub use convert::{FromValue, IntoValue, Reflect};
pub use error::{CYCLE_REASON, CloneError, CloneResult, ErrorKind};
pub use hooks::{HookFn, HookLevel, HookTable};
pub use options::{
    DEFAULT_CYCLE_THRESHOLD, DEFAULT_TAG_KEY, NameComparer, Options, OptionsBuilder, OptionsConfig,
};
pub use ports::{DefaultTimeCodec, TimeCodec};
pub use services::{Prototype, clone, clone_as, clone_as_with, clone_with};
