//! Infrastructure adapters for the prototype clone engine.
//!
//! This crate implements the ports defined in
//! `prototype_core::application::ports` and holds everything that touches
//! files, the environment or foreign formats:
//!
//! - [`time_codec`]: alternative `TimeCodec` implementations
//! - [`config_loader`]: `OptionsConfig` from TOML files and `PROTOTYPE_*`
//!   variables
//! - [`json`]: `serde_json` interop for dynamic values

pub mod config_loader;
pub mod error;
pub mod json;
pub mod time_codec;

pub use config_loader::{ConfigLoader, builder_from_config, load_options};
pub use error::{AdapterError, AdapterResult};
pub use json::{decode, from_json, to_json};
pub use time_codec::{FnTimeCodec, LayoutCodec, UnixMillisCodec, UnixNanosCodec, codec_by_name};
