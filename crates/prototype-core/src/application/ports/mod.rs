//! Application ports (traits) for external dependencies.
//!
//! In hexagonal architecture, ports define interfaces that the application
//! needs from the outside world. Adapters in `prototype-adapters` implement these.
//!
//! ## Port Types
//!
//! - **Driven (Output) Ports**: Called by application, implemented by infrastructure
//!   - `TimeCodec`: timestamp ↔ integer/text conversions
//!
//! - **Driving (Input) Ports**: Called by external world, implemented by application
//!   - (the `clone` entry points in `services`)

pub mod output;

pub use output::{DefaultTimeCodec, TimeCodec};
