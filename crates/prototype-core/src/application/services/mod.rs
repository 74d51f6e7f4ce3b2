//! Application services - the clone entry points.

pub mod clone_service;

pub use clone_service::{Prototype, clone, clone_as, clone_as_with, clone_with};
