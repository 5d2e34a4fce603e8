//! Environment access
//!
//! This module holds the raw variable table, the sources it can be read
//! from, and the [`SchemaEnv`] container that validates it once.

pub mod container;
pub mod source;

pub use container::SchemaEnv;
pub use source::{EnvSource, MapSource, ProcessEnv, RawEnv, Unavailable};
