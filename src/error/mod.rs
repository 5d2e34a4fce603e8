//! Error types
//!
//! Construction failures are reported through [`EnvError`]; per-field
//! validation problems are collected into a [`ValidationError`].

pub mod types;

pub use types::{EnvError, FieldIssue, IssueCode, ValidationError};
