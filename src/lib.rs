//! Schema-validated environment variables
//!
//! Declare the variables a program expects as a [`Schema`], validate the
//! process environment (or an explicit table) against it once at startup,
//! and read the coerced values back through a [`SchemaEnv`].
//!
//! ```
//! use schema_env::{boolean_as_string, one_of, string, RawEnv, Schema, SchemaEnv};
//!
//! let schema = Schema::new()
//!     .field("PORT", string())
//!     .field("DEBUG", boolean_as_string())
//!     .field("LOG_LEVEL", one_of(["debug", "info", "warn", "error"]).default("info"));
//!
//! let raw: RawEnv = [("PORT", "3000"), ("DEBUG", "true")].into_iter().collect();
//! let env = SchemaEnv::new(schema, Some(raw)).unwrap();
//!
//! assert_eq!(env.get("PORT"), Some(&"3000".into()));
//! assert_eq!(env.get("DEBUG"), Some(&true.into()));
//! assert_eq!(env.get("LOG_LEVEL"), Some(&"info".into()));
//! ```

// Public modules
pub mod env;
pub mod error;
pub mod schema;
pub mod utils;

// Re-export commonly used types
pub use env::{EnvSource, MapSource, ProcessEnv, RawEnv, SchemaEnv, Unavailable};
pub use error::{EnvError, FieldIssue, IssueCode, ValidationError};
pub use schema::{
    boolean, boolean_as_string, integer, number, one_of, parse_boolean_as_string, string,
    FieldRule, FieldSummary, Record, Schema, StringRule,
};

/// Re-exported so callers can name record values without a direct dependency
pub use serde_json::Value;
