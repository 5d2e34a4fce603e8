//! Utility modules

pub mod string;

pub use string::{preview, truncate_str, truncate_with_suffix, PREVIEW_CHARS};
