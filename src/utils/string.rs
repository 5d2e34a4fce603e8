//! String utilities
//!
//! Helpers for quoting raw environment values inside error messages without
//! dumping arbitrarily long input.

/// Maximum number of characters of a rejected value echoed back in an issue
pub const PREVIEW_CHARS: usize = 64;

/// Truncate a string to at most `max_chars` characters
///
/// The cut always lands on a character boundary.
///
/// # Example
/// ```
/// use schema_env::utils::truncate_str;
///
/// assert_eq!(truncate_str("postgres://db", 8), "postgres");
/// assert_eq!(truncate_str("héllo", 2), "hé");
/// assert_eq!(truncate_str("short", 100), "short");
/// ```
pub fn truncate_str(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Truncate a string and append `suffix` if anything was cut
///
/// # Example
/// ```
/// use schema_env::utils::truncate_with_suffix;
///
/// assert_eq!(truncate_with_suffix("LOG_LEVEL", 3, "..."), "LOG...");
/// assert_eq!(truncate_with_suffix("ON", 3, "..."), "ON");
/// ```
pub fn truncate_with_suffix(s: &str, max_chars: usize, suffix: &str) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        format!("{}{}", truncate_str(s, max_chars), suffix)
    }
}

/// Shorten a raw value for display in a validation issue
pub fn preview(s: &str) -> String {
    truncate_with_suffix(s, PREVIEW_CHARS, "...")
}
