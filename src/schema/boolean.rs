//! Boolean-from-string coercion
//!
//! Environment variables only carry strings, so flags arrive as `"true"` or
//! `"false"`. Unset and empty variables count as `false`. Anything else is
//! most likely a typo and is rejected instead of silently becoming `false`.

use serde_json::Value;

use super::rule::received_kind;
use crate::error::IssueCode;
use crate::utils::preview;

const ACCEPTED: [&str; 3] = ["true", "false", ""];

/// Coerce a raw flag value to a boolean
///
/// | input                         | output  |
/// |-------------------------------|---------|
/// | `"true"`, `true`              | `true`  |
/// | `"false"`, `""`, `false`      | `false` |
/// | `null`, absent                | `false` |
/// | any other string              | error   |
pub fn parse_boolean_as_string(input: Option<&Value>) -> Result<bool, IssueCode> {
    match input {
        None | Some(Value::Null) => Ok(false),
        Some(Value::Bool(b)) => Ok(*b),
        Some(Value::String(s)) if ACCEPTED.contains(&s.as_str()) => Ok(s == "true"),
        Some(Value::String(s)) => Err(IssueCode::InvalidEnumValue {
            options: ACCEPTED.iter().map(|option| option.to_string()).collect(),
            received: preview(s),
        }),
        Some(other) => Err(IssueCode::InvalidType {
            expected: "boolean or 'true'/'false'",
            received: received_kind(other),
        }),
    }
}
