//! Environment error types

use std::fmt;
use thiserror::Error;

/// Errors raised while building or reading a [`SchemaEnv`](crate::SchemaEnv)
#[derive(Error, Debug)]
pub enum EnvError {
    #[error("no environment source available; caller must supply one explicitly")]
    SourceUnavailable,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("unknown field: {0}")]
    UnknownField(String),

    #[error("field {field} could not be decoded: {source}")]
    Decode {
        field: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("validated record could not be decoded: {0}")]
    DecodeRecord(#[source] serde_json::Error),
}

/// Why a single field was rejected
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IssueCode {
    #[error("required")]
    Required,

    #[error("expected {expected}, received {received}")]
    InvalidType {
        expected: &'static str,
        received: String,
    },

    #[error(
        "invalid enum value; expected one of {}, received '{received}'",
        quote_options(.options)
    )]
    InvalidEnumValue {
        options: Vec<String>,
        received: String,
    },

    #[error("invalid {validation}")]
    InvalidString { validation: &'static str },

    #[error("must contain at least {minimum} character(s)")]
    TooSmall { minimum: usize },

    #[error("must contain at most {maximum} character(s)")]
    TooBig { maximum: usize },

    #[error("{0}")]
    Custom(String),
}

fn quote_options(options: &[String]) -> String {
    options
        .iter()
        .map(|option| format!("'{}'", option))
        .collect::<Vec<_>>()
        .join(" | ")
}

/// A rejected field and the reason
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldIssue {
    pub field: String,
    pub code: IssueCode,
}

impl FieldIssue {
    pub fn new(field: impl Into<String>, code: IssueCode) -> Self {
        Self {
            field: field.into(),
            code,
        }
    }
}

impl fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.code)
    }
}

/// Every issue found in one validation pass
///
/// Validation does not stop at the first bad field, so this always lists
/// everything the caller has to fix.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid environment: {}", join_issues(.issues))]
pub struct ValidationError {
    issues: Vec<FieldIssue>,
}

fn join_issues(issues: &[FieldIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationError {
    pub fn new(issues: Vec<FieldIssue>) -> Self {
        Self { issues }
    }

    pub fn issues(&self) -> &[FieldIssue] {
        &self.issues
    }

    /// Names of the rejected fields, in schema order
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.issues.iter().map(|issue| issue.field.as_str())
    }

    /// The issue reported for `field`, if any
    pub fn issue_for(&self, field: &str) -> Option<&IssueCode> {
        self.issues
            .iter()
            .find(|issue| issue.field == field)
            .map(|issue| &issue.code)
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }
}
