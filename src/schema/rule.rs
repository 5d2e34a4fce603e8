//! Field rules
//!
//! A [`FieldRule`] validates and coerces the value of a single variable.
//! Rules are built from the constructor functions in this module and then
//! wrapped with combinators such as [`FieldRule::optional`] and
//! [`FieldRule::default`].

use serde_json::{Number, Value};
use std::fmt;
use std::sync::Arc;
use validator::{ValidateEmail, ValidateUrl};

use super::boolean::parse_boolean_as_string;
use crate::error::IssueCode;
use crate::utils::preview;

/// Predicate applied by [`FieldRule::refine`]
pub type Refinement = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StringCheck {
    MinLen(usize),
    MaxLen(usize),
    Url,
    Email,
}

/// Rules that check a present value directly
#[derive(Debug, Clone)]
enum Leaf {
    String(Vec<StringCheck>),
    OneOf(Vec<String>),
    Boolean,
    Number,
    Integer,
}

#[derive(Clone)]
enum RuleKind {
    Leaf(Leaf),
    BooleanAsString,
    Optional(Box<FieldRule>),
    Default(Box<FieldRule>, Value),
    Refine(Box<FieldRule>, String, Refinement),
}

/// Validation and coercion rule for one schema field
#[derive(Clone)]
pub struct FieldRule {
    kind: RuleKind,
    description: Option<String>,
}

/// A string rule that still accepts string refinements
///
/// Converts into a [`FieldRule`] wherever one is expected.
#[derive(Debug, Clone)]
pub struct StringRule {
    checks: Vec<StringCheck>,
}

/// Any string value
pub fn string() -> StringRule {
    StringRule { checks: Vec::new() }
}

/// A string equal to one of `options`
pub fn one_of<I, S>(options: I) -> FieldRule
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    FieldRule::new(RuleKind::Leaf(Leaf::OneOf(
        options.into_iter().map(Into::into).collect(),
    )))
}

/// A real boolean; the string `"true"` is rejected
pub fn boolean() -> FieldRule {
    FieldRule::new(RuleKind::Leaf(Leaf::Boolean))
}

/// `"true"`/`"false"`/`""`, a boolean, null or absent, coerced to a boolean
///
/// See [`parse_boolean_as_string`] for the exact mapping.
pub fn boolean_as_string() -> FieldRule {
    FieldRule::new(RuleKind::BooleanAsString)
}

/// A finite number, or a string that parses to one
pub fn number() -> FieldRule {
    FieldRule::new(RuleKind::Leaf(Leaf::Number))
}

/// An integral number, or a string that parses to an `i64`
pub fn integer() -> FieldRule {
    FieldRule::new(RuleKind::Leaf(Leaf::Integer))
}

impl StringRule {
    pub fn min_len(mut self, minimum: usize) -> Self {
        self.checks.push(StringCheck::MinLen(minimum));
        self
    }

    pub fn max_len(mut self, maximum: usize) -> Self {
        self.checks.push(StringCheck::MaxLen(maximum));
        self
    }

    /// Shorthand for `min_len(1)`
    pub fn non_empty(self) -> Self {
        self.min_len(1)
    }

    pub fn url(mut self) -> Self {
        self.checks.push(StringCheck::Url);
        self
    }

    pub fn email(mut self) -> Self {
        self.checks.push(StringCheck::Email);
        self
    }

    pub fn optional(self) -> FieldRule {
        FieldRule::from(self).optional()
    }

    pub fn default(self, value: impl Into<Value>) -> FieldRule {
        FieldRule::from(self).default(value)
    }

    pub fn refine<F>(self, message: impl Into<String>, predicate: F) -> FieldRule
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        FieldRule::from(self).refine(message, predicate)
    }

    pub fn describe(self, text: impl Into<String>) -> FieldRule {
        FieldRule::from(self).describe(text)
    }
}

impl From<StringRule> for FieldRule {
    fn from(rule: StringRule) -> Self {
        FieldRule::new(RuleKind::Leaf(Leaf::String(rule.checks)))
    }
}

impl FieldRule {
    fn new(kind: RuleKind) -> Self {
        Self {
            kind,
            description: None,
        }
    }

    /// Accept an absent value, producing no entry in the record
    pub fn optional(self) -> Self {
        Self::new(RuleKind::Optional(Box::new(self)))
    }

    /// Substitute `value` when the variable is absent
    ///
    /// The substitute still runs through this rule, so it is coerced the same
    /// way a raw value would be. An explicit null is not treated as absent.
    pub fn default(self, value: impl Into<Value>) -> Self {
        Self::new(RuleKind::Default(Box::new(self), value.into()))
    }

    /// Reject coerced values for which `predicate` returns false
    pub fn refine<F>(self, message: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Self::new(RuleKind::Refine(
            Box::new(self),
            message.into(),
            Arc::new(predicate),
        ))
    }

    /// Attach a human-readable description
    pub fn describe(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }

    pub fn description(&self) -> Option<&str> {
        match (&self.description, &self.kind) {
            (Some(text), _) => Some(text.as_str()),
            (None, RuleKind::Optional(inner))
            | (None, RuleKind::Default(inner, _))
            | (None, RuleKind::Refine(inner, _, _)) => inner.description(),
            (None, _) => None,
        }
    }

    /// Whether an absent value is accepted without an issue
    pub fn accepts_absent(&self) -> bool {
        match &self.kind {
            RuleKind::Optional(_) | RuleKind::Default(_, _) | RuleKind::BooleanAsString => true,
            RuleKind::Refine(inner, _, _) => inner.accepts_absent(),
            _ => false,
        }
    }

    /// Short name of the declared shape, e.g. `optional<string>`
    pub fn type_name(&self) -> String {
        match &self.kind {
            RuleKind::Leaf(leaf) => leaf.type_name(),
            RuleKind::BooleanAsString => "boolean-as-string".to_string(),
            RuleKind::Optional(inner) => format!("optional<{}>", inner.type_name()),
            RuleKind::Default(inner, value) => format!("{} = {}", inner.type_name(), value),
            RuleKind::Refine(inner, _, _) => inner.type_name(),
        }
    }

    /// Validate and coerce one value
    ///
    /// `None` as input means the variable is absent. `Ok(None)` means the
    /// field legitimately has no value and is left out of the record.
    pub fn parse(&self, input: Option<&Value>) -> Result<Option<Value>, IssueCode> {
        match &self.kind {
            RuleKind::Optional(inner) => match input {
                None => Ok(None),
                Some(_) => inner.parse(input),
            },
            RuleKind::Default(inner, fallback) => inner.parse(Some(input.unwrap_or(fallback))),
            RuleKind::Refine(inner, message, predicate) => {
                let parsed = inner.parse(input)?;
                match &parsed {
                    Some(value) if !predicate(value) => Err(IssueCode::Custom(message.clone())),
                    _ => Ok(parsed),
                }
            }
            RuleKind::BooleanAsString => {
                parse_boolean_as_string(input).map(|b| Some(Value::Bool(b)))
            }
            RuleKind::Leaf(leaf) => {
                let value = input.ok_or(IssueCode::Required)?;
                leaf.parse(value).map(Some)
            }
        }
    }
}

impl Leaf {
    fn type_name(&self) -> String {
        match self {
            Leaf::String(_) => "string".to_string(),
            Leaf::OneOf(options) => format!("enum[{}]", options.join(",")),
            Leaf::Boolean => "boolean".to_string(),
            Leaf::Number => "number".to_string(),
            Leaf::Integer => "integer".to_string(),
        }
    }

    fn parse(&self, value: &Value) -> Result<Value, IssueCode> {
        match (self, value) {
            (Leaf::String(checks), Value::String(s)) => {
                for check in checks {
                    apply_string_check(*check, s)?;
                }
                Ok(value.clone())
            }
            (Leaf::String(_), other) => Err(invalid_type("string", other)),

            (Leaf::OneOf(options), Value::String(s)) => {
                if options.iter().any(|option| option == s) {
                    Ok(value.clone())
                } else {
                    Err(IssueCode::InvalidEnumValue {
                        options: options.clone(),
                        received: preview(s),
                    })
                }
            }
            (Leaf::OneOf(_), other) => Err(invalid_type("enum", other)),

            (Leaf::Boolean, Value::Bool(_)) => Ok(value.clone()),
            (Leaf::Boolean, other) => Err(invalid_type("boolean", other)),

            (Leaf::Number, Value::Number(_)) => Ok(value.clone()),
            (Leaf::Number, Value::String(s)) => s
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number)
                .ok_or_else(|| invalid_type("number", value)),
            (Leaf::Number, other) => Err(invalid_type("number", other)),

            (Leaf::Integer, Value::Number(n)) if n.is_i64() => Ok(value.clone()),
            (Leaf::Integer, Value::String(s)) => s
                .trim()
                .parse::<i64>()
                .map(Value::from)
                .map_err(|_| invalid_type("integer", value)),
            (Leaf::Integer, other) => Err(invalid_type("integer", other)),
        }
    }
}

impl fmt::Debug for FieldRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldRule")
            .field("type", &self.type_name())
            .field("description", &self.description())
            .finish()
    }
}

fn apply_string_check(check: StringCheck, s: &str) -> Result<(), IssueCode> {
    match check {
        StringCheck::MinLen(minimum) if s.chars().count() < minimum => {
            Err(IssueCode::TooSmall { minimum })
        }
        StringCheck::MaxLen(maximum) if s.chars().count() > maximum => {
            Err(IssueCode::TooBig { maximum })
        }
        StringCheck::Url if !s.to_string().validate_url() => {
            Err(IssueCode::InvalidString { validation: "url" })
        }
        StringCheck::Email if !s.to_string().validate_email() => {
            Err(IssueCode::InvalidString { validation: "email" })
        }
        _ => Ok(()),
    }
}

/// Describe what kind of value was received, for type mismatch issues
pub(crate) fn received_kind(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(_) => "boolean".to_string(),
        Value::Number(_) => "number".to_string(),
        Value::String(s) => format!("string '{}'", preview(s)),
        Value::Array(_) => "array".to_string(),
        Value::Object(_) => "object".to_string(),
    }
}

fn invalid_type(expected: &'static str, value: &Value) -> IssueCode {
    IssueCode::InvalidType {
        expected,
        received: received_kind(value),
    }
}
