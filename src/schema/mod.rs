//! Environment schemas
//!
//! A [`Schema`] is an ordered set of named [`FieldRule`]s. Validating a raw
//! table against it produces a [`Record`] holding only the declared fields,
//! each coerced to its typed value.

pub mod boolean;
pub mod rule;

pub use boolean::parse_boolean_as_string;
pub use rule::{
    boolean, boolean_as_string, integer, number, one_of, string, FieldRule, Refinement,
    StringRule,
};

use serde::Serialize;
use serde_json::{Map, Value};

use crate::env::RawEnv;
use crate::error::{FieldIssue, ValidationError};

/// Validated record: field name to coerced value
pub type Record = Map<String, Value>;

/// Declared schema for a set of environment variables
#[derive(Debug, Clone, Default)]
pub struct Schema {
    fields: Vec<(String, FieldRule)>,
}

/// One row of [`Schema::describe_fields`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldSummary {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a field, replacing any earlier rule with the same name in place
    pub fn field(mut self, name: impl Into<String>, rule: impl Into<FieldRule>) -> Self {
        self.insert(name.into(), rule.into());
        self
    }

    fn insert(&mut self, name: String, rule: FieldRule) {
        match self.fields.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = rule,
            None => self.fields.push((name, rule)),
        }
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldRule)> {
        self.fields.iter().map(|(name, rule)| (name.as_str(), rule))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn rule(&self, name: &str) -> Option<&FieldRule> {
        self.fields
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, rule)| rule)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.rule(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Run `env` through every field rule
    ///
    /// All fields are checked before returning, so the error lists every
    /// problem at once. Variables the schema does not declare are ignored.
    pub fn validate(&self, env: &RawEnv) -> Result<Record, ValidationError> {
        let mut record = Record::new();
        let mut issues = Vec::new();

        for (name, rule) in &self.fields {
            let input = env.get(name).map(|raw| Value::String(raw.to_string()));
            match rule.parse(input.as_ref()) {
                Ok(Some(value)) => {
                    record.insert(name.clone(), value);
                }
                Ok(None) => {}
                Err(code) => issues.push(FieldIssue::new(name.clone(), code)),
            }
        }

        if issues.is_empty() {
            Ok(record)
        } else {
            Err(ValidationError::new(issues))
        }
    }

    /// A new schema with the fields of both; `other` wins on name clashes
    pub fn extend(&self, other: &Schema) -> Schema {
        let mut merged = self.clone();
        for (name, rule) in &other.fields {
            merged.insert(name.clone(), rule.clone());
        }
        merged
    }

    /// A new schema keeping only `keys`, in this schema's order
    pub fn pick(&self, keys: &[&str]) -> Schema {
        self.filtered(|name| keys.iter().any(|key| *key == name))
    }

    /// A new schema without `keys`
    pub fn omit(&self, keys: &[&str]) -> Schema {
        self.filtered(|name| !keys.iter().any(|key| *key == name))
    }

    fn filtered(&self, keep: impl Fn(&str) -> bool) -> Schema {
        Schema {
            fields: self
                .fields
                .iter()
                .filter(|(name, _)| keep(name.as_str()))
                .cloned()
                .collect(),
        }
    }

    /// A new schema where every field is optional
    pub fn partial(&self) -> Schema {
        Schema {
            fields: self
                .fields
                .iter()
                .map(|(name, rule)| {
                    let rule = if rule.accepts_absent() {
                        rule.clone()
                    } else {
                        rule.clone().optional()
                    };
                    (name.clone(), rule)
                })
                .collect(),
        }
    }

    pub fn describe_fields(&self) -> Vec<FieldSummary> {
        self.fields
            .iter()
            .map(|(name, rule)| FieldSummary {
                name: name.clone(),
                type_name: rule.type_name(),
                required: !rule.accepts_absent(),
                description: rule.description().map(str::to_string),
            })
            .collect()
    }
}
