//! Raw environment tables and where they come from
//!
//! The process environment is global state, so the container never reads it
//! directly. It asks an [`EnvSource`] for a snapshot instead, which lets
//! tests substitute a fixed table or simulate an environment that cannot be
//! read at all.

use std::collections::HashMap;
use std::env;

/// Unvalidated variables: name to value, `None` meaning explicitly absent
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawEnv {
    vars: HashMap<String, Option<String>>,
}

impl RawEnv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table that may contain explicitly absent entries
    pub fn from_optional<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, Option<V>)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: entries
                .into_iter()
                .map(|(key, value)| (key.into(), value.map(Into::into)))
                .collect(),
        }
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.vars.insert(key.into(), Some(value.into()));
        self
    }

    /// Record `key` as present in the table but without a value
    pub fn unset(&mut self, key: impl Into<String>) -> &mut Self {
        self.vars.insert(key.into(), None);
        self
    }

    /// The value of `key`; missing and explicitly absent entries both yield `None`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).and_then(|value| value.as_deref())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.vars
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_deref()))
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for RawEnv
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(key, value)| (key.into(), Some(value.into())))
                .collect(),
        }
    }
}

impl From<HashMap<String, String>> for RawEnv {
    fn from(vars: HashMap<String, String>) -> Self {
        vars.into_iter().collect()
    }
}

/// Somewhere an ambient environment table can be read from
pub trait EnvSource {
    /// Short name used in log output
    fn name(&self) -> &'static str;

    /// Current table, or `None` when no environment is accessible
    fn snapshot(&self) -> Option<RawEnv>;
}

/// The real process environment
///
/// Values that are not valid UTF-8 are decoded lossily, so they stay present
/// and reach validation instead of reading as unset. Variables whose name is
/// not valid UTF-8 cannot be declared in a schema and are skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn name(&self) -> &'static str {
        "process"
    }

    fn snapshot(&self) -> Option<RawEnv> {
        Some(
            env::vars_os()
                .filter_map(|(key, value)| {
                    let key = key.into_string().ok()?;
                    Some((key, value.to_string_lossy().into_owned()))
                })
                .collect(),
        )
    }
}

/// A fixed table, mostly for tests
#[derive(Debug, Clone, Default)]
pub struct MapSource(pub RawEnv);

impl EnvSource for MapSource {
    fn name(&self) -> &'static str {
        "map"
    }

    fn snapshot(&self) -> Option<RawEnv> {
        Some(self.0.clone())
    }
}

/// An environment that cannot be read
#[derive(Debug, Clone, Copy, Default)]
pub struct Unavailable;

impl EnvSource for Unavailable {
    fn name(&self) -> &'static str {
        "unavailable"
    }

    fn snapshot(&self) -> Option<RawEnv> {
        None
    }
}
