//! Schema-validated environment container

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

use super::source::{EnvSource, ProcessEnv, RawEnv};
use crate::error::EnvError;
use crate::schema::{Record, Schema};

/// Environment variables validated against a [`Schema`]
///
/// Validation happens exactly once, in the constructor. After that the
/// container only serves reads from the stored [`Record`]; nothing can change
/// it.
#[derive(Debug, Clone)]
pub struct SchemaEnv {
    schema: Arc<Schema>,
    record: Record,
}

impl SchemaEnv {
    /// Validate `env`, or the process environment when `env` is `None`
    pub fn new(schema: impl Into<Arc<Schema>>, env: Option<RawEnv>) -> Result<Self, EnvError> {
        Self::with_source(schema, env, &ProcessEnv)
    }

    /// Validate `env`, or a snapshot of `source` when `env` is `None`
    ///
    /// An explicit table always wins, even an empty one. If `source` cannot
    /// provide a table this fails with [`EnvError::SourceUnavailable`].
    pub fn with_source(
        schema: impl Into<Arc<Schema>>,
        env: Option<RawEnv>,
        source: &dyn EnvSource,
    ) -> Result<Self, EnvError> {
        let schema = schema.into();

        let (raw, origin) = match env {
            Some(raw) => (raw, "explicit"),
            None => {
                tracing::trace!(
                    source = source.name(),
                    "No table supplied, reading ambient environment"
                );
                let raw = source.snapshot().ok_or(EnvError::SourceUnavailable)?;
                (raw, source.name())
            }
        };

        let record = schema.validate(&raw)?;

        tracing::debug!(
            source = origin,
            declared = schema.len(),
            stored = record.len(),
            "Environment validated"
        );

        Ok(Self { schema, record })
    }

    /// Stored value of `key`, if the record has one
    ///
    /// # Panics
    ///
    /// Panics if `key` is not declared in the schema. Asking for an
    /// undeclared field is a bug in the caller; use [`SchemaEnv::try_get`]
    /// when keys come from untrusted input.
    pub fn get(&self, key: &str) -> Option<&Value> {
        assert!(
            self.schema.contains(key),
            "`{}` is not declared in the environment schema",
            key
        );
        self.record.get(key)
    }

    /// Stored value of `key`, otherwise `default`
    ///
    /// A stored value always wins, even a falsy one such as `false` or `""`.
    /// Schema-level defaults were applied during validation, so a field with
    /// one never falls through to `default`.
    ///
    /// # Panics
    ///
    /// Panics if `key` is not declared in the schema.
    pub fn get_or(&self, key: &str, default: impl Into<Value>) -> Value {
        match self.get(key) {
            Some(value) => value.clone(),
            None => default.into(),
        }
    }

    /// Stored value of `key`, then `default`, then `None`
    ///
    /// # Panics
    ///
    /// Panics if `key` is not declared in the schema.
    pub fn get_with(&self, key: &str, default: Option<Value>) -> Option<Value> {
        self.get(key).cloned().or(default)
    }

    /// Like [`SchemaEnv::get`], but reports undeclared keys as an error
    pub fn try_get(&self, key: &str) -> Result<Option<&Value>, EnvError> {
        if !self.schema.contains(key) {
            return Err(EnvError::UnknownField(key.to_string()));
        }
        Ok(self.record.get(key))
    }

    /// Decode the stored value of `key` into `T`
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, EnvError> {
        self.try_get(key)?
            .map(|value| {
                serde_json::from_value(value.clone()).map_err(|source| EnvError::Decode {
                    field: key.to_string(),
                    source,
                })
            })
            .transpose()
    }

    /// Decode the whole record into `T`
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, EnvError> {
        serde_json::from_value(Value::Object(self.record.clone())).map_err(EnvError::DecodeRecord)
    }

    /// The validated record
    pub fn get_all(&self) -> &Record {
        &self.record
    }

    pub fn into_record(self) -> Record {
        self.record
    }

    /// The schema this container was validated against
    pub fn get_schema(&self) -> &Schema {
        &self.schema
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::{MapSource, Unavailable};
    use crate::schema::{boolean_as_string, integer, one_of, string};
    use serde::Deserialize;
    use serde_json::json;

    fn schema() -> Schema {
        Schema::new()
            .field("PORT", integer())
            .field("HOST", string().optional())
            .field("DEBUG", boolean_as_string())
            .field("LOG_LEVEL", one_of(["debug", "info", "warn", "error"]).default("info"))
    }

    fn raw(entries: &[(&str, &str)]) -> RawEnv {
        entries.iter().copied().collect()
    }

    #[test]
    fn test_explicit_table_wins_over_source() {
        let source = MapSource(raw(&[("PORT", "1")]));
        let env = SchemaEnv::with_source(schema(), Some(raw(&[("PORT", "2")])), &source).unwrap();
        assert_eq!(env.get("PORT"), Some(&json!(2)));
    }

    #[test]
    fn test_empty_explicit_table_is_still_used() {
        let source = MapSource(raw(&[("PORT", "1")]));
        let err = SchemaEnv::with_source(schema(), Some(RawEnv::new()), &source).unwrap_err();
        assert!(matches!(err, EnvError::Validation(_)));
    }

    #[test]
    fn test_falls_back_to_source() {
        let source = MapSource(raw(&[("PORT", "8080"), ("DEBUG", "true")]));
        let env = SchemaEnv::with_source(schema(), None, &source).unwrap();
        assert_eq!(env.get("PORT"), Some(&json!(8080)));
        assert_eq!(env.get("DEBUG"), Some(&json!(true)));
    }

    #[test]
    fn test_unavailable_source_fails() {
        let err = SchemaEnv::with_source(schema(), None, &Unavailable).unwrap_err();
        assert!(matches!(err, EnvError::SourceUnavailable));
    }

    #[test]
    fn test_stored_value_beats_caller_default() {
        let env = SchemaEnv::new(schema(), Some(raw(&[("PORT", "0")]))).unwrap();

        // Falsy but defined values are returned as-is
        assert_eq!(env.get_or("PORT", 9000), json!(0));
        assert_eq!(env.get_or("DEBUG", true), json!(false));
        // Schema default was stored at construction
        assert_eq!(env.get_or("LOG_LEVEL", "error"), json!("info"));
        // Nothing stored: caller default
        assert_eq!(env.get_or("HOST", "localhost"), json!("localhost"));
    }

    #[test]
    fn test_get_with_precedence() {
        let env = SchemaEnv::new(schema(), Some(raw(&[("PORT", "1"), ("HOST", "")]))).unwrap();

        assert_eq!(env.get_with("HOST", Some(json!("x"))), Some(json!("")));
        assert_eq!(env.get_with("PORT", None), Some(json!(1)));

        let bare = SchemaEnv::new(schema(), Some(raw(&[("PORT", "1")]))).unwrap();
        assert_eq!(bare.get_with("HOST", Some(json!("x"))), Some(json!("x")));
        assert_eq!(bare.get_with("HOST", None), None);
        assert_eq!(bare.get("HOST"), None);
    }

    #[test]
    #[should_panic(expected = "`NOPE` is not declared")]
    fn test_get_undeclared_key_panics() {
        let env = SchemaEnv::new(schema(), Some(raw(&[("PORT", "1")]))).unwrap();
        env.get("NOPE");
    }

    #[test]
    fn test_try_get_undeclared_key() {
        let env = SchemaEnv::new(schema(), Some(raw(&[("PORT", "1")]))).unwrap();
        assert!(matches!(env.try_get("NOPE"), Err(EnvError::UnknownField(key)) if key == "NOPE"));
        assert_eq!(env.try_get("PORT").unwrap(), Some(&json!(1)));
    }

    #[test]
    fn test_get_as() {
        let env = SchemaEnv::new(schema(), Some(raw(&[("PORT", "8443")]))).unwrap();
        assert_eq!(env.get_as::<u16>("PORT").unwrap(), Some(8443));
        assert_eq!(env.get_as::<String>("HOST").unwrap(), None);
        assert!(matches!(
            env.get_as::<bool>("LOG_LEVEL"),
            Err(EnvError::Decode { field, .. }) if field == "LOG_LEVEL"
        ));
    }

    #[test]
    fn test_deserialize_into_struct() {
        #[derive(Debug, Deserialize, PartialEq)]
        #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
        struct Config {
            port: u16,
            host: Option<String>,
            debug: bool,
            log_level: String,
        }

        let table = raw(&[("PORT", "80"), ("DEBUG", "true")]);
        let env = SchemaEnv::new(schema(), Some(table)).unwrap();
        assert_eq!(
            env.deserialize::<Config>().unwrap(),
            Config {
                port: 80,
                host: None,
                debug: true,
                log_level: "info".to_string(),
            }
        );
    }

    #[test]
    fn test_schema_is_shared_not_copied() {
        let shared = Arc::new(schema());
        let env = SchemaEnv::new(Arc::clone(&shared), Some(raw(&[("PORT", "1")]))).unwrap();
        assert!(std::ptr::eq(env.get_schema(), shared.as_ref()));
    }
}
