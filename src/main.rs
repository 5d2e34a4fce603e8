//! schema-env
//!
//! Validate the current process environment against a schema declared on the
//! command line and print the coerced values.

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use schema_env::{
    boolean_as_string, integer, one_of, string, EnvError, FieldRule, Record, Schema, SchemaEnv,
    Value,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::process::ExitCode;
use tracing_subscriber::{
    fmt as tracing_fmt, layer::SubscriberExt, util::SubscriberInitExt, Layer,
};

/// Exit code used when the environment does not match the schema
const EXIT_INVALID: u8 = 2;

/// Output format for the validated record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
enum OutputFormat {
    Json,
    Pretty,
    Env,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Pretty => write!(f, "pretty"),
            OutputFormat::Env => write!(f, "env"),
        }
    }
}

/// schema-env
///
/// Check that the environment provides the variables a program needs.
#[derive(Parser, Debug)]
#[command(name = "schema-env")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Required string variable
    #[arg(long = "require", value_name = "NAME")]
    required: Vec<String>,

    /// Optional string variable, with an optional default
    #[arg(long = "optional", value_name = "NAME[=DEFAULT]")]
    optional: Vec<String>,

    /// Flag variable: "true", "false", empty or unset
    #[arg(long = "bool", value_name = "NAME")]
    flags: Vec<String>,

    /// Variable restricted to a comma-separated list of values
    #[arg(long = "enum", value_name = "NAME=A,B,...")]
    enums: Vec<String>,

    /// Required integer variable
    #[arg(long = "int", value_name = "NAME")]
    integers: Vec<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    /// Print the declared schema instead of validating
    #[arg(long)]
    explain: bool,

    /// Log level: trace, debug, info, warn, error (RUST_LOG takes precedence)
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    init_tracing(&args.log_level, args.log_json);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => match err.downcast_ref::<EnvError>() {
            Some(EnvError::Validation(validation)) => {
                for issue in validation.issues() {
                    eprintln!("{}", issue);
                }
                ExitCode::from(EXIT_INVALID)
            }
            _ => {
                eprintln!("error: {:#}", err);
                ExitCode::FAILURE
            }
        },
    }
}

fn run(args: &Args) -> Result<()> {
    let schema = build_schema(args)?;

    if args.explain {
        let summary = schema.describe_fields();
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    tracing::info!(
        fields = schema.len(),
        format = %args.format,
        "Validating process environment"
    );

    let env = SchemaEnv::new(schema, None)?;
    println!("{}", render(env.get_all(), args.format)?);

    Ok(())
}

/// Turn the command-line declarations into a schema
fn build_schema(args: &Args) -> Result<Schema> {
    let mut schema = Schema::new();

    for name in &args.required {
        schema = schema.field(checked_name(name)?, string());
    }

    for decl in &args.optional {
        let (name, rule): (&str, FieldRule) = match decl.split_once('=') {
            Some((name, default)) => (name, string().default(default)),
            None => (decl.as_str(), string().optional()),
        };
        schema = schema.field(checked_name(name)?, rule);
    }

    for name in &args.flags {
        schema = schema.field(checked_name(name)?, boolean_as_string());
    }

    for decl in &args.enums {
        let (name, options) = decl
            .split_once('=')
            .with_context(|| format!("--enum expects NAME=A,B,... but got '{}'", decl))?;
        let options: Vec<&str> = options
            .split(',')
            .filter(|option| !option.is_empty())
            .collect();
        if options.is_empty() {
            bail!("--enum {} lists no values", name);
        }
        schema = schema.field(checked_name(name)?, one_of(options));
    }

    for name in &args.integers {
        schema = schema.field(checked_name(name)?, integer());
    }

    Ok(schema)
}

fn checked_name(name: &str) -> Result<&str> {
    if name.is_empty() || name.contains('=') {
        bail!("invalid variable name '{}'", name);
    }
    Ok(name)
}

fn render(record: &Record, format: OutputFormat) -> Result<String> {
    let rendered = match format {
        OutputFormat::Json => serde_json::to_string(record)?,
        OutputFormat::Pretty => serde_json::to_string_pretty(record)?,
        OutputFormat::Env => record
            .iter()
            .map(|(key, value)| match value {
                Value::String(s) => format!("{}={}", key, quote_env_value(s)),
                other => format!("{}={}", key, other),
            })
            .collect::<Vec<_>>()
            .join("\n"),
    };
    Ok(rendered)
}

/// Quote a value the way a `.env` file expects
///
/// Plain values are left bare; anything else is double-quoted with `\`, `"`,
/// `$` and line breaks escaped.
fn quote_env_value(value: &str) -> String {
    let plain = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "_-./:@,+".contains(c));
    if plain {
        return value.to_string();
    }

    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        match c {
            '\\' => quoted.push_str("\\\\"),
            '"' => quoted.push_str("\\\""),
            '$' => quoted.push_str("\\$"),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            other => quoted.push(other),
        }
    }
    quoted.push('"');
    quoted
}

/// Initialize tracing on stderr so stdout only carries the record
fn init_tracing(log_level: &str, json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    let registry = tracing_subscriber::registry();

    if json {
        let layer = tracing_fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_filter(filter);
        registry.with(layer).init();
    } else {
        let layer = tracing_fmt::layer()
            .with_writer(std::io::stderr)
            .with_filter(filter);
        registry.with(layer).init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schema_env::{IssueCode, RawEnv};
    use serde_json::json;

    fn parse(argv: &[&str]) -> Args {
        Args::parse_from(std::iter::once("schema-env").chain(argv.iter().copied()))
    }

    #[test]
    fn test_build_schema_from_flags() {
        let args = parse(&[
            "--require",
            "HOST",
            "--optional",
            "PORT=8000",
            "--optional",
            "TZ",
            "--bool",
            "DEBUG",
            "--enum",
            "LOG_LEVEL=debug,info",
            "--int",
            "WORKERS",
        ]);
        let schema = build_schema(&args).unwrap();

        assert_eq!(
            schema.keys().collect::<Vec<_>>(),
            vec!["HOST", "PORT", "TZ", "DEBUG", "LOG_LEVEL", "WORKERS"]
        );

        let raw: RawEnv = [("HOST", "db"), ("WORKERS", "4"), ("LOG_LEVEL", "info")]
            .into_iter()
            .collect();
        let env = SchemaEnv::new(schema, Some(raw)).unwrap();
        assert_eq!(
            Value::Object(env.get_all().clone()),
            json!({"HOST": "db", "PORT": "8000", "DEBUG": false, "LOG_LEVEL": "info", "WORKERS": 4})
        );
    }

    #[test]
    fn test_explain_and_log_json_flags() {
        let args = parse(&["--explain", "--log-json", "--require", "HOST", "--bool", "DEBUG"]);
        assert!(args.explain);
        assert!(args.log_json);

        let summary = build_schema(&args).unwrap().describe_fields();
        assert_eq!(
            serde_json::to_value(&summary).unwrap(),
            json!([
                {"name": "HOST", "type": "string", "required": true},
                {"name": "DEBUG", "type": "boolean-as-string", "required": false}
            ])
        );

        let quiet = parse(&[]);
        assert!(!quiet.explain);
        assert!(!quiet.log_json);
    }

    #[test]
    fn test_enum_without_values_is_rejected() {
        assert!(build_schema(&parse(&["--enum", "MODE="])).is_err());
        assert!(build_schema(&parse(&["--enum", "MODE"])).is_err());
    }

    #[test]
    fn test_invalid_names_are_rejected() {
        assert!(build_schema(&parse(&["--require", ""])).is_err());
        assert!(build_schema(&parse(&["--optional", "=x"])).is_err());
    }

    #[test]
    fn test_validation_error_survives_anyhow() {
        let schema = build_schema(&parse(&["--int", "WORKERS"])).unwrap();
        let err: anyhow::Error = SchemaEnv::new(schema, Some(RawEnv::new())).unwrap_err().into();

        match err.downcast_ref::<EnvError>() {
            Some(EnvError::Validation(validation)) => {
                assert_eq!(validation.issue_for("WORKERS"), Some(&IssueCode::Required));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_render_env_quotes_special_values() {
        let mut record = Record::new();
        record.insert("BANNER".to_string(), json!("hello\nworld"));
        record.insert("DSN".to_string(), json!("user=admin pass=\"x\""));
        record.insert("EMPTY".to_string(), json!(""));
        record.insert("PRICE".to_string(), json!("$5"));

        assert_eq!(
            render(&record, OutputFormat::Env).unwrap(),
            [
                r#"BANNER="hello\nworld""#,
                r#"DSN="user=admin pass=\"x\"""#,
                r#"EMPTY="""#,
                r#"PRICE="\$5""#,
            ]
            .join("\n")
        );
    }

    #[test]
    fn test_render_env_format() {
        let mut record = Record::new();
        record.insert("DEBUG".to_string(), json!(true));
        record.insert("HOST".to_string(), json!("localhost"));

        assert_eq!(
            render(&record, OutputFormat::Env).unwrap(),
            "DEBUG=true\nHOST=localhost"
        );
        assert_eq!(
            render(&record, OutputFormat::Json).unwrap(),
            r#"{"DEBUG":true,"HOST":"localhost"}"#
        );
    }
}
