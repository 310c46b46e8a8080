//! The debranch binary: file or stdin in, transformed JavaScript out.

mod args;

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use args::CliArgs;
use debranch::{KnownVars, Value, default_known_vars, remove_unreachable_branch};

fn main() -> Result<()> {
    init_tracing();
    let args = CliArgs::parse();

    let known = build_known_vars(&args)?;

    let (source, filename) = read_input(args.input.as_deref())?;
    debug!(
        filename = %filename,
        bytes = source.len(),
        defines = known.len(),
        "transforming"
    );

    let output = remove_unreachable_branch(&source, &filename, &known)
        .with_context(|| format!("failed to transform {filename}"))?;

    match &args.output {
        Some(path) => std::fs::write(path, output)
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => print!("{output}"),
    }
    Ok(())
}

/// Initialise the global tracing subscriber.
///
/// Does nothing when neither `DEBRANCH_LOG` nor `RUST_LOG` is set, keeping
/// startup cost at zero for normal usage. Output goes to stderr so it never
/// interferes with the transformed source on stdout.
fn init_tracing() {
    let filter = if let Ok(val) = std::env::var("DEBRANCH_LOG") {
        EnvFilter::builder().parse_lossy(val)
    } else if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        return;
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_known_vars(args: &CliArgs) -> Result<KnownVars> {
    let mut known = if args.no_default_defines {
        KnownVars::new()
    } else {
        default_known_vars().clone()
    };
    for define in &args.defines {
        let (name, value) = parse_define(define)?;
        known.define(name, value);
    }
    Ok(known)
}

/// Parse one `NAME=VALUE` define from the command line.
fn parse_define(define: &str) -> Result<(String, Value)> {
    let Some((name, raw)) = define.split_once('=') else {
        bail!("invalid define '{define}': expected NAME=VALUE");
    };
    let name = name.trim();
    if name.is_empty() {
        bail!("invalid define '{define}': empty name");
    }
    let value = match raw {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        "null" => Value::Null,
        "undefined" => Value::Undefined,
        raw => {
            if let Ok(n) = raw.parse::<f64>() {
                Value::Number(n)
            } else {
                // Quoted or bare text is a string either way.
                let text = raw
                    .strip_prefix('\'')
                    .and_then(|r| r.strip_suffix('\''))
                    .or_else(|| raw.strip_prefix('"').and_then(|r| r.strip_suffix('"')))
                    .unwrap_or(raw);
                Value::Str(text.to_string())
            }
        }
    };
    Ok((name.to_string(), value))
}

fn read_input(input: Option<&Path>) -> Result<(String, String)> {
    match input {
        Some(path) if path.as_os_str() != "-" => {
            let source = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            Ok((source, path.display().to_string()))
        }
        _ => {
            let mut source = String::new();
            std::io::stdin()
                .read_to_string(&mut source)
                .context("failed to read stdin")?;
            Ok((source, "<stdin>".to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defines_parse_into_values() {
        assert_eq!(
            parse_define("__DEV__=false").unwrap(),
            ("__DEV__".to_string(), Value::Bool(false))
        );
        assert_eq!(
            parse_define("N=42").unwrap(),
            ("N".to_string(), Value::Number(42.0))
        );
        assert_eq!(
            parse_define("NOTHING=null").unwrap(),
            ("NOTHING".to_string(), Value::Null)
        );
        assert_eq!(
            parse_define("ENV='production'").unwrap(),
            ("ENV".to_string(), Value::Str("production".to_string()))
        );
        assert_eq!(
            parse_define("ENV=staging").unwrap(),
            ("ENV".to_string(), Value::Str("staging".to_string()))
        );
        // The value may itself contain `=`.
        assert_eq!(
            parse_define("EXPR=a=b").unwrap(),
            ("EXPR".to_string(), Value::Str("a=b".to_string()))
        );
    }

    #[test]
    fn malformed_defines_are_rejected() {
        assert!(parse_define("NOEQUALS").is_err());
        assert!(parse_define("=value").is_err());
    }
}
