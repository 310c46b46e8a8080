//! Compile-time dead-branch elimination for JavaScript.
//!
//! Given a source file and an environment of identifiers with known constant
//! values, [`remove_unreachable_branch`] parses the file, collapses every
//! `if` statement whose test it can decide, splices the leftover blocks and
//! prints the result with an inline source map pointing back at the
//! original text.
//!
//! ```
//! use debranch::{KnownVars, Value, remove_unreachable_branch};
//!
//! let mut known = KnownVars::new();
//! known.define("__DEV__", Value::Bool(false));
//! let out = remove_unreachable_branch(
//!     "if (__DEV__) { log('dev only'); }\nrun();",
//!     "app.js",
//!     &known,
//! )
//! .unwrap();
//! assert!(out.starts_with("run();\n"));
//! ```

use std::fmt;

use once_cell::sync::Lazy;
use tracing::debug;

pub use debranch_parser::ParseError;
pub use debranch_parser::ast::Value;
pub use debranch_transform::KnownVars;

/// Everything that can go wrong in one transform run.
#[derive(Debug)]
pub enum TransformError {
    Parse(ParseError),
}

impl fmt::Display for TransformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransformError::Parse(e) => write!(f, "parse error: {e}"),
        }
    }
}

impl std::error::Error for TransformError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TransformError::Parse(e) => Some(e),
        }
    }
}

impl From<ParseError> for TransformError {
    fn from(e: ParseError) -> Self {
        TransformError::Parse(e)
    }
}

/// The default environment: `__DEV__` is `false`, matching production
/// builds.
pub fn default_known_vars() -> &'static KnownVars {
    static DEFAULT: Lazy<KnownVars> = Lazy::new(|| {
        let mut known = KnownVars::new();
        known.define("__DEV__", Value::Bool(false));
        known
    });
    &DEFAULT
}

/// Strip unreachable branches from `source` under `known` and return the
/// rewritten program with an inline source map comment appended.
///
/// `filename` names the input in parse errors and in the source map.
pub fn remove_unreachable_branch(
    source: &str,
    filename: &str,
    known: &KnownVars,
) -> Result<String, TransformError> {
    let program = debranch_parser::parse(source)?;
    debug!(filename, statements = program.body.len(), "parsed input");

    let program = debranch_transform::eliminate_branches(program, known);
    let program = debranch_transform::flatten_blocks(program);

    let (code, map) = debranch_emitter::generate(&program, source, filename, filename);
    let mut out = code;
    if !out.ends_with('\n') && !out.is_empty() {
        out.push('\n');
    }
    out.push_str(&map.to_inline_comment());
    out.push('\n');
    Ok(out)
}

/// Build a reusable `(filename, source)` transform closure over a fixed
/// environment, for callers that process many files with the same
/// configuration.
pub fn make_transform(
    known: KnownVars,
) -> impl Fn(&str, &str) -> Result<String, TransformError> {
    move |filename, source| remove_unreachable_branch(source, filename, &known)
}
