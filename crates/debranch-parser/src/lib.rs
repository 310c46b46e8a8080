//! JavaScript scanner, parser, AST and rewrite walker for debranch.
//!
//! The parser covers the ES5 expression grammar in full and the statement
//! forms the branch-elimination transform rewrites (blocks, `if`/`else`,
//! declarations, `return`, expression statements). Unsupported statement
//! keywords fail loudly rather than misparse.

pub mod ast;
pub mod error;
pub mod parser;
pub mod scanner;
pub mod walk;

pub use error::ParseError;
pub use parser::parse;
