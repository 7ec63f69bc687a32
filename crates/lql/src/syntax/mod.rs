//! LQL front end: lexer, syntax tree, parser and semantic pre-checks.
//!
//! [`parse_source`] runs the stages in priority order. A lexical error wins
//! over a semantic one, which wins over a syntax error.

pub mod lexer;
pub mod parser;
pub mod precheck;
pub mod token;
pub mod tree;

pub use lexer::{tokenize, Span, Spanned};
pub use token::{Keyword, Token};
pub use tree::Program;

use crate::error::Result;

/// Lex, pre-check and parse `source` into a syntax tree.
pub fn parse_source(source: &str, run_prechecks: bool) -> Result<Program> {
    let tokens = tokenize(source)?;
    if run_prechecks {
        precheck::run(source)?;
    }
    parser::parse_program(source, &tokens)
}
