//! Parsing: lexer, word parser, sub-parsers, and the grammar.

pub mod arithmetic_parser;
pub mod conditional_parser;
pub mod lexer;
#[allow(clippy::module_inception)]
pub mod parser;
pub mod word_parser;

use std::fmt;

pub use arithmetic_parser::parse_arithmetic;
pub use conditional_parser::parse_conditional;
pub use lexer::{Lexer, Token, TokenKind};
pub use parser::Parser;
pub use word_parser::parse_word;

use crate::ast::types::Script;

/// Guard rails against pathological input.
pub const MAX_INPUT_SIZE: usize = 1_000_000;
pub const MAX_PARSE_DEPTH: usize = 200;

/// A parse error is a value: location plus message, never a panic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub message: String,
    pub line: usize,
    pub col: usize,
}

impl ParseError {
    pub fn new(message: impl Into<String>, line: usize, col: usize) -> Self {
        Self { message: message.into(), line, col }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "parse error at {}:{}: {}", self.line, self.col, self.message)
    }
}

impl std::error::Error for ParseError {}

impl From<lexer::LexError> for ParseError {
    fn from(e: lexer::LexError) -> Self {
        Self { message: e.message, line: e.line, col: e.col }
    }
}

/// Parse a full script.
pub fn parse(source: &str) -> Result<Script, ParseError> {
    if source.len() > MAX_INPUT_SIZE {
        return Err(ParseError::new(
            format!("input exceeds {} bytes", MAX_INPUT_SIZE),
            1,
            1,
        ));
    }
    let tokens = Lexer::new(source).tokenize()?;
    Parser::new(tokens).parse_script()
}

/// Tokenize without parsing; the lexer half of the public API.
pub fn tokenize(source: &str) -> Result<Vec<Token>, ParseError> {
    Ok(Lexer::new(source).tokenize()?)
}
