//! Python parser
//!
//!     A hand-written recursive-descent parser over the token list. It produces the
//!     [Ast](crate::tog::ast::Ast) arena with the node shapes of Python's `ast` module:
//!     parens and commas leave no trace, `elif` becomes a nested `If` in `orelse`, adjacent
//!     string literals become one constant.
//!
//!     Positions follow CPython where the synchronizer depends on them. Call arguments are
//!     re-ordered by position before matching, so every argument records the position of its
//!     first token, `*` and `**` included.
//!
//!     The parser is deliberately independent of the synchronizer: the two only meet through
//!     the token list and the tree, exactly as an external tokenizer and parser would.

mod expressions;
mod parser;
mod statements;

#[cfg(test)]
mod tests;

use crate::tog::ast::Ast;
use crate::tog::lexing::{make_tokens, TokenizeError};
use crate::tog::token::Token;
use parser::Parser;
use std::fmt;

pub use expressions::string_prefix;
pub use parser::is_keyword;

#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    Tokenize(TokenizeError),
    Syntax {
        message: String,
        line: usize,
        col: usize,
        found: String,
    },
}

impl ParseError {
    pub(crate) fn syntax(message: &str, token: Option<&Token>) -> Self {
        match token {
            Some(token) => ParseError::Syntax {
                message: message.to_string(),
                line: token.line_number,
                col: token.col,
                found: token.brief_dump(),
            },
            None => ParseError::Syntax {
                message: message.to_string(),
                line: 0,
                col: 0,
                found: String::new(),
            },
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Tokenize(err) => write!(f, "{}", err),
            ParseError::Syntax {
                message,
                line,
                col,
                found,
            } => write!(
                f,
                "syntax error at line {}, column {}: {} (found {})",
                line, col, message, found
            ),
        }
    }
}

impl std::error::Error for ParseError {}

impl From<TokenizeError> for ParseError {
    fn from(err: TokenizeError) -> Self {
        ParseError::Tokenize(err)
    }
}

/// Tokenize and parse `source`
pub fn parse(source: &str) -> Result<Ast, ParseError> {
    let tokens = make_tokens(source)?;
    parse_tokens(&tokens)
}

/// Parse an existing token list
pub fn parse_tokens(tokens: &[Token]) -> Result<Ast, ParseError> {
    let mut parser = Parser::new(tokens);
    parser.parse_module()?;
    Ok(parser.finish())
}
