//! Token list builder
//!
//!     Source text becomes a list of [Token]s in two steps:
//!
//!     1. [base_tokenization] runs the logos lexer over the text and produces raw physical
//!        tokens, each with its byte span.
//!     2. The [logical_lines](transformations::logical_lines) transformation turns raw
//!        tokens into Python tokens: logical line breaks, indentation, and `ws` tokens for
//!        everything in between.
//!
//!     The result is lossless. Concatenating the token values gives back the input, and
//!     every token knows its index, line number, column and physical line.
//!
//!     Reading a file goes through [encoding] first, which strips a BOM and honours coding
//!     directives.

pub mod base_tokenization;
pub mod encoding;
pub mod tokens_core;
pub mod transformations;

use crate::tog::token::Token;
use std::fmt;
use transformations::LogicalLines;

pub use encoding::read_file_with_encoding;

/// Errors that can occur while building the token list
#[derive(Debug, Clone, PartialEq)]
pub enum TokenizeError {
    UnterminatedString { line: usize, col: usize },
    InvalidCharacter { ch: char, line: usize, col: usize },
    /// A bracket still open at end of input, where it opened
    UnclosedBracket { bracket: char, line: usize, col: usize },
    InconsistentDedent { line: usize },
    UnknownEncoding(String),
    Decode { encoding: String, reason: String },
    Io(String),
}

impl fmt::Display for TokenizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenizeError::UnterminatedString { line, col } => {
                write!(f, "unterminated string at line {}, column {}", line, col)
            }
            TokenizeError::InvalidCharacter { ch, line, col } => {
                write!(
                    f,
                    "invalid character {:?} at line {}, column {}",
                    ch, line, col
                )
            }
            TokenizeError::UnclosedBracket { bracket, line, col } => write!(
                f,
                "'{}' was never closed (line {}, column {})",
                bracket, line, col
            ),
            TokenizeError::InconsistentDedent { line } => write!(
                f,
                "unindent does not match any outer indentation level (line {})",
                line
            ),
            TokenizeError::UnknownEncoding(name) => write!(f, "unknown encoding: {}", name),
            TokenizeError::Decode { encoding, reason } => {
                write!(f, "cannot decode as {}: {}", encoding, reason)
            }
            TokenizeError::Io(msg) => write!(f, "IO error: {}", msg),
        }
    }
}

impl std::error::Error for TokenizeError {}

/// Build the token list for `contents`
pub fn make_tokens(contents: &str) -> Result<Vec<Token>, TokenizeError> {
    let raw = base_tokenization::tokenize(contents)?;
    LogicalLines::new(contents).transform(&raw)
}

/// 1-based line and 0-based character column of a byte offset
pub(crate) fn line_col(source: &str, offset: usize) -> (usize, usize) {
    let before = &source[..offset];
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
    (line, before[line_start..].chars().count())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tog::token::{detokenize, TokenKind};

    #[test]
    fn test_round_trip() {
        let sources = [
            "",
            "x",
            "def f(a, b=1):\n    return a + b  # sum\n",
            "class A(B, metaclass=M):\n\n    '''Doc.'''\n\n    pass\n",
            "x = [\n    1,\n    2,\n]\n",
            "if a:\n\tb\n",
            "s = (\"a\"\n     'b')\r\n",
            "y = 1 + \\\n    2\n",
        ];
        for source in sources {
            let tokens = make_tokens(source).unwrap();
            assert_eq!(detokenize(&tokens), source, "{:?}", source);
        }
    }

    #[test]
    fn test_last_token_is_endmarker() {
        let tokens = make_tokens("pass\n").unwrap();
        assert_eq!(tokens.last().map(|t| t.kind), Some(TokenKind::Endmarker));
    }

    #[test]
    fn test_indices_are_positions() {
        let tokens = make_tokens("a = (1,\n  2)\n").unwrap();
        for (i, token) in tokens.iter().enumerate() {
            assert_eq!(token.index, i);
        }
    }

    #[test]
    fn test_line_col() {
        assert_eq!(line_col("ab\ncd", 4), (2, 1));
        assert_eq!(line_col("ab", 0), (1, 0));
    }

    #[test]
    fn test_error_display() {
        let err = make_tokens("def f(:\n    pass\n").unwrap_err();
        assert_eq!(err.to_string(), "'(' was never closed (line 1, column 5)");
    }
}
