//! Core token definitions

use crate::tog::ast::NodeId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// The kind of a token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Name,
    Number,
    String,
    Op,
    Comment,
    Newline,
    Nl,
    Indent,
    Dedent,
    Ws,
    Endmarker,
    Killed,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Name => "name",
            TokenKind::Number => "number",
            TokenKind::String => "string",
            TokenKind::Op => "op",
            TokenKind::Comment => "comment",
            TokenKind::Newline => "newline",
            TokenKind::Nl => "nl",
            TokenKind::Indent => "indent",
            TokenKind::Dedent => "dedent",
            TokenKind::Ws => "ws",
            TokenKind::Endmarker => "endmarker",
            TokenKind::Killed => "killed",
        }
    }

    /// Line breaks of either kind
    pub fn is_line_break(&self) -> bool {
        matches!(self, TokenKind::Newline | TokenKind::Nl)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// True if a token of this kind and value must be matched by the synchronizer.
///
/// Commas, semicolons and parens are never significant: the tree does not record them, so
/// the synchronizer can only skip over them.
pub fn is_significant(kind: TokenKind, value: &str) -> bool {
    match kind {
        TokenKind::Name | TokenKind::Number | TokenKind::String | TokenKind::Endmarker => true,
        TokenKind::Op => !matches!(value, "," | ";" | "(" | ")"),
        _ => false,
    }
}

/// A lexical token plus the links added by later passes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    /// Position in the token list
    pub index: usize,
    /// 1-based
    pub line_number: usize,
    /// 0-based, in characters
    pub col: usize,
    /// The physical line the token starts on, shared by every token of that line
    pub line: Arc<str>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node: Option<NodeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matching_paren: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statement_node: Option<NodeId>,
}

impl Token {
    pub fn new(kind: TokenKind, value: impl Into<String>) -> Self {
        Token {
            kind,
            value: value.into(),
            index: 0,
            line_number: 0,
            col: 0,
            line: Arc::from(""),
            node: None,
            matching_paren: None,
            statement_node: None,
        }
    }

    pub fn is_significant(&self) -> bool {
        is_significant(self.kind, &self.value)
    }

    pub fn is_op(&self, value: &str) -> bool {
        self.kind == TokenKind::Op && self.value == value
    }

    pub fn is_name(&self, value: &str) -> bool {
        self.kind == TokenKind::Name && self.value == value
    }

    /// Comments, blanks and line breaks
    pub fn is_trivia(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::Comment | TokenKind::Ws | TokenKind::Nl | TokenKind::Newline
        )
    }

    /// A one-line summary, used by error messages and dumps
    pub fn brief_dump(&self) -> String {
        let value = super::formatting::show_val(&self.value);
        match self.kind {
            TokenKind::Name | TokenKind::Op | TokenKind::Number | TokenKind::String => {
                format!("{}.{} {}", self.index, self.line_number, value)
            }
            _ => format!("{}.{} {}", self.index, self.line_number, self.kind),
        }
    }

    /// The full token, links included
    pub fn dump(&self) -> String {
        let node = match self.node {
            Some(id) => id.to_string(),
            None => "-".to_string(),
        };
        let paren = match self.matching_paren {
            Some(index) => format!(" paren={}", index),
            None => String::new(),
        };
        format!(
            "{:>4} {:>4}:{:<3} {:<9} {:<12} node={}{}",
            self.index,
            self.line_number,
            self.col,
            self.kind,
            super::formatting::show_val(&self.value),
            node,
            paren
        )
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, super::formatting::show_val(&self.value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_significant_kinds() {
        assert!(is_significant(TokenKind::Name, "x"));
        assert!(is_significant(TokenKind::Number, "1"));
        assert!(is_significant(TokenKind::String, "'a'"));
        assert!(is_significant(TokenKind::Endmarker, ""));
        assert!(!is_significant(TokenKind::Comment, "# c"));
        assert!(!is_significant(TokenKind::Newline, "\n"));
        assert!(!is_significant(TokenKind::Ws, " "));
        assert!(!is_significant(TokenKind::Indent, "    "));
    }

    #[test]
    fn test_punctuation_is_not_significant() {
        for value in [",", ";", "(", ")"] {
            assert!(!is_significant(TokenKind::Op, value), "{}", value);
        }
        for value in ["[", "]", "{", "}", ".", ":", "=", "**"] {
            assert!(is_significant(TokenKind::Op, value), "{}", value);
        }
    }

    #[test]
    fn test_kind_display_is_lowercase() {
        assert_eq!(TokenKind::Endmarker.to_string(), "endmarker");
        assert_eq!(TokenKind::Nl.to_string(), "nl");
    }

    #[test]
    fn test_brief_dump() {
        let mut token = Token::new(TokenKind::Name, "spam");
        token.index = 3;
        token.line_number = 2;
        assert_eq!(token.brief_dump(), "3.2 spam");

        let mut newline = Token::new(TokenKind::Newline, "\n");
        newline.index = 4;
        newline.line_number = 2;
        assert_eq!(newline.brief_dump(), "4.2 newline");
    }

    #[test]
    fn test_new_token_is_unlinked() {
        let token = Token::new(TokenKind::Op, "(");
        assert_eq!(token.node, None);
        assert_eq!(token.matching_paren, None);
        assert_eq!(token.statement_node, None);
    }
}
