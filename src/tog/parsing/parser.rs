//! Parser state and token cursor
//!
//! The parser works on the token list with trivia removed: `ws`, `comment`, `nl` and killed
//! tokens never matter for syntax. What is left is the stream Python's own parser sees.

use super::ParseError;
use crate::tog::ast::{Ast, NodeId, NodeKind, Position};
use crate::tog::token::{Token, TokenKind};

const KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global",
    "if", "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return",
    "try", "while", "with", "yield",
];

pub fn is_keyword(value: &str) -> bool {
    KEYWORDS.contains(&value)
}

pub(crate) type ParseResult<T> = Result<T, ParseError>;

pub(crate) struct Parser<'t> {
    tokens: Vec<&'t Token>,
    pos: usize,
    pub(crate) ast: Ast,
}

impl<'t> Parser<'t> {
    pub(crate) fn new(tokens: &'t [Token]) -> Self {
        let tokens = tokens
            .iter()
            .filter(|t| {
                !matches!(
                    t.kind,
                    TokenKind::Ws | TokenKind::Comment | TokenKind::Nl | TokenKind::Killed
                )
            })
            .collect();
        Parser {
            tokens,
            pos: 0,
            ast: Ast::new(),
        }
    }

    pub(crate) fn finish(self) -> Ast {
        self.ast
    }

    // Cursor

    /// The current token. Past the end, the last token (always the endmarker) is returned.
    pub(crate) fn peek(&self) -> ParseResult<&'t Token> {
        self.peek_at(0)
    }

    pub(crate) fn peek_at(&self, offset: usize) -> ParseResult<&'t Token> {
        let index = (self.pos + offset).min(self.tokens.len().saturating_sub(1));
        self.tokens
            .get(index)
            .copied()
            .ok_or_else(|| ParseError::syntax("empty token list", None))
    }

    pub(crate) fn advance(&mut self) -> ParseResult<&'t Token> {
        let token = self.peek()?;
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        Ok(token)
    }

    pub(crate) fn at_kind(&self, kind: TokenKind) -> bool {
        self.peek().map(|t| t.kind == kind).unwrap_or(false)
    }

    pub(crate) fn at_op(&self, value: &str) -> bool {
        self.peek().map(|t| t.is_op(value)).unwrap_or(false)
    }

    /// True if the current token is the keyword (or name) `value`
    pub(crate) fn at_keyword(&self, value: &str) -> bool {
        self.peek().map(|t| t.is_name(value)).unwrap_or(false)
    }

    pub(crate) fn next_is_keyword(&self, value: &str) -> bool {
        self.peek_at(1).map(|t| t.is_name(value)).unwrap_or(false)
    }

    pub(crate) fn next_is_op(&self, value: &str) -> bool {
        self.peek_at(1).map(|t| t.is_op(value)).unwrap_or(false)
    }

    pub(crate) fn eat_op(&mut self, value: &str) -> ParseResult<bool> {
        if self.at_op(value) {
            self.advance()?;
            return Ok(true);
        }
        Ok(false)
    }

    pub(crate) fn eat_keyword(&mut self, value: &str) -> ParseResult<bool> {
        if self.at_keyword(value) {
            self.advance()?;
            return Ok(true);
        }
        Ok(false)
    }

    pub(crate) fn expect_op(&mut self, value: &str) -> ParseResult<&'t Token> {
        if self.at_op(value) {
            return self.advance();
        }
        Err(self.error(&format!("expected '{}'", value)))
    }

    pub(crate) fn expect_keyword(&mut self, value: &str) -> ParseResult<&'t Token> {
        if self.at_keyword(value) {
            return self.advance();
        }
        Err(self.error(&format!("expected '{}'", value)))
    }

    pub(crate) fn expect_kind(&mut self, kind: TokenKind) -> ParseResult<&'t Token> {
        if self.at_kind(kind) {
            return self.advance();
        }
        Err(self.error(&format!("expected {}", kind)))
    }

    pub(crate) fn expect_identifier(&mut self) -> ParseResult<(String, &'t Token)> {
        let token = self.peek()?;
        if token.kind == TokenKind::Name && !is_keyword(&token.value) {
            self.advance()?;
            return Ok((token.value.clone(), token));
        }
        Err(self.error("expected a name"))
    }

    /// `a.b.c`
    pub(crate) fn dotted_name(&mut self) -> ParseResult<(String, &'t Token)> {
        let (mut name, first) = self.expect_identifier()?;
        while self.at_op(".") {
            self.advance()?;
            let (part, _) = self.expect_identifier()?;
            name.push('.');
            name.push_str(&part);
        }
        Ok((name, first))
    }

    // Tree building

    pub(crate) fn add(&mut self, kind: NodeKind, position: Position) -> NodeId {
        self.ast.add(kind, position)
    }

    pub(crate) fn position_of(token: &Token) -> Position {
        Position::new(token.line_number, token.col)
    }

    pub(crate) fn current_position(&self) -> ParseResult<Position> {
        Ok(Self::position_of(self.peek()?))
    }

    pub(crate) fn position(&self, id: NodeId) -> Position {
        self.ast.position(id)
    }

    /// True if the current token can begin an expression
    pub(crate) fn can_start_expression(&self) -> bool {
        let Ok(token) = self.peek() else {
            return false;
        };
        match token.kind {
            TokenKind::Number | TokenKind::String => true,
            TokenKind::Name => {
                !is_keyword(&token.value)
                    || matches!(
                        token.value.as_str(),
                        "not" | "lambda" | "await" | "None" | "True" | "False"
                    )
            }
            TokenKind::Op => matches!(
                token.value.as_str(),
                "(" | "[" | "{" | "-" | "+" | "~" | "*" | "**" | "..."
            ),
            _ => false,
        }
    }

    pub(crate) fn error(&self, message: &str) -> ParseError {
        ParseError::syntax(message, self.peek().ok())
    }
}
