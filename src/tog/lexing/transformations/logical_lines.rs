//! Logical line transformation
//!
//! Turns raw physical tokens into the token list Python's tokenizer would produce, with the
//! inter-token text kept as `ws` tokens.
//!
//! # Algorithm
//!
//! 1. Track the open brackets. Inside brackets every line break is `nl` and indentation is
//!    meaningless.
//! 2. At the start of each logical line (no open brackets, after a `newline`), look at the first
//!    token after the leading whitespace:
//!    - a line break: blank line, emit `nl`
//!    - a comment: comment-only line, emit the comment and then `nl`
//!    - anything else: compare the indentation column with the indent stack. A deeper line
//!      emits `indent` holding the leading whitespace, a shallower one emits `dedent` for
//!      every level popped. Popping to a column that is not on the stack is an error.
//! 3. A line break outside brackets that ends a line with content is `newline`.
//! 4. At end of input: an unclosed bracket is an error reported where the bracket opened;
//!    an unfinished logical line gets an empty `newline`; remaining indents become
//!    `dedent`s; `endmarker` comes last.
//!
//! Columns are measured the way Python does: a tab advances to the next multiple of 8 and a
//! form feed resets the column.

use crate::tog::lexing::tokens_core::RawToken;
use crate::tog::lexing::TokenizeError;
use crate::tog::token::{Token, TokenKind};
use std::sync::Arc;

pub struct LogicalLines<'a> {
    source: &'a str,
    /// Text of every physical line, shared by the tokens on it
    lines: Vec<Arc<str>>,
    tokens: Vec<Token>,
    /// Current line number, 1-based
    line: usize,
    /// Byte offset of the start of the current line
    line_start: usize,
    /// Byte offset of the next unconsumed source byte
    offset: usize,
    /// Open brackets with their line and column
    brackets: Vec<(char, usize, usize)>,
    indents: Vec<usize>,
    at_line_start: bool,
    line_has_content: bool,
}

impl<'a> LogicalLines<'a> {
    pub fn new(source: &'a str) -> Self {
        LogicalLines {
            source,
            lines: physical_lines(source),
            tokens: Vec::new(),
            line: 1,
            line_start: 0,
            offset: 0,
            brackets: Vec::new(),
            indents: vec![0],
            at_line_start: true,
            line_has_content: false,
        }
    }

    /// Run the transformation over the raw tokens of `source`
    pub fn transform(
        mut self,
        raw: &[(RawToken, logos::Span)],
    ) -> Result<Vec<Token>, TokenizeError> {
        let mut i = 0;
        while i < raw.len() {
            if self.at_line_start && self.brackets.is_empty() {
                i = self.start_line(raw, i)?;
                continue;
            }
            let (kind, span) = &raw[i];
            self.process(*kind, span.clone());
            i += 1;
        }
        self.finish()?;
        Ok(self.tokens)
    }

    /// Handle the start of a logical line, returns the index of the next raw token to process
    fn start_line(
        &mut self,
        raw: &[(RawToken, logos::Span)],
        mut i: usize,
    ) -> Result<usize, TokenizeError> {
        let mut leading: Option<logos::Span> = None;
        if let Some((RawToken::Whitespace, span)) = raw.get(i) {
            leading = Some(span.clone());
            i += 1;
        }

        match raw.get(i) {
            None => {
                if let Some(span) = leading {
                    self.emit_ws(span);
                }
                Ok(i)
            }
            Some((RawToken::Newline, span)) => {
                if let Some(ws) = leading {
                    self.emit_ws(ws);
                }
                self.emit(TokenKind::Nl, span.clone());
                Ok(i + 1)
            }
            Some((RawToken::Comment, span)) => {
                if let Some(ws) = leading {
                    self.emit_ws(ws);
                }
                self.emit(TokenKind::Comment, span.clone());
                i += 1;
                if let Some((RawToken::Whitespace, ws)) = raw.get(i) {
                    self.emit_ws(ws.clone());
                    i += 1;
                }
                match raw.get(i) {
                    Some((RawToken::Newline, nl)) => {
                        self.emit(TokenKind::Nl, nl.clone());
                        Ok(i + 1)
                    }
                    _ => {
                        self.emit_synthetic(TokenKind::Nl);
                        Ok(i)
                    }
                }
            }
            Some(_) => {
                let column = match &leading {
                    Some(span) => indent_column(&self.source[span.clone()]),
                    None => 0,
                };
                self.indent_to(column, leading)?;
                self.at_line_start = false;
                Ok(i)
            }
        }
    }

    fn indent_to(&mut self, column: usize, leading: Option<logos::Span>) -> Result<(), TokenizeError> {
        let top = self.indents.last().copied().unwrap_or(0);
        if column > top {
            self.indents.push(column);
            if let Some(span) = leading {
                self.emit(TokenKind::Indent, span);
            }
            return Ok(());
        }
        if let Some(span) = leading {
            self.emit_ws(span);
        }
        while self.indents.last().copied().unwrap_or(0) > column {
            self.indents.pop();
            self.emit_synthetic(TokenKind::Dedent);
        }
        if self.indents.last().copied().unwrap_or(0) != column {
            return Err(TokenizeError::InconsistentDedent { line: self.line });
        }
        Ok(())
    }

    fn process(&mut self, raw: RawToken, span: logos::Span) {
        match raw {
            RawToken::Whitespace | RawToken::Continuation => self.emit_ws(span),
            RawToken::Newline => {
                if !self.brackets.is_empty() || !self.line_has_content {
                    self.emit(TokenKind::Nl, span);
                } else {
                    self.emit(TokenKind::Newline, span);
                    self.line_has_content = false;
                    self.at_line_start = true;
                }
            }
            RawToken::Comment => self.emit(TokenKind::Comment, span),
            RawToken::Open => {
                let bracket = self.source[span.clone()].chars().next().unwrap_or('(');
                let col = self.source[self.line_start..span.start].chars().count();
                self.brackets.push((bracket, self.line, col));
                self.line_has_content = true;
                self.emit(TokenKind::Op, span);
            }
            RawToken::Close => {
                self.brackets.pop();
                self.line_has_content = true;
                self.emit(TokenKind::Op, span);
            }
            RawToken::Name => self.emit_content(TokenKind::Name, span),
            RawToken::Number => self.emit_content(TokenKind::Number, span),
            RawToken::String => self.emit_content(TokenKind::String, span),
            RawToken::Operator => self.emit_content(TokenKind::Op, span),
        }
    }

    fn finish(&mut self) -> Result<(), TokenizeError> {
        if let Some(&(bracket, line, col)) = self.brackets.first() {
            return Err(TokenizeError::UnclosedBracket { bracket, line, col });
        }
        if self.line_has_content {
            self.emit_synthetic(TokenKind::Newline);
            self.line_has_content = false;
        }
        while self.indents.len() > 1 {
            self.indents.pop();
            self.emit_synthetic(TokenKind::Dedent);
        }
        self.emit_synthetic(TokenKind::Endmarker);
        Ok(())
    }

    fn emit_content(&mut self, kind: TokenKind, span: logos::Span) {
        self.line_has_content = true;
        self.emit(kind, span);
    }

    /// Whitespace merges into a directly preceding ws token
    fn emit_ws(&mut self, span: logos::Span) {
        if let Some(last) = self.tokens.last_mut() {
            if last.kind == TokenKind::Ws {
                last.value.push_str(&self.source[span.clone()]);
                self.advance(span);
                return;
            }
        }
        self.emit(TokenKind::Ws, span);
    }

    fn emit(&mut self, kind: TokenKind, span: logos::Span) {
        let value = self.source[span.clone()].to_string();
        self.push(kind, value);
        self.advance(span);
    }

    /// Tokens with no source text: dedents, the final newline and the endmarker
    fn emit_synthetic(&mut self, kind: TokenKind) {
        self.push(kind, String::new());
    }

    fn push(&mut self, kind: TokenKind, value: String) {
        let col = self.source[self.line_start..self.offset].chars().count();
        let line = self.line_text(self.line);
        self.tokens.push(Token {
            kind,
            value,
            index: self.tokens.len(),
            line_number: self.line,
            col,
            line,
            node: None,
            matching_paren: None,
            statement_node: None,
        });
    }

    /// Move past consumed source text, counting line breaks
    fn advance(&mut self, span: logos::Span) {
        let bytes = self.source.as_bytes();
        let mut i = span.start;
        while i < span.end {
            match bytes[i] {
                b'\n' => {
                    self.line += 1;
                    self.line_start = i + 1;
                }
                b'\r' if bytes.get(i + 1) != Some(&b'\n') => {
                    self.line += 1;
                    self.line_start = i + 1;
                }
                _ => {}
            }
            i += 1;
        }
        self.offset = span.end;
    }

    fn line_text(&self, line: usize) -> Arc<str> {
        match self.lines.get(line - 1) {
            Some(text) => Arc::clone(text),
            None => Arc::from(""),
        }
    }
}

/// The physical lines of `source`, line breaks included
fn physical_lines(source: &str) -> Vec<Arc<str>> {
    let bytes = source.as_bytes();
    let mut lines = Vec::new();
    let mut start = 0;
    for (i, &b) in bytes.iter().enumerate() {
        let is_break = b == b'\n' || (b == b'\r' && bytes.get(i + 1) != Some(&b'\n'));
        if is_break {
            lines.push(Arc::from(&source[start..=i]));
            start = i + 1;
        }
    }
    if start < source.len() || lines.is_empty() {
        lines.push(Arc::from(&source[start..]));
    }
    lines
}

fn indent_column(whitespace: &str) -> usize {
    let mut column = 0;
    for c in whitespace.chars() {
        match c {
            '\t' => column = (column / 8 + 1) * 8,
            '\x0C' => column = 0,
            _ => column += 1,
        }
    }
    column
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tog::lexing::base_tokenization::tokenize;

    fn run(source: &str) -> Vec<(TokenKind, String)> {
        let raw = tokenize(source).unwrap();
        LogicalLines::new(source)
            .transform(&raw)
            .unwrap()
            .into_iter()
            .map(|t| (t.kind, t.value))
            .collect()
    }

    fn kinds(source: &str) -> Vec<TokenKind> {
        run(source).into_iter().map(|(k, _)| k).collect()
    }

    use TokenKind::{Comment, Dedent, Endmarker, Indent, Name, Newline, Nl, Number, Op, Ws};

    #[test]
    fn test_simple_statement() {
        assert_eq!(
            kinds("x = 1\n"),
            vec![Name, Ws, Op, Ws, Number, Newline, Endmarker]
        );
    }

    #[test]
    fn test_missing_final_newline_is_synthesized() {
        let tokens = run("x");
        assert_eq!(
            tokens,
            vec![
                (Name, "x".to_string()),
                (Newline, String::new()),
                (Endmarker, String::new())
            ]
        );
    }

    #[test]
    fn test_indent_and_dedent() {
        let tokens = run("if a:\n    b\nc\n");
        let expected: Vec<(TokenKind, &str)> = vec![
            (Name, "if"),
            (Ws, " "),
            (Name, "a"),
            (Op, ":"),
            (Newline, "\n"),
            (Indent, "    "),
            (Name, "b"),
            (Newline, "\n"),
            (Dedent, ""),
            (Name, "c"),
            (Newline, "\n"),
            (Endmarker, ""),
        ];
        let actual: Vec<(TokenKind, &str)> =
            tokens.iter().map(|(k, v)| (*k, v.as_str())).collect();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_dedents_at_end_of_file() {
        assert_eq!(
            kinds("if a:\n    if b:\n        c\n"),
            vec![
                Name, Ws, Name, Op, Newline, Indent, Name, Ws, Name, Op, Newline, Indent, Name,
                Newline, Dedent, Dedent, Endmarker
            ]
        );
    }

    #[test]
    fn test_blank_and_comment_lines_are_nl() {
        assert_eq!(
            kinds("x\n\n# c\ny\n"),
            vec![Name, Newline, Nl, Comment, Nl, Name, Newline, Endmarker]
        );
    }

    #[test]
    fn test_comment_lines_do_not_change_indentation() {
        assert_eq!(
            kinds("if a:\n    b\n# c\n    d\n"),
            vec![
                Name, Ws, Name, Op, Newline, Indent, Name, Newline, Comment, Nl, Ws, Name,
                Newline, Dedent, Endmarker
            ]
        );
    }

    #[test]
    fn test_newlines_inside_brackets_are_nl() {
        assert_eq!(
            kinds("f(a,\n  b)\n"),
            vec![Name, Op, Name, Op, Nl, Ws, Name, Op, Newline, Endmarker]
        );
    }

    #[test]
    fn test_continuation_is_whitespace() {
        let tokens = run("x = \\\n  1\n");
        assert_eq!(tokens[3], (Ws, " \\\n  ".to_string()));
        assert_eq!(tokens[4], (Number, "1".to_string()));
    }

    #[test]
    fn test_trailing_comment_without_newline() {
        assert_eq!(
            kinds("x\n# c"),
            vec![Name, Newline, Comment, Nl, Endmarker]
        );
    }

    #[test]
    fn test_positions() {
        let raw = tokenize("a = 1\nbb = 'x'\n").unwrap();
        let tokens = LogicalLines::new("a = 1\nbb = 'x'\n").transform(&raw).unwrap();
        let string = tokens
            .iter()
            .find(|t| t.kind == TokenKind::String)
            .unwrap();
        assert_eq!(string.line_number, 2);
        assert_eq!(string.col, 5);
        assert_eq!(&*string.line, "bb = 'x'\n");
        for (i, token) in tokens.iter().enumerate() {
            assert_eq!(token.index, i);
        }
    }

    #[test]
    fn test_tab_indentation_column() {
        assert_eq!(indent_column("\t"), 8);
        assert_eq!(indent_column("  \t"), 8);
        assert_eq!(indent_column("        "), 8);
    }

    #[test]
    fn test_inconsistent_dedent() {
        let source = "if a:\n    b\n  c\n";
        let raw = tokenize(source).unwrap();
        let result = LogicalLines::new(source).transform(&raw);
        assert_eq!(result, Err(TokenizeError::InconsistentDedent { line: 3 }));
    }

    #[test]
    fn test_unclosed_bracket() {
        let source = "x = 1\nf(a, [b],\n  c\n";
        let raw = tokenize(source).unwrap();
        let result = LogicalLines::new(source).transform(&raw);
        assert_eq!(
            result,
            Err(TokenizeError::UnclosedBracket {
                bracket: '(',
                line: 2,
                col: 1
            })
        );
    }

    #[test]
    fn test_tokens_share_their_line() {
        let source = format!("x = [{}]\ny = 2\n", vec!["1"; 200].join(", "));
        let raw = tokenize(&source).unwrap();
        let tokens = LogicalLines::new(&source).transform(&raw).unwrap();
        let first = &tokens[0].line;
        let on_first_line: Vec<&Token> =
            tokens.iter().filter(|t| t.line_number == 1).collect();
        assert!(on_first_line.len() > 400);
        assert!(on_first_line.iter().all(|t| Arc::ptr_eq(&t.line, first)));
        let y = tokens.iter().find(|t| t.is_name("y")).unwrap();
        assert_eq!(&*y.line, "y = 2\n");
    }
}
