//! Raw tokens produced by the logos lexer
//!
//! These are physical tokens only. Whether a line break ends a logical line, and where the
//! indentation changes, is decided later by the [logical_lines](super::transformations::logical_lines)
//! transformation, which needs bracket depth and line context that a regular lexer lacks.

use logos::{Lexer, Logos};

#[derive(Logos, Debug, PartialEq, Eq, Clone, Copy)]
pub enum RawToken {
    #[regex(r"[ \t\x0C]+")]
    Whitespace,

    #[regex(r"\\\r?\n")]
    Continuation,

    #[regex(r"\r?\n|\r")]
    Newline,

    #[regex(r"#[^\r\n]*")]
    Comment,

    #[regex(r"[A-Za-z_\x{80}-\x{10FFFF}][A-Za-z0-9_\x{80}-\x{10FFFF}]*")]
    Name,

    #[regex(r"0[xX](_?[0-9a-fA-F])+")]
    #[regex(r"0[oO](_?[0-7])+")]
    #[regex(r"0[bB](_?[01])+")]
    #[regex(r"[0-9](_?[0-9])*(\.([0-9](_?[0-9])*)?)?([eE][+-]?[0-9](_?[0-9])*)?[jJ]?")]
    #[regex(r"\.[0-9](_?[0-9])*([eE][+-]?[0-9](_?[0-9])*)?[jJ]?")]
    Number,

    /// The regex only matches the prefix and the opening quote, [lex_string] finds the end.
    #[regex(r#"([rRbBuUfF]|[rR][bBfF]|[bBfF][rR])?['"]"#, lex_string)]
    String,

    #[token("(")]
    #[token("[")]
    #[token("{")]
    Open,

    #[token(")")]
    #[token("]")]
    #[token("}")]
    Close,

    #[token("+")]
    #[token("-")]
    #[token("*")]
    #[token("/")]
    #[token("//")]
    #[token("%")]
    #[token("**")]
    #[token("@")]
    #[token("<<")]
    #[token(">>")]
    #[token("&")]
    #[token("|")]
    #[token("^")]
    #[token("~")]
    #[token(":=")]
    #[token("<")]
    #[token(">")]
    #[token("<=")]
    #[token(">=")]
    #[token("==")]
    #[token("!=")]
    #[token("->")]
    #[token(".")]
    #[token("...")]
    #[token(",")]
    #[token(":")]
    #[token(";")]
    #[token("=")]
    #[token("+=")]
    #[token("-=")]
    #[token("*=")]
    #[token("/=")]
    #[token("//=")]
    #[token("%=")]
    #[token("@=")]
    #[token("&=")]
    #[token("|=")]
    #[token("^=")]
    #[token(">>=")]
    #[token("<<=")]
    #[token("**=")]
    Operator,
}

impl RawToken {
    pub fn is_whitespace(&self) -> bool {
        matches!(self, RawToken::Whitespace | RawToken::Continuation)
    }

    pub fn is_newline(&self) -> bool {
        matches!(self, RawToken::Newline)
    }
}

/// Extend a string token from its opening quote to the closing one.
///
/// Backslashes escape the next character in every kind of string, raw strings included: the
/// tokenizer only needs to find the end, not the value. Single-quoted strings may not contain
/// an unescaped line break.
fn lex_string(lex: &mut Lexer<RawToken>) -> bool {
    let quote = match lex.slice().as_bytes().last() {
        Some(&q) => q,
        None => return false,
    };
    let rest = lex.remainder().as_bytes();
    let triple = rest.len() >= 2 && rest[0] == quote && rest[1] == quote;
    let mut i = if triple { 2 } else { 0 };

    while i < rest.len() {
        let b = rest[i];
        if b == b'\\' {
            i += 1;
            if i + 1 < rest.len() && rest[i] == b'\r' && rest[i + 1] == b'\n' {
                i += 1;
            }
            i += 1;
            continue;
        }
        if triple {
            if b == quote && i + 2 < rest.len() && rest[i + 1] == quote && rest[i + 2] == quote {
                lex.bump(i + 3);
                return true;
            }
        } else if b == quote {
            lex.bump(i + 1);
            return true;
        } else if b == b'\n' || b == b'\r' {
            return false;
        }
        i += 1;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex_all(source: &str) -> Vec<(RawToken, &str)> {
        let mut lexer = RawToken::lexer(source);
        let mut out = Vec::new();
        while let Some(result) = lexer.next() {
            if let Ok(token) = result {
                out.push((token, lexer.slice()));
            }
        }
        out
    }

    #[test]
    fn test_names_and_operators() {
        assert_eq!(
            lex_all("a.b += c"),
            vec![
                (RawToken::Name, "a"),
                (RawToken::Operator, "."),
                (RawToken::Name, "b"),
                (RawToken::Whitespace, " "),
                (RawToken::Operator, "+="),
                (RawToken::Whitespace, " "),
                (RawToken::Name, "c"),
            ]
        );
    }

    #[test]
    fn test_numbers() {
        for source in ["0", "42", "1_000", "0x1F", "0o17", "0b101", "1.5", "1.", ".5", "1e10", "2.5E-3", "3j", "1.5j"] {
            assert_eq!(lex_all(source), vec![(RawToken::Number, source)], "{}", source);
        }
    }

    #[test]
    fn test_ellipsis_and_dot() {
        assert_eq!(lex_all("..."), vec![(RawToken::Operator, "...")]);
        assert_eq!(
            lex_all("x.y"),
            vec![
                (RawToken::Name, "x"),
                (RawToken::Operator, "."),
                (RawToken::Name, "y")
            ]
        );
    }

    #[test]
    fn test_strings() {
        assert_eq!(lex_all("'abc'"), vec![(RawToken::String, "'abc'")]);
        assert_eq!(lex_all(r#""a\"b""#), vec![(RawToken::String, r#""a\"b""#)]);
        assert_eq!(lex_all("f'{x}'"), vec![(RawToken::String, "f'{x}'")]);
        assert_eq!(lex_all("rb'x'"), vec![(RawToken::String, "rb'x'")]);
        assert_eq!(lex_all("''"), vec![(RawToken::String, "''")]);
    }

    #[test]
    fn test_triple_quoted_string_spans_lines() {
        let source = "'''a\n'b'\n'''";
        assert_eq!(lex_all(source), vec![(RawToken::String, source)]);
    }

    #[test]
    fn test_unterminated_string_is_an_error() {
        let mut lexer = RawToken::lexer("'abc\n");
        assert!(matches!(lexer.next(), Some(Err(_))));
    }

    #[test]
    fn test_prefix_without_quote_is_a_name() {
        assert_eq!(lex_all("rb"), vec![(RawToken::Name, "rb")]);
    }

    #[test]
    fn test_continuation_and_comment() {
        assert_eq!(
            lex_all("x \\\n# c\n"),
            vec![
                (RawToken::Name, "x"),
                (RawToken::Whitespace, " "),
                (RawToken::Continuation, "\\\n"),
                (RawToken::Comment, "# c"),
                (RawToken::Newline, "\n"),
            ]
        );
    }
}
