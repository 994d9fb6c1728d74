//! Turning tokens back into source text

use super::core::{Token, TokenKind};

/// Trait for converting a token to the source text it stands for
pub trait ToPythonSource {
    fn to_python_source(&self) -> &str;
}

impl ToPythonSource for Token {
    fn to_python_source(&self) -> &str {
        match self.kind {
            // Killed tokens are emptied when killed, but a caller may have put text back
            TokenKind::Killed => "",
            _ => &self.value,
        }
    }
}

/// Concatenate token values. For an unmodified token list this is the original source.
pub fn detokenize(tokens: &[Token]) -> String {
    let mut result = String::new();
    for token in tokens {
        result.push_str(token.to_python_source());
    }
    result
}

/// A printable form of a token value: line breaks and tabs escaped, long values shortened.
pub fn show_val(value: &str) -> String {
    const MAX: usize = 20;
    let escaped: String = value
        .chars()
        .flat_map(|c| match c {
            '\n' => vec!['\\', 'n'],
            '\r' => vec!['\\', 'r'],
            '\t' => vec!['\\', 't'],
            c => vec![c],
        })
        .collect();
    if escaped.chars().count() > MAX {
        let head: String = escaped.chars().take(MAX).collect();
        format!("{}...", head)
    } else {
        escaped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tok(kind: TokenKind, value: &str) -> Token {
        Token::new(kind, value)
    }

    #[test]
    fn test_detokenize_concatenates_values() {
        let tokens = vec![
            tok(TokenKind::Name, "x"),
            tok(TokenKind::Ws, " "),
            tok(TokenKind::Op, "="),
            tok(TokenKind::Ws, " "),
            tok(TokenKind::Number, "1"),
            tok(TokenKind::Newline, "\n"),
            tok(TokenKind::Endmarker, ""),
        ];
        assert_eq!(detokenize(&tokens), "x = 1\n");
    }

    #[test]
    fn test_killed_tokens_vanish() {
        let tokens = vec![
            tok(TokenKind::String, "f'{a}'"),
            tok(TokenKind::Killed, "% a"),
        ];
        assert_eq!(detokenize(&tokens), "f'{a}'");
    }

    #[test]
    fn test_show_val() {
        assert_eq!(show_val("a\nb\t"), "a\\nb\\t");
        assert_eq!(show_val(""), "");
        assert_eq!(
            show_val("abcdefghijklmnopqrstuvwxyz"),
            "abcdefghijklmnopqrst..."
        );
    }
}
