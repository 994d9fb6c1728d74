//! Base tokenization using the logos lexer
//!
//! This is the entry point where source strings become raw token streams. Unlike a lexer for
//! a forgiving markup format, nothing may be dropped here: every byte of the source must land
//! in exactly one raw token, or the round trip breaks. Unlexable input is an error.

use super::tokens_core::RawToken;
use super::{line_col, TokenizeError};
use logos::Logos;

/// Tokenize source code with location information
pub fn tokenize(source: &str) -> Result<Vec<(RawToken, logos::Span)>, TokenizeError> {
    let mut lexer = RawToken::lexer(source);
    let mut tokens = Vec::new();

    while let Some(result) = lexer.next() {
        match result {
            Ok(token) => tokens.push((token, lexer.span())),
            Err(()) => return Err(classify_error(source, lexer.span())),
        }
    }

    Ok(tokens)
}

/// A failed match that starts with a quote (after an optional prefix) is an unterminated string.
fn classify_error(source: &str, span: logos::Span) -> TokenizeError {
    let (line, col) = line_col(source, span.start);
    let text = &source[span.start..];
    let quote_at = text
        .char_indices()
        .take(3)
        .find(|(_, c)| *c == '\'' || *c == '"')
        .map(|(i, _)| i);
    let prefix_ok = match quote_at {
        Some(i) => text[..i].chars().all(|c| "rRbBuUfF".contains(c)),
        None => false,
    };
    if prefix_ok {
        TokenizeError::UnterminatedString { line, col }
    } else {
        let ch = text.chars().next().unwrap_or('\0');
        TokenizeError::InvalidCharacter { ch, line, col }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenizes() {
        let tokens = tokenize("x = 1").unwrap();
        assert_eq!(tokens.len(), 5);
        assert_eq!(tokens[0].0, RawToken::Name);
        assert_eq!(tokens[1].0, RawToken::Whitespace);
        assert_eq!(tokens[2].0, RawToken::Operator);
        assert_eq!(tokens[3].0, RawToken::Whitespace);
        assert_eq!(tokens[4].0, RawToken::Number);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(tokenize("").unwrap(), vec![]);
    }

    #[test]
    fn test_spans_cover_the_source() {
        let source = "def f(a, b=1):\n    return a  # done\n";
        let tokens = tokenize(source).unwrap();
        let mut end = 0;
        for (_, span) in &tokens {
            assert_eq!(span.start, end);
            end = span.end;
        }
        assert_eq!(end, source.len());
    }

    #[test]
    fn test_unterminated_string() {
        assert_eq!(
            tokenize("x = 'abc\n"),
            Err(TokenizeError::UnterminatedString { line: 1, col: 4 })
        );
        assert_eq!(
            tokenize("x = rb\"abc"),
            Err(TokenizeError::UnterminatedString { line: 1, col: 4 })
        );
    }

    #[test]
    fn test_invalid_character() {
        assert_eq!(
            tokenize("a\nb $ c"),
            Err(TokenizeError::InvalidCharacter {
                ch: '$',
                line: 2,
                col: 2
            })
        );
    }
}
