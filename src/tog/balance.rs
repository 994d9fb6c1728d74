//! Paren balancing
//!
//! Links every `(` token with its `)` partner through `matching_paren`, in both directions.
//! Only round parens take part: brackets and braces are significant tokens that the
//! synchronizer matches directly, parens are not.
//!
//! Unbalanced input is reported, not fatal. An unmatched `)` or a `(` left open at the end
//! is logged as a warning and returned as a [PairingError]; the scan goes on.

use crate::tog::token::{Token, TokenKind};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PairingError {
    UnmatchedClose { index: usize, line: usize },
    UnclosedOpen { index: usize, line: usize },
}

impl fmt::Display for PairingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PairingError::UnmatchedClose { index, line } => {
                write!(f, "unmatched ')' at token {} (line {})", index, line)
            }
            PairingError::UnclosedOpen { index, line } => {
                write!(f, "unclosed '(' at token {} (line {})", index, line)
            }
        }
    }
}

impl std::error::Error for PairingError {}

/// Link matching parens, returning the number of matched pairs.
///
/// Partners are recorded by token `index`, which stays valid when the slice is a filtered
/// or edited copy of the token list.
pub fn balance_parens(tokens: &mut [Token]) -> usize {
    balance_parens_report(tokens).0
}

/// Like [balance_parens], also returning every pairing problem found
pub fn balance_parens_report(tokens: &mut [Token]) -> (usize, Vec<PairingError>) {
    let mut stack: Vec<usize> = Vec::new();
    let mut errors = Vec::new();
    let mut count = 0;

    for i in 0..tokens.len() {
        if tokens[i].kind != TokenKind::Op {
            continue;
        }
        match tokens[i].value.as_str() {
            "(" => stack.push(i),
            ")" => match stack.pop() {
                Some(open) => {
                    tokens[open].matching_paren = Some(tokens[i].index);
                    tokens[i].matching_paren = Some(tokens[open].index);
                    count += 1;
                }
                None => {
                    let error = PairingError::UnmatchedClose {
                        index: tokens[i].index,
                        line: tokens[i].line_number,
                    };
                    log::warn!("balance_parens: {}", error);
                    errors.push(error);
                }
            },
            _ => {}
        }
    }

    for open in stack {
        let error = PairingError::UnclosedOpen {
            index: tokens[open].index,
            line: tokens[open].line_number,
        };
        log::warn!("balance_parens: {}", error);
        errors.push(error);
    }

    (count, errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tog::lexing::make_tokens;

    fn paren_indices(tokens: &[Token], value: &str) -> Vec<usize> {
        tokens
            .iter()
            .filter(|t| t.is_op(value))
            .map(|t| t.index)
            .collect()
    }

    #[test]
    fn test_nested_parens() {
        let mut tokens = make_tokens("f((a), (b, (c)))\n").unwrap();
        let count = balance_parens(&mut tokens);
        assert_eq!(count, 4);

        let opens = paren_indices(&tokens, "(");
        let closes = paren_indices(&tokens, ")");
        // The outer call paren closes last
        assert_eq!(tokens[opens[0]].matching_paren, closes.last().copied());
        for token in tokens.iter().filter(|t| t.is_op("(") || t.is_op(")")) {
            let partner = token.matching_paren.unwrap();
            assert_eq!(tokens[partner].matching_paren, Some(token.index));
        }
    }

    #[test]
    fn test_partners_are_token_indices() {
        let mut tokens = make_tokens("f(a, g(b))\n").unwrap();
        // Drop the leading name, so slice positions trail token indices by one
        tokens.remove(0);
        assert_eq!(balance_parens(&mut tokens), 2);
        let open = tokens.iter().find(|t| t.is_op("(")).unwrap();
        let close = tokens.iter().rev().find(|t| t.is_op(")")).unwrap();
        assert_eq!(open.index, 1);
        assert_eq!(open.matching_paren, Some(close.index));
        assert_eq!(close.matching_paren, Some(1));
    }

    #[test]
    fn test_brackets_are_ignored() {
        let mut tokens = make_tokens("x = [a, {b: (c)}]\n").unwrap();
        assert_eq!(balance_parens(&mut tokens), 1);
        assert!(tokens
            .iter()
            .filter(|t| t.is_op("[") || t.is_op("{"))
            .all(|t| t.matching_paren.is_none()));
    }

    #[test]
    fn test_unmatched_close_is_reported() {
        // The tokenizer lets a stray closer through
        let mut tokens = make_tokens("f(a))\n").unwrap();
        let (count, errors) = balance_parens_report(&mut tokens);
        assert_eq!(count, 1);
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], PairingError::UnmatchedClose { line: 1, .. }));
    }

    #[test]
    fn test_unclosed_open_is_reported() {
        let mut tokens = make_tokens("f(a)\n").unwrap();
        // Remove the closing paren by hand
        let close = paren_indices(&tokens, ")")[0];
        tokens[close].kind = TokenKind::Killed;
        tokens[close].value.clear();
        let (count, errors) = balance_parens_report(&mut tokens);
        assert_eq!(count, 0);
        assert_eq!(
            errors,
            vec![PairingError::UnclosedOpen { index: 1, line: 1 }]
        );
    }
}
