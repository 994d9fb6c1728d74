//! Rewrite `%` formatting as f-strings
//!
//!     `'%s = %r' % (name, value)` becomes `f'{name} = {value!r}'`.
//!
//!     Candidates are `BinOp` nodes with the `%` operator whose left operand is a single
//!     plain or raw string literal. The conversion works on linked tokens, not on the tree:
//!     the values are copied from the source text of the right-hand side, so their spelling
//!     survives. A rewrite replaces the first token of the expression with the new string
//!     token, kills the others and turns the `BinOp` into a string constant.
//!
//!     Anything that cannot be converted exactly is left alone and recorded as skipped:
//!     mapping keys, `*` widths, a value count that differs from the spec count, values that
//!     would need a backslash or the string's own quote inside the braces, concatenated
//!     strings and prefixes other than `r`.

pub mod format_spec;

use crate::tog::ast::{Ast, ConstantValue, NodeId, NodeKind, Operator};
use crate::tog::parsing::string_prefix;
use crate::tog::synchronizer::Links;
use crate::tog::token::{detokenize, Token, TokenKind};
use crate::tog::traversal::{replace_token, tokens_for_node, TokenOrderTraverser};
use format_spec::{parse_format, render_field, render_text, Piece};
use std::fmt;

/// Why a candidate was left unchanged
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionError {
    /// The string has a prefix other than `r`
    Prefix(String),
    /// Implicitly concatenated strings
    Concatenated,
    /// Not a valid `%` format string; the offset of the problem in the string body
    BadFormat(usize),
    MappingKey,
    StarWidth,
    CountMismatch { specs: usize, values: usize },
    /// A value would contain a backslash inside the braces
    Backslash,
    /// A value contains the string's quote character
    QuoteClash,
    /// A value spans lines or contains a comment
    MultiLine,
    /// `*args` on the right-hand side
    Unpacking,
    /// No tokens for a value
    NoTokens,
    /// The expression's tokens start or end inside parens
    UnbalancedParens,
}

impl fmt::Display for ConversionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversionError::Prefix(prefix) => write!(f, "unsupported string prefix {:?}", prefix),
            ConversionError::Concatenated => write!(f, "concatenated strings"),
            ConversionError::BadFormat(offset) => {
                write!(f, "invalid format string at offset {}", offset)
            }
            ConversionError::MappingKey => write!(f, "mapping keys are not supported"),
            ConversionError::StarWidth => write!(f, "'*' width or precision"),
            ConversionError::CountMismatch { specs, values } => write!(
                f,
                "f-string mismatch: {} value{}, {} spec{}",
                values,
                if *values == 1 { "" } else { "s" },
                specs,
                if *specs == 1 { "" } else { "s" }
            ),
            ConversionError::Backslash => write!(f, "f-expression would contain a backslash"),
            ConversionError::QuoteClash => write!(f, "value contains the string's quote"),
            ConversionError::MultiLine => write!(f, "value spans lines"),
            ConversionError::Unpacking => write!(f, "unpacked values"),
            ConversionError::NoTokens => write!(f, "no tokens for value"),
            ConversionError::UnbalancedParens => write!(f, "unbalanced parens"),
        }
    }
}

impl std::error::Error for ConversionError {}

/// A performed rewrite
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    pub line_number: usize,
    pub from: String,
    pub to: String,
}

/// A candidate that was left unchanged
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skipped {
    pub line_number: usize,
    pub line: String,
    pub reason: ConversionError,
}

/// Collects `%` candidates in token order
struct Candidates<'t> {
    tree: &'t Ast,
    found: Vec<NodeId>,
}

impl TokenOrderTraverser for Candidates<'_> {
    fn visit(&mut self, _links: &Links, node: NodeId) {
        if let NodeKind::BinOp {
            left,
            op: Operator::Mod,
            ..
        } = self.tree.kind(node)
        {
            if matches!(
                self.tree.kind(*left),
                NodeKind::Constant {
                    value: ConstantValue::Str(_)
                }
            ) {
                self.found.push(node);
            }
        }
    }
}

pub struct Fstringify {
    file_name: String,
    rewrites: Vec<Rewrite>,
    skipped: Vec<Skipped>,
}

impl Fstringify {
    pub fn new(file_name: &str) -> Self {
        Fstringify {
            file_name: file_name.to_string(),
            rewrites: Vec::new(),
            skipped: Vec::new(),
        }
    }

    pub fn rewrites(&self) -> &[Rewrite] {
        &self.rewrites
    }

    pub fn skipped(&self) -> &[Skipped] {
        &self.skipped
    }

    /// Convert every candidate in a linked file, returning the new source
    pub fn fstringify(
        &mut self,
        tokens: &mut [Token],
        tree: &mut Ast,
        links: &mut Links,
    ) -> String {
        let mut candidates = Candidates {
            tree,
            found: Vec::new(),
        };
        candidates.traverse(links);
        let found = candidates.found;

        for node in found {
            self.make_fstring(tokens, tree, links, node);
        }
        detokenize(tokens)
    }

    fn make_fstring(
        &mut self,
        tokens: &mut [Token],
        tree: &mut Ast,
        links: &mut Links,
        node: NodeId,
    ) {
        let (left, right) = match tree.kind(node) {
            NodeKind::BinOp { left, right, .. } => (*left, *right),
            _ => return,
        };
        let left_tokens = links.token_list(left);
        // Part of an expression an earlier rewrite already replaced
        if left_tokens
            .iter()
            .any(|i| tokens[*i].kind != TokenKind::String)
        {
            return;
        }
        let Some(&first_string) = left_tokens.first() else {
            return;
        };
        let line_number = tokens[first_string].line_number;

        let result = convert(tokens, tree, links, left, right).and_then(|s| {
            let range = tokens_for_node(links, tokens, node).ok_or(ConversionError::NoTokens)?;
            if paren_level(&tokens[range.clone()]) != 0 {
                return Err(ConversionError::UnbalancedParens);
            }
            Ok((s, range))
        });
        let (new_string, range) = match result {
            Ok(ok) => ok,
            Err(reason) => {
                log::info!(
                    "{}:{}: can't create f-string: {}",
                    self.file_name,
                    line_number,
                    reason
                );
                self.skipped.push(Skipped {
                    line_number,
                    line: tokens[first_string].line.trim().to_string(),
                    reason,
                });
                return;
            }
        };

        let from = detokenize(&tokens[range.clone()]);
        log::info!(
            "{}:{}: {} -> {}",
            self.file_name,
            line_number,
            from,
            new_string
        );

        let first = range.start;
        replace_token(&mut tokens[first], TokenKind::String, &new_string);
        tokens[first].node = Some(node);
        for token in &mut tokens[first + 1..range.end] {
            replace_token(token, TokenKind::Killed, "");
        }
        tree.replace(
            node,
            NodeKind::Constant {
                value: ConstantValue::Str(new_string.clone()),
            },
        );
        links.set_token_list(node, vec![first]);
        links.get_mut(node).children.clear();

        self.rewrites.push(Rewrite {
            line_number,
            from,
            to: new_string,
        });
    }
}

/// The f-string equivalent of `left % right`
fn convert(
    tokens: &[Token],
    tree: &Ast,
    links: &Links,
    left: NodeId,
    right: NodeId,
) -> Result<String, ConversionError> {
    let left_tokens = links.token_list(left);
    if left_tokens.len() != 1 {
        return Err(ConversionError::Concatenated);
    }
    let literal = tokens[left_tokens[0]].value.as_str();
    let prefix = string_prefix(literal);
    if !matches!(prefix, "" | "r" | "R") {
        return Err(ConversionError::Prefix(prefix.to_string()));
    }
    let quoted = &literal[prefix.len()..];
    let quote = if quoted.starts_with("'''") || quoted.starts_with("\"\"\"") {
        &quoted[..3]
    } else {
        &quoted[..1]
    };
    let body = &quoted[quote.len()..quoted.len() - quote.len()];
    let delim = &quote[..1];

    let pieces = parse_format(body)?;
    let values = scan_rhs(tokens, tree, links, right)?;
    let specs = pieces
        .iter()
        .filter(|p| matches!(p, Piece::Spec(_)))
        .count();
    if specs != values.len() {
        return Err(ConversionError::CountMismatch {
            specs,
            values: values.len(),
        });
    }

    let mut out = format!("f{}{}", prefix, quote);
    let mut values = values.into_iter();
    for piece in &pieces {
        match piece {
            Piece::Text(text) => out.push_str(&render_text(text)),
            Piece::Percent => out.push('%'),
            Piece::Spec(spec) => {
                let value = values.next().ok_or(ConversionError::CountMismatch {
                    specs,
                    values: 0,
                })?;
                if value.contains('\\') {
                    return Err(ConversionError::Backslash);
                }
                if value.contains(delim) {
                    return Err(ConversionError::QuoteClash);
                }
                out.push_str(&render_field(&value, spec)?);
            }
        }
    }
    out.push_str(quote);
    Ok(out)
}

fn paren_level(tokens: &[Token]) -> i64 {
    tokens.iter().fold(0, |level, t| {
        if t.is_op("(") {
            level + 1
        } else if t.is_op(")") {
            level - 1
        } else {
            level
        }
    })
}

/// Source text of each value on the right of `%`: one per tuple element, else one
fn scan_rhs(
    tokens: &[Token],
    tree: &Ast,
    links: &Links,
    right: NodeId,
) -> Result<Vec<String>, ConversionError> {
    let elements = match tree.kind(right) {
        NodeKind::Tuple { elts } => elts.clone(),
        _ => vec![right],
    };
    elements
        .into_iter()
        .map(|element| {
            let range = tokens_for_node(links, tokens, element).ok_or(ConversionError::NoTokens)?;
            let slice = &tokens[range];
            if slice
                .iter()
                .any(|t| matches!(t.kind, TokenKind::Comment | TokenKind::Nl | TokenKind::Newline))
            {
                return Err(ConversionError::MultiLine);
            }
            let text = detokenize(slice);
            match tree.kind(element) {
                NodeKind::Starred { .. } => Err(ConversionError::Unpacking),
                // Top-level colons would end the field
                NodeKind::Lambda { .. } | NodeKind::NamedExpr { .. } => Ok(format!("({})", text)),
                _ => Ok(text),
            }
        })
        .collect()
}
