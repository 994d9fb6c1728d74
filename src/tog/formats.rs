//! Text and JSON dumps of tokens, trees and links
//!
//! The text formats are meant for reading in a terminal: one token or node per line, with
//! the same fields the error messages use. The JSON formats carry everything, for tools.

use crate::tog::ast::{Ast, NodeId, Position};
use crate::tog::synchronizer::Links;
use crate::tog::token::{show_val, Token};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_name(name: &str) -> Result<Self, FormatError> {
        match name {
            "text" | "simple" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => Err(FormatError::FormatNotFound(other.to_string())),
        }
    }

    pub fn names() -> &'static [&'static str] {
        &["json", "text"]
    }
}

/// Error that can occur during formatting
#[derive(Debug, Clone, PartialEq)]
pub enum FormatError {
    FormatNotFound(String),
    SerializationError(String),
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatError::FormatNotFound(name) => write!(f, "Format '{name}' not found"),
            FormatError::SerializationError(msg) => write!(f, "Serialization error: {msg}"),
        }
    }
}

impl std::error::Error for FormatError {}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, FormatError> {
    serde_json::to_string_pretty(value).map_err(|e| FormatError::SerializationError(e.to_string()))
}

pub fn format_tokens(tokens: &[Token], format: OutputFormat) -> Result<String, FormatError> {
    match format {
        OutputFormat::Text => {
            let mut out = String::new();
            for token in tokens {
                out.push_str(&token.dump());
                out.push('\n');
            }
            Ok(out)
        }
        OutputFormat::Json => to_json(tokens),
    }
}

#[derive(Serialize)]
struct TreeEntry {
    id: NodeId,
    kind: &'static str,
    #[serde(skip_serializing_if = "String::is_empty")]
    label: String,
    position: Position,
    children: Vec<NodeId>,
}

pub fn format_tree(tree: &Ast, format: OutputFormat) -> Result<String, FormatError> {
    match format {
        OutputFormat::Text => Ok(tree.dump()),
        OutputFormat::Json => {
            let entries: Vec<TreeEntry> = tree
                .walk()
                .into_iter()
                .map(|id| TreeEntry {
                    id,
                    kind: tree.name(id),
                    label: tree.kind(id).label(),
                    position: tree.position(id),
                    children: tree.children(id),
                })
                .collect();
            to_json(&entries)
        }
    }
}

#[derive(Serialize)]
struct LinkEntry<'a> {
    node_index: usize,
    id: NodeId,
    kind: &'static str,
    parent: Option<NodeId>,
    tokens: Vec<&'a str>,
    token_list: &'a [usize],
    comments: Vec<&'a str>,
}

/// The linked tree in visit order: each node with its parent and the tokens it owns
pub fn format_links(
    tree: &Ast,
    links: &Links,
    tokens: &[Token],
    format: OutputFormat,
) -> Result<String, FormatError> {
    let values = |indices: &'_ [usize]| -> Vec<&str> {
        indices
            .iter()
            .filter_map(|i| tokens.get(*i))
            .map(|t| t.value.as_str())
            .collect()
    };
    match format {
        OutputFormat::Text => {
            let mut out = String::new();
            for id in links.visited() {
                let depth = ancestors(links, id);
                let owned: Vec<String> = links
                    .token_list(id)
                    .iter()
                    .filter_map(|i| tokens.get(*i))
                    .map(|t| show_val(&t.value))
                    .collect();
                out.push_str(&format!(
                    "{:>4} {}{} {}",
                    links.node_index(id).unwrap_or_default(),
                    "  ".repeat(depth),
                    tree.name(id),
                    id
                ));
                if !owned.is_empty() {
                    out.push_str(&format!(" [{}]", owned.join(" ")));
                }
                if !links.comment_list(id).is_empty() {
                    out.push_str(&format!(" comments={}", links.comment_list(id).len()));
                }
                out.push('\n');
            }
            Ok(out)
        }
        OutputFormat::Json => {
            let entries: Vec<LinkEntry> = links
                .visited()
                .into_iter()
                .map(|id| LinkEntry {
                    node_index: links.node_index(id).unwrap_or_default(),
                    id,
                    kind: tree.name(id),
                    parent: links.parent(id),
                    tokens: values(links.token_list(id)),
                    token_list: links.token_list(id),
                    comments: values(links.comment_list(id)),
                })
                .collect();
            to_json(&entries)
        }
    }
}

fn ancestors(links: &Links, id: NodeId) -> usize {
    let mut depth = 0;
    let mut current = links.parent(id);
    while let Some(parent) = current {
        depth += 1;
        current = links.parent(parent);
    }
    depth
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tog::lexing::make_tokens;
    use crate::tog::parsing::parse;
    use crate::tog::synchronizer::synchronize;

    #[test]
    fn test_format_names() {
        assert_eq!(OutputFormat::from_name("json"), Ok(OutputFormat::Json));
        assert_eq!(OutputFormat::from_name("text"), Ok(OutputFormat::Text));
        assert_eq!(
            OutputFormat::from_name("xml"),
            Err(FormatError::FormatNotFound("xml".to_string()))
        );
    }

    #[test]
    fn test_tokens_json_round_trips() {
        let tokens = make_tokens("x = (1)\n").unwrap();
        let json = format_tokens(&tokens, OutputFormat::Json).unwrap();
        let back: Vec<Token> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tokens);
    }

    #[test]
    fn test_tokens_text_has_one_line_per_token() {
        let tokens = make_tokens("pass\n").unwrap();
        let text = format_tokens(&tokens, OutputFormat::Text).unwrap();
        assert_eq!(text.lines().count(), tokens.len());
    }

    #[test]
    fn test_links_text() {
        let source = "x = 1\n";
        let mut tokens = make_tokens(source).unwrap();
        let tree = parse(source).unwrap();
        let links = synchronize(&mut tokens, &tree, "t.py").unwrap();
        let text = format_links(&tree, &links, &tokens, OutputFormat::Text).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].trim_start().starts_with("0 Module"));
        assert!(lines[1].contains("  Assign"));
        assert!(lines[1].ends_with("[=]"));
        assert!(lines[2].contains("    Name"));
        assert!(lines[2].ends_with("[x]"));
    }

    #[test]
    fn test_links_json() {
        let source = "f(a)\n";
        let mut tokens = make_tokens(source).unwrap();
        let tree = parse(source).unwrap();
        let links = synchronize(&mut tokens, &tree, "t.py").unwrap();
        let json = format_links(&tree, &links, &tokens, OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let entries = value.as_array().unwrap();
        assert_eq!(entries[0]["kind"], "Module");
        assert!(entries[0]["parent"].is_null());
        let names: Vec<_> = entries
            .iter()
            .filter(|e| e["kind"] == "Name")
            .map(|e| e["tokens"][0].as_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["f", "a"]);
    }

    #[test]
    fn test_tree_json() {
        let tree = parse("x = 1\n").unwrap();
        let json = format_tree(&tree, OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[0]["kind"], "Module");
        assert_eq!(value.as_array().unwrap().len(), 4);
    }
}
