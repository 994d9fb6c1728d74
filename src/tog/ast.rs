//! Syntax tree arena
//!
//!     Nodes live in one `Vec` owned by [Ast] and refer to each other through [NodeId]s. The
//!     node kinds mirror the classes of Python's `ast` module, so rules written against them
//!     read like the grammar.
//!
//!     The tree is immutable once parsed, with one exception: rewriters such as the
//!     f-stringifier may replace a node's kind in place. Everything the synchronizer learns
//!     about a node (parent, children, tokens) lives in a separate side-table, not here.

pub mod nodes;
pub mod operators;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use nodes::{ConstantValue, NodeKind};
pub use operators::{BoolOperator, CmpOperator, Operator, UnaryOperator};

/// Index of a node in its [Ast]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Where a node starts: 1-based line, 0-based character column
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    pub line: usize,
    pub col: usize,
}

impl Position {
    pub fn new(line: usize, col: usize) -> Self {
        Position { line, col }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub position: Position,
}

/// A parsed module
#[derive(Debug, Clone, PartialEq)]
pub struct Ast {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Ast {
    pub(crate) fn new() -> Self {
        Ast {
            nodes: Vec::new(),
            root: NodeId(0),
        }
    }

    pub(crate) fn add(&mut self, kind: NodeKind, position: Position) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node { kind, position });
        id
    }

    pub(crate) fn set_root(&mut self, root: NodeId) {
        self.root = root;
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.0].kind
    }

    pub fn position(&self, id: NodeId) -> Position {
        self.nodes[id.0].position
    }

    /// The Python class name of a node, e.g. `AsyncFunctionDef`
    pub fn name(&self, id: NodeId) -> &'static str {
        self.kind(id).name()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len()).map(NodeId)
    }

    /// Replace the kind of a node, keeping its position
    pub fn replace(&mut self, id: NodeId, kind: NodeKind) {
        self.nodes[id.0].kind = kind;
    }

    /// Child nodes in source order
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.kind(id).child_ids()
    }

    /// Every node, parents before children, children in source order
    pub fn walk(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        if self.nodes.is_empty() {
            return out;
        }
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            out.push(id);
            let mut children = self.children(id);
            children.reverse();
            stack.extend(children);
        }
        out
    }

    /// An indented outline of the tree, one node per line
    pub fn dump(&self) -> String {
        let mut out = String::new();
        if self.nodes.is_empty() {
            return out;
        }
        let mut stack = vec![(self.root, 0usize)];
        while let Some((id, depth)) = stack.pop() {
            let label = self.kind(id).label();
            out.push_str(&"  ".repeat(depth));
            if label.is_empty() {
                out.push_str(self.name(id));
            } else {
                out.push_str(&format!("{} {}", self.name(id), label));
            }
            out.push('\n');
            for child in self.children(id).into_iter().rev() {
                stack.push((child, depth + 1));
            }
        }
        out
    }
}
