//! The node side-table produced by synchronization

use crate::tog::ast::NodeId;
use serde::Serialize;

/// What the synchronizer learned about one node
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NodeLinks {
    pub parent: Option<NodeId>,
    /// In visit order
    pub children: Vec<NodeId>,
    /// Position in visit order, `None` for nodes that were never visited (keywords)
    pub node_index: Option<usize>,
    /// Indices of the significant tokens the node owns, sorted
    pub token_list: Vec<usize>,
    /// Indices of the comments attached to the node
    pub comment_list: Vec<usize>,
}

/// Links for every node of one tree, indexed by [NodeId]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Links {
    nodes: Vec<NodeLinks>,
    root: NodeId,
    trace: Vec<usize>,
}

impl Links {
    pub(crate) fn new(node_count: usize, root: NodeId) -> Self {
        Links {
            nodes: vec![NodeLinks::default(); node_count],
            root,
            trace: Vec::new(),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn get(&self, id: NodeId) -> &NodeLinks {
        &self.nodes[id.0]
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> &mut NodeLinks {
        &mut self.nodes[id.0]
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn node_index(&self, id: NodeId) -> Option<usize> {
        self.nodes[id.0].node_index
    }

    pub fn token_list(&self, id: NodeId) -> &[usize] {
        &self.nodes[id.0].token_list
    }

    pub fn comment_list(&self, id: NodeId) -> &[usize] {
        &self.nodes[id.0].comment_list
    }

    /// Replace a node's token list, e.g. after a rewrite merged its tokens
    pub fn set_token_list(&mut self, id: NodeId, mut tokens: Vec<usize>) {
        tokens.sort_unstable();
        self.nodes[id.0].token_list = tokens;
    }

    /// Matched token indices in the order they were matched
    pub fn sync_trace(&self) -> &[usize] {
        &self.trace
    }

    pub(crate) fn record_match(&mut self, index: usize) {
        self.trace.push(index);
    }

    /// Visited nodes in visit order
    pub fn visited(&self) -> Vec<NodeId> {
        let mut visited: Vec<(usize, NodeId)> = self
            .nodes
            .iter()
            .enumerate()
            .filter_map(|(i, links)| links.node_index.map(|index| (index, NodeId(i))))
            .collect();
        visited.sort_unstable();
        visited.into_iter().map(|(_, id)| id).collect()
    }

    /// Insert `index` into a node's token list, keeping it sorted
    pub(crate) fn add_token(&mut self, id: NodeId, index: usize) {
        let list = &mut self.nodes[id.0].token_list;
        match list.binary_search(&index) {
            Ok(_) => {}
            Err(pos) => list.insert(pos, index),
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
