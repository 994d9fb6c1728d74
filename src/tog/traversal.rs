//! Traversal and finders over linked tokens
//!
//! Everything here works after a successful synchronization: it reads the `parent` and
//! `children` links of [Links] and the `node` field of tokens, never the tree's positions.
//!
//! - [TokenOrderTraverser] visits nodes in token order without recursion.
//! - The finders map nodes to token ranges and back: [find_anchor_token], [tokens_for_node],
//!   [is_ancestor], [nearest_common_ancestor].
//! - [match_parens] extends ranges over parens, which are never owned.
//! - [replace_token] is the primitive rewriters use to edit the token list in place.

use crate::tog::ast::NodeId;
use crate::tog::synchronizer::Links;
use crate::tog::token::{Token, TokenKind};
use std::ops::Range;

/// Visits every linked node in token order (the order the synchronizer entered them).
///
/// Implementors provide [visit](TokenOrderTraverser::visit); [traverse](TokenOrderTraverser::traverse)
/// drives it with an explicit stack, so trees of any depth are fine.
pub trait TokenOrderTraverser {
    fn visit(&mut self, links: &Links, node: NodeId);

    /// Visit the whole tree, returning the node index of the last node visited
    fn traverse(&mut self, links: &Links) -> Option<usize> {
        let root = links.root();
        let mut last_node_index = None;
        // (node, index of the next child to descend into)
        let mut stack: Vec<(NodeId, usize)> = Vec::new();
        if links.node_index(root).is_some() {
            self.visit(links, root);
            last_node_index = links.node_index(root);
            stack.push((root, 0));
        }
        while let Some((node, next_child)) = stack.pop() {
            let children = links.children(node);
            if next_child < children.len() {
                stack.push((node, next_child + 1));
                let child = children[next_child];
                self.visit(links, child);
                last_node_index = links.node_index(child);
                stack.push((child, 0));
            }
        }
        last_node_index
    }
}

/// True if `node` is the owner of `token` or one of the owner's ancestors.
///
/// Unowned tokens (parens, commas, killed tokens) have no ancestors.
pub fn is_ancestor(links: &Links, node: NodeId, token: &Token) -> bool {
    let mut current = token.node;
    while let Some(id) = current {
        if id == node {
            return true;
        }
        current = links.parent(id);
    }
    false
}

/// The deepest node that is an ancestor of (or equal to) both nodes
pub fn nearest_common_ancestor(links: &Links, node1: NodeId, node2: NodeId) -> Option<NodeId> {
    let path1 = path_from_root(links, node1);
    let path2 = path_from_root(links, node2);
    path1
        .iter()
        .zip(&path2)
        .take_while(|(a, b)| a == b)
        .last()
        .map(|(a, _)| *a)
}

fn path_from_root(links: &Links, node: NodeId) -> Vec<NodeId> {
    let mut path = vec![node];
    let mut current = links.parent(node);
    while let Some(id) = current {
        path.push(id);
        current = links.parent(id);
    }
    path.reverse();
    path
}

/// Index of a token owned by `node` or by one of its descendants.
///
/// Nodes such as `Tuple` or `Expr` own no tokens themselves, so the search falls back to
/// descendants in visit order.
pub fn find_anchor_token(links: &Links, tokens: &[Token], node: NodeId) -> Option<usize> {
    let mut pending = vec![node];
    while let Some(id) = pending.pop() {
        let anchor = links
            .token_list(id)
            .iter()
            .copied()
            .find(|i| tokens.get(*i).map_or(false, |t| is_ancestor(links, node, t)));
        if anchor.is_some() {
            return anchor;
        }
        pending.extend(links.children(id).iter().rev());
    }
    None
}

/// The contiguous range of tokens that descend from `node`, parens included.
///
/// Starting at the anchor token, the range grows in both directions over tokens owned by
/// descendants of `node`; unowned tokens in between are taken along, and the range stops at
/// the first token owned by an outsider. Open parens inside the range are then closed.
pub fn tokens_for_node(links: &Links, tokens: &[Token], node: NodeId) -> Option<Range<usize>> {
    let anchor = find_anchor_token(links, tokens, node)?;

    let mut first = anchor;
    for i in (0..anchor).rev() {
        if tokens[i].node.is_some() {
            if is_ancestor(links, node, &tokens[i]) {
                first = i;
            } else {
                break;
            }
        }
    }

    let mut last = anchor;
    for (i, token) in tokens.iter().enumerate().skip(anchor + 1) {
        if token.node.is_some() {
            if is_ancestor(links, node, token) {
                last = i;
            } else {
                break;
            }
        }
    }

    let last = match_parens(first, last, tokens);
    Some(first..last + 1)
}

/// Extend `tokens[i..=j]` past the `)` tokens that close its open parens. Returns the new `j`.
pub fn match_parens(i: usize, j: usize, tokens: &[Token]) -> usize {
    if j >= tokens.len() {
        return tokens.len().saturating_sub(1);
    }
    let mut level: i64 = 0;
    for token in &tokens[i..=j] {
        if token.is_op("(") {
            level += 1;
        } else if token.is_op(")") {
            level -= 1;
        }
    }

    let mut j = j;
    while level > 0 && j + 1 < tokens.len() {
        let token = &tokens[j + 1];
        if token.is_op(")") {
            level -= 1;
        } else if token.is_op("(") {
            level += 1;
        } else if token.is_significant() {
            break;
        }
        j += 1;
    }
    if level != 0 {
        log::warn!(
            "match_parens: unmatched parens in tokens {}..={} (level {})",
            i,
            j,
            level
        );
    }
    j
}

/// Give `token` a new kind and value, dropping its owner. The endmarker and killed tokens
/// are left alone.
pub fn replace_token(token: &mut Token, kind: TokenKind, value: &str) {
    if matches!(token.kind, TokenKind::Endmarker | TokenKind::Killed) {
        return;
    }
    token.kind = kind;
    token.value = value.to_string();
    token.node = None;
}
