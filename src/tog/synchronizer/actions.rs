//! Emission actions
//!
//! An emission rule describes a node as a flat list of actions. Both drivers consume the
//! same lists; only the way they sequence nested visits differs.

use crate::tog::ast::NodeId;
use crate::tog::token::TokenKind;

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Visit a child node
    Visit(NodeId),
    /// Sync a name, splitting dotted names
    Name(String),
    Op(String),
    Token(TokenKind, String),
    /// A decision that depends on the tokens, evaluated when reached
    Helper(Helper),
    BeginBlock,
    EndBlock,
}

/// Look-ahead decisions. They expand into more actions at the moment the driver reaches
/// them, when `px` is known.
#[derive(Debug, Clone, PartialEq)]
pub enum Helper {
    /// `if` or `elif`, whichever comes next
    IfKeyword,
    /// The `orelse` of an `If`: an `elif` visits the nested `If` directly, otherwise `else:`
    IfElse(Vec<NodeId>),
    /// The optional second colon of a slice without a step
    SliceColon,
    /// Leading dots of a relative import, `.` and `...` tokens mixed
    ImportDots(usize),
    /// The run of string tokens of a string constant
    StringTokens,
}

pub(crate) fn name(value: impl Into<String>) -> Action {
    Action::Name(value.into())
}

pub(crate) fn op(value: impl Into<String>) -> Action {
    Action::Op(value.into())
}

pub(crate) fn visit_all(ids: &[NodeId]) -> impl Iterator<Item = Action> + '_ {
    ids.iter().map(|id| Action::Visit(*id))
}
