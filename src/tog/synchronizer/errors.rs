//! Synchronization errors
//!
//! Every failure carries a [SyncContext]: where in the file and in the token list the
//! synchronizer stood, and which nodes it was inside. A failure means the tree and the
//! tokens disagree, so the context is the whole diagnosis.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncContext {
    pub file_name: String,
    /// Line number of the offending token, 0 at end of tokens
    pub line: usize,
    pub line_text: String,
    pub token_index: usize,
    /// Class names of the nodes being visited, outermost first
    pub node_stack: Vec<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssignLinksError {
    /// A significant token other than the expected one came first
    Mismatch {
        context: SyncContext,
        expected: String,
        found: String,
    },
    /// The expected token never came
    EndOfTokens {
        context: SyncContext,
        expected: String,
    },
    /// A token already has an owner, from this pass or an earlier one
    AlreadyLinked {
        context: SyncContext,
        found: String,
    },
    /// A string constant did not start with a string token
    NotAString {
        context: SyncContext,
        found: String,
    },
    /// A node kind that is only handled by its parent was visited
    NoEmissionRule {
        context: SyncContext,
        node: &'static str,
    },
    /// Leaving a node that is not the innermost one
    UnpairedVisit {
        context: SyncContext,
        expected: String,
        found: String,
    },
    /// A node was visited twice
    AlreadyVisited {
        context: SyncContext,
        node: &'static str,
    },
}

impl AssignLinksError {
    pub fn context(&self) -> &SyncContext {
        match self {
            AssignLinksError::Mismatch { context, .. }
            | AssignLinksError::EndOfTokens { context, .. }
            | AssignLinksError::AlreadyLinked { context, .. }
            | AssignLinksError::NotAString { context, .. }
            | AssignLinksError::NoEmissionRule { context, .. }
            | AssignLinksError::UnpairedVisit { context, .. }
            | AssignLinksError::AlreadyVisited { context, .. } => context,
        }
    }

    fn summary(&self) -> String {
        match self {
            AssignLinksError::Mismatch {
                expected, found, ..
            } => format!("looking for: {}\n      found: {}", expected, found),
            AssignLinksError::EndOfTokens { expected, .. } => {
                format!("looking for: {}\n      found: end of token list", expected)
            }
            AssignLinksError::AlreadyLinked { found, .. } => {
                format!("token is already linked: {}", found)
            }
            AssignLinksError::NotAString { found, .. } => {
                format!("expected a string token, found: {}", found)
            }
            AssignLinksError::NoEmissionRule { node, .. } => {
                format!("no emission rule for {} nodes", node)
            }
            AssignLinksError::UnpairedVisit {
                expected, found, ..
            } => format!("unpaired visit: leaving {}, innermost is {}", found, expected),
            AssignLinksError::AlreadyVisited { node, .. } => {
                format!("{} node visited twice", node)
            }
        }
    }
}

impl fmt::Display for AssignLinksError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let context = self.context();
        writeln!(f, "       file: {}", context.file_name)?;
        if context.line > 0 {
            let line = format!("line {}:", context.line);
            writeln!(f, "{:>12} {}", line, context.line_text.trim())?;
        }
        writeln!(f, "token index: {}", context.token_index)?;
        writeln!(f, "      nodes: {}", context.node_stack.join(" > "))?;
        write!(f, "{}", self.summary())
    }
}

impl std::error::Error for AssignLinksError {}
