//! The two ways of executing emission rules
//!
//! A visit fetches the node's rule before entering it (so a kind without a rule fails before
//! any bookkeeping), enters, executes the actions in order and leaves. Helpers expand into
//! more actions at the moment they are reached.

use super::actions::Action;
use super::errors::AssignLinksError;
use super::TokenOrderGenerator;
use crate::tog::ast::NodeId;

enum Work {
    Do(Action),
    Leave(NodeId),
}

impl TokenOrderGenerator<'_> {
    pub(super) fn visit_recursive(&mut self, id: NodeId) -> Result<(), AssignLinksError> {
        let actions = self.emission_rule(id)?;
        self.enter(id)?;
        self.run_recursive(actions)?;
        self.leave(id)
    }

    fn run_recursive(&mut self, actions: Vec<Action>) -> Result<(), AssignLinksError> {
        for action in actions {
            match action {
                Action::Visit(child) => self.visit_recursive(child)?,
                Action::Helper(helper) => {
                    let expanded = self.expand_helper(&helper)?;
                    self.run_recursive(expanded)?;
                }
                other => self.perform(other)?,
            }
        }
        Ok(())
    }

    /// Same order as [visit_recursive](Self::visit_recursive), without native recursion.
    ///
    /// The stack holds what is left to do, innermost work on top: a node's actions are
    /// pushed in reverse above its `Leave`, and a helper's expansion replaces the helper.
    pub(super) fn visit_iterative(&mut self, root: NodeId) -> Result<(), AssignLinksError> {
        let mut work = vec![Work::Do(Action::Visit(root))];
        while let Some(item) = work.pop() {
            match item {
                Work::Leave(id) => self.leave(id)?,
                Work::Do(Action::Visit(id)) => {
                    let actions = self.emission_rule(id)?;
                    self.enter(id)?;
                    work.push(Work::Leave(id));
                    work.extend(actions.into_iter().rev().map(Work::Do));
                }
                Work::Do(Action::Helper(helper)) => {
                    let expanded = self.expand_helper(&helper)?;
                    work.extend(expanded.into_iter().rev().map(Work::Do));
                }
                Work::Do(other) => self.perform(other)?,
            }
        }
        Ok(())
    }
}
