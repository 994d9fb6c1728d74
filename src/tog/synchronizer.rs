//! Token/tree synchronization
//!
//!     The tokenizer and the parser see the same source but report different things: the
//!     tree has no commas, parens or comments, and its positions are not precise enough to
//!     find a node's tokens. The synchronizer links the two anyway, without trusting
//!     positions, by replaying the order in which the grammar emits tokens.
//!
//!     Each node kind has an emission rule (see `rules`): a list of actions such as "sync the
//!     name `def`", "visit the arguments" or "sync the op `:`". Executing the rules from the
//!     root issues a stream of expected tokens. Each expectation scans forward from the
//!     cursor `px` through the token list:
//!
//!         - a token of the expected kind and value is the match: it is linked to the current
//!           node and becomes the new cursor;
//!         - comments and line breaks on the way are attached to the current node;
//!         - whitespace, commas, semicolons and parens on the way are skipped;
//!         - any other significant token is a mismatch, and the pass fails.
//!
//!     Every token is examined exactly once, so a pass is linear in the number of tokens.
//!
//! Drivers
//!
//!     The rules are data, so they can be executed two ways (see [Driver]). The recursive
//!     driver visits children with native recursion. The iterative driver keeps an explicit
//!     work stack and handles arbitrarily deep trees, e.g. elif chains thousands of levels
//!     long. Both produce the same trace of matched tokens.
//!
//! Output
//!
//!     A successful pass returns a [Links] side-table (parent, children, visit index, owned
//!     tokens and comments per node) and sets the `node` and `statement_node` fields of the
//!     tokens. Nothing is written to the tokens when the pass fails.

pub mod actions;
mod drivers;
pub mod errors;
pub mod links;
mod rules;

use crate::tog::ast::{Ast, NodeId};
use crate::tog::token::{is_significant, Token, TokenKind};
use actions::{name, op, Action, Helper};

pub use errors::{AssignLinksError, SyncContext};
pub use links::{Links, NodeLinks};

/// How emission rules are executed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Driver {
    /// Native recursion, one stack frame per nested node
    Recursive,
    /// An explicit work stack, for any nesting depth
    #[default]
    Iterative,
}

/// Link `tokens` with `tree` using the default driver
pub fn synchronize(
    tokens: &mut [Token],
    tree: &Ast,
    file_name: &str,
) -> Result<Links, AssignLinksError> {
    synchronize_with(tokens, tree, file_name, Driver::default())
}

/// Link `tokens` with `tree`, committing the links only if the whole pass succeeds
pub fn synchronize_with(
    tokens: &mut [Token],
    tree: &Ast,
    file_name: &str,
    driver: Driver,
) -> Result<Links, AssignLinksError> {
    let linkage = TokenOrderGenerator::new(tokens, tree, file_name).create_links(driver)?;
    Ok(linkage.commit(tokens))
}

/// The result of a successful pass, not yet written to the tokens
#[derive(Debug, Clone)]
pub struct Linkage {
    links: Links,
    owners: Vec<Option<NodeId>>,
    statements: Vec<Option<NodeId>>,
}

impl Linkage {
    pub fn links(&self) -> &Links {
        &self.links
    }

    /// The owner assigned to token `index`
    pub fn owner(&self, index: usize) -> Option<NodeId> {
        self.owners.get(index).copied().flatten()
    }

    /// Write the token links and return the node links
    pub fn commit(self, tokens: &mut [Token]) -> Links {
        for (token, owner) in tokens.iter_mut().zip(&self.owners) {
            if owner.is_some() {
                token.node = *owner;
            }
        }
        for (token, statement) in tokens.iter_mut().zip(&self.statements) {
            if statement.is_some() {
                token.statement_node = *statement;
            }
        }
        self.links
    }
}

/// One synchronization pass over one file
pub struct TokenOrderGenerator<'a> {
    tokens: &'a [Token],
    tree: &'a Ast,
    file_name: String,
    /// Index of the last matched token, -1 before the first match
    px: isize,
    /// The node being visited
    node: Option<NodeId>,
    /// Block nesting depth
    level: usize,
    /// Visit counter, the next node_index
    node_index: usize,
    node_stack: Vec<NodeId>,
    begin_end_stack: Vec<&'static str>,
    last_statement_node: Option<NodeId>,
    /// Nearest statement ancestor (or self) of every visited node
    statement_of: Vec<Option<NodeId>>,
    links: Links,
    owners: Vec<Option<NodeId>>,
    statements: Vec<Option<NodeId>>,
}

impl<'a> TokenOrderGenerator<'a> {
    pub fn new(tokens: &'a [Token], tree: &'a Ast, file_name: &str) -> Self {
        TokenOrderGenerator {
            tokens,
            tree,
            file_name: file_name.to_string(),
            px: -1,
            node: None,
            level: 0,
            node_index: 0,
            node_stack: Vec::new(),
            begin_end_stack: Vec::new(),
            last_statement_node: None,
            statement_of: vec![None; tree.len()],
            links: Links::new(tree.len(), tree.root()),
            owners: vec![None; tokens.len()],
            statements: vec![None; tokens.len()],
        }
    }

    /// Run the whole pass: visit the tree, then consume everything up to the endmarker
    pub fn create_links(mut self, driver: Driver) -> Result<Linkage, AssignLinksError> {
        let root = self.tree.root();
        match driver {
            Driver::Recursive => self.visit_recursive(root)?,
            Driver::Iterative => self.visit_iterative(root)?,
        }

        // Trailing comments and blank lines belong to the module
        self.node = Some(root);
        self.sync_token(TokenKind::Endmarker, "")?;

        if let Some(open) = self.node_stack.last() {
            return Err(AssignLinksError::UnpairedVisit {
                context: self.context(self.next_index()),
                expected: "end of tree".to_string(),
                found: self.tree.name(*open).to_string(),
            });
        }

        log::debug!(
            "{}: linked {} nodes, {} matched tokens",
            self.file_name,
            self.node_index,
            self.links.sync_trace().len()
        );
        Ok(Linkage {
            links: self.links,
            owners: self.owners,
            statements: self.statements,
        })
    }

    /// Index of the last matched token, -1 before the first match
    pub fn px(&self) -> isize {
        self.px
    }

    /// Block nesting depth at the cursor
    pub fn level(&self) -> usize {
        self.level
    }

    fn next_index(&self) -> usize {
        (self.px + 1) as usize
    }

    fn current(&self) -> NodeId {
        self.node.unwrap_or_else(|| self.tree.root())
    }

    fn context(&self, token_index: usize) -> SyncContext {
        let (line, line_text) = match self.tokens.get(token_index) {
            Some(token) => (token.line_number, token.line.to_string()),
            None => (0, String::new()),
        };
        SyncContext {
            file_name: self.file_name.clone(),
            line,
            line_text,
            token_index,
            node_stack: self.node_stack.iter().map(|id| self.tree.name(*id)).collect(),
        }
    }

    //
    // Traversal bookkeeping
    //

    fn emission_rule(&self, id: NodeId) -> Result<Vec<Action>, AssignLinksError> {
        rules::emission_rule(self.tree, id).ok_or_else(|| AssignLinksError::NoEmissionRule {
            context: self.context(self.next_index()),
            node: self.tree.name(id),
        })
    }

    fn enter(&mut self, id: NodeId) -> Result<(), AssignLinksError> {
        if self.links.node_index(id).is_some() {
            return Err(AssignLinksError::AlreadyVisited {
                context: self.context(self.next_index()),
                node: self.tree.name(id),
            });
        }
        let parent = self.node;
        let entry = self.links.get_mut(id);
        entry.parent = parent;
        entry.node_index = Some(self.node_index);
        self.node_index += 1;
        if let Some(parent) = parent {
            self.links.get_mut(parent).children.push(id);
        }

        self.statement_of[id.0] = if self.tree.kind(id).is_statement() {
            Some(id)
        } else {
            parent.and_then(|p| self.statement_of[p.0])
        };
        self.node_stack.push(id);
        self.begin_end_stack.push(self.tree.name(id));
        self.node = Some(id);
        Ok(())
    }

    fn leave(&mut self, id: NodeId) -> Result<(), AssignLinksError> {
        let name = self.tree.name(id);
        let innermost = self.node_stack.last().copied();
        match self.begin_end_stack.last() {
            Some(top) if *top == name && innermost == Some(id) => {}
            top => {
                return Err(AssignLinksError::UnpairedVisit {
                    context: self.context(self.next_index()),
                    expected: top.copied().unwrap_or("nothing").to_string(),
                    found: name.to_string(),
                })
            }
        }
        self.begin_end_stack.pop();
        self.node_stack.pop();
        self.node = self.links.parent(id);
        Ok(())
    }

    /// Execute one non-visit, non-helper action
    fn perform(&mut self, action: Action) -> Result<(), AssignLinksError> {
        match action {
            Action::Name(value) => self.sync_name(&value),
            Action::Op(value) => self.sync_op(&value),
            Action::Token(kind, value) => self.sync_token(kind, &value),
            Action::BeginBlock => {
                self.level += 1;
                Ok(())
            }
            Action::EndBlock => {
                self.level = self.level.saturating_sub(1);
                Ok(())
            }
            // Drivers handle these themselves
            Action::Visit(_) | Action::Helper(_) => Ok(()),
        }
    }

    //
    // Look-ahead helpers
    //

    /// Turn a deferred decision into actions, looking at the tokens after `px`
    fn expand_helper(&self, helper: &Helper) -> Result<Vec<Action>, AssignLinksError> {
        let next = self.find_next_significant_token();
        let actions = match helper {
            Helper::IfKeyword => match next {
                Some(token) if token.is_name("elif") => vec![name("elif")],
                _ => vec![name("if")],
            },
            Helper::IfElse(orelse) => {
                let is_elif = next.map_or(false, |t| t.is_name("elif"))
                    && orelse.len() == 1
                    && self.tree.name(orelse[0]) == "If";
                if is_elif {
                    vec![Action::Visit(orelse[0])]
                } else {
                    let mut actions = vec![name("else"), op(":"), Action::BeginBlock];
                    actions.extend(orelse.iter().map(|id| Action::Visit(*id)));
                    actions.push(Action::EndBlock);
                    actions
                }
            }
            Helper::SliceColon => {
                if self.slice_has_second_colon() {
                    vec![op(":")]
                } else {
                    Vec::new()
                }
            }
            Helper::ImportDots(0) => Vec::new(),
            Helper::ImportDots(count) => match next {
                Some(token) if token.is_op("...") && *count >= 3 => {
                    vec![op("..."), Action::Helper(Helper::ImportDots(count - 3))]
                }
                _ => vec![op("."), Action::Helper(Helper::ImportDots(count - 1))],
            },
            Helper::StringTokens => self
                .get_concatenated_string_tokens()?
                .into_iter()
                .map(|i| Action::Token(TokenKind::String, self.tokens[i].value.clone()))
                .collect(),
        };
        Ok(actions)
    }

    /// True if the slice just synced continues with a bare `:`
    fn slice_has_second_colon(&self) -> bool {
        for token in &self.tokens[self.next_index().min(self.tokens.len())..] {
            if token.is_op(",") {
                return false;
            }
            if token.is_significant() {
                return token.is_op(":");
            }
        }
        false
    }

    /// The next significant token after `px`. Never moves `px`.
    pub fn find_next_significant_token(&self) -> Option<&'a Token> {
        let tokens = self.tokens;
        let start = self.next_index().min(tokens.len());
        tokens[start..].iter().find(|t| t.is_significant())
    }

    /// Indices of the run of string tokens starting after `px`.
    ///
    /// Insignificant tokens before the first string are skipped; the run ends at the first
    /// name, number, op or endmarker, or at the end of the logical line.
    pub fn get_concatenated_string_tokens(&self) -> Result<Vec<usize>, AssignLinksError> {
        let mut i = self.next_index();
        while i < self.tokens.len() {
            let token = &self.tokens[i];
            if token.kind == TokenKind::String {
                break;
            }
            if token.is_significant() {
                return Err(AssignLinksError::NotAString {
                    context: self.context(i),
                    found: token.to_string(),
                });
            }
            i += 1;
        }
        if i >= self.tokens.len() {
            return Err(AssignLinksError::EndOfTokens {
                context: self.context(i),
                expected: "string".to_string(),
            });
        }

        let mut run = Vec::new();
        for token in &self.tokens[i..] {
            match token.kind {
                TokenKind::String => run.push(token.index),
                TokenKind::Name
                | TokenKind::Number
                | TokenKind::Op
                | TokenKind::Endmarker
                | TokenKind::Newline
                | TokenKind::Indent
                | TokenKind::Dedent => break,
                _ => {}
            }
        }
        Ok(run)
    }

    //
    // Synchronization primitives
    //

    /// Match the next expected token, linking everything passed on the way.
    ///
    /// Expecting an insignificant token (a comma, a paren) does nothing: such tokens may or
    /// may not be present.
    pub fn sync_token(&mut self, kind: TokenKind, value: &str) -> Result<(), AssignLinksError> {
        if !is_significant(kind, value) {
            return Ok(());
        }
        let tokens = self.tokens;
        let node = self.current();
        let mut i = self.next_index();
        while i < tokens.len() {
            let token = &tokens[i];
            if token.kind == kind && (kind == TokenKind::Number || token.value == value) {
                self.set_links(node, i)?;
                self.px = i as isize;
                self.links.record_match(i);
                return Ok(());
            }
            if token.is_significant() {
                return Err(AssignLinksError::Mismatch {
                    context: self.context(i),
                    expected: format!("{}:{}", kind, value),
                    found: token.to_string(),
                });
            }
            if matches!(
                token.kind,
                TokenKind::Comment | TokenKind::Newline | TokenKind::Nl
            ) {
                self.set_links(node, i)?;
            }
            i += 1;
        }
        Err(AssignLinksError::EndOfTokens {
            context: self.context(i),
            expected: format!("{}:{}", kind, value),
        })
    }

    /// Sync a possibly dotted name: `a.b` is name `a`, op `.`, name `b`
    pub fn sync_name(&mut self, value: &str) -> Result<(), AssignLinksError> {
        for (i, part) in value.split('.').enumerate() {
            if i > 0 {
                self.sync_op(".")?;
            }
            self.sync_token(TokenKind::Name, part)?;
        }
        Ok(())
    }

    pub fn sync_op(&mut self, value: &str) -> Result<(), AssignLinksError> {
        self.sync_token(TokenKind::Op, value)
    }

    /// Link token `index` to `node`, or attach it as a comment or a line break
    fn set_links(&mut self, node: NodeId, index: usize) -> Result<(), AssignLinksError> {
        let tokens = self.tokens;
        let token = &tokens[index];
        match token.kind {
            TokenKind::Comment => {
                self.links.get_mut(node).comment_list.push(index);
                return Ok(());
            }
            TokenKind::Endmarker | TokenKind::Ws => return Ok(()),
            TokenKind::Op if matches!(token.value.as_str(), "," | ";" | "(" | ")") => {
                return Ok(())
            }
            _ => {}
        }

        if let Some(statement) = self.statement_of[node.0] {
            self.last_statement_node = Some(statement);
        }
        if token.node.is_some() || self.owners[index].is_some() {
            return Err(AssignLinksError::AlreadyLinked {
                context: self.context(index),
                found: token.to_string(),
            });
        }
        if token.kind.is_line_break() {
            self.statements[index] = self.last_statement_node;
            return Ok(());
        }
        if token.is_significant() {
            self.owners[index] = Some(node);
            self.links.add_token(node, index);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tog::lexing::make_tokens;
    use crate::tog::parsing::parse;

    fn linked(source: &str) -> (Vec<Token>, Ast, Links) {
        let mut tokens = make_tokens(source).unwrap();
        let tree = parse(source).unwrap();
        let links = synchronize(&mut tokens, &tree, "test.py").unwrap();
        (tokens, tree, links)
    }

    fn owner_name(tokens: &[Token], tree: &Ast, value: &str) -> Option<&'static str> {
        tokens
            .iter()
            .find(|t| t.value == value)
            .and_then(|t| t.node)
            .map(|id| tree.name(id))
    }

    #[test]
    fn test_function_def_ownership() {
        let (tokens, tree, _) = linked("def f(a, b=1):\n    pass\n");
        assert_eq!(owner_name(&tokens, &tree, "def"), Some("FunctionDef"));
        assert_eq!(owner_name(&tokens, &tree, "f"), Some("FunctionDef"));
        assert_eq!(owner_name(&tokens, &tree, ":"), Some("FunctionDef"));
        assert_eq!(owner_name(&tokens, &tree, "a"), Some("arg"));
        assert_eq!(owner_name(&tokens, &tree, "="), Some("arguments"));
        assert_eq!(owner_name(&tokens, &tree, "1"), Some("Constant"));
        assert_eq!(owner_name(&tokens, &tree, "pass"), Some("Pass"));
        for paren in tokens.iter().filter(|t| t.is_op("(") || t.is_op(")")) {
            assert_eq!(paren.node, None);
        }
    }

    #[test]
    fn test_mismatch_is_reported() {
        let source = "klass f():\n    pass\n";
        let mut tokens = make_tokens(source).unwrap();
        let tree = parse("def f():\n    pass\n").unwrap();
        let err = synchronize(&mut tokens, &tree, "bad.py").unwrap_err();
        match &err {
            AssignLinksError::Mismatch {
                context,
                expected,
                found,
            } => {
                assert_eq!(context.line, 1);
                assert_eq!(context.token_index, 0);
                assert_eq!(context.node_stack, vec!["Module", "FunctionDef"]);
                assert_eq!(expected, "name:def");
                assert_eq!(found, "name:klass");
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(tokens.iter().all(|t| t.node.is_none()));
    }

    #[test]
    fn test_failure_links_nothing() {
        // The tree expects `y` where the tokens have `z`, late in the file
        let source = "a = 1\nb = 2\nz = 3\n";
        let mut tokens = make_tokens(source).unwrap();
        let tree = parse("a = 1\nb = 2\ny = 3\n").unwrap();
        assert!(synchronize(&mut tokens, &tree, "t.py").is_err());
        assert!(tokens.iter().all(|t| t.node.is_none() && t.statement_node.is_none()));
    }

    #[test]
    fn test_second_pass_fails() {
        let source = "x = 1\n";
        let mut tokens = make_tokens(source).unwrap();
        let tree = parse(source).unwrap();
        synchronize(&mut tokens, &tree, "t.py").unwrap();
        let err = synchronize(&mut tokens, &tree, "t.py").unwrap_err();
        assert!(matches!(err, AssignLinksError::AlreadyLinked { .. }));
    }

    #[test]
    fn test_comments_and_line_breaks() {
        let (tokens, tree, links) = linked("x = 1  # one\n\n# end\n");
        let root = tree.root();
        let assign = links.children(root)[0];
        let comments: Vec<&str> = tokens
            .iter()
            .filter(|t| t.kind == TokenKind::Comment)
            .map(|t| t.value.as_str())
            .collect();
        assert_eq!(comments, vec!["# one", "# end"]);

        // Nothing syncs line breaks, so the final endmarker scan meets both comments
        assert_eq!(links.comment_list(root).len(), 2);
        for token in tokens.iter().filter(|t| t.kind.is_line_break()) {
            assert_eq!(token.statement_node, Some(assign));
        }
    }

    #[test]
    fn test_elif_and_else_if() {
        let (tokens, tree, _) = linked("if a:\n    pass\nelif b:\n    pass\n");
        assert_eq!(owner_name(&tokens, &tree, "elif"), Some("If"));

        let (tokens, tree, links) = linked("if a:\n    pass\nelse:\n    if b:\n        pass\n");
        assert_eq!(owner_name(&tokens, &tree, "else"), Some("If"));
        let inner_if = tokens.iter().filter(|t| t.is_name("if")).nth(1).unwrap();
        let inner = inner_if.node.unwrap();
        let outer = links.parent(inner).unwrap();
        assert_eq!(tree.name(outer), "If");
        assert_ne!(inner, outer);
    }

    #[test]
    fn test_visit_order_and_parents() {
        let (_, tree, links) = linked("x = f(1)\n");
        let names: Vec<&str> = links.visited().iter().map(|id| tree.name(*id)).collect();
        assert_eq!(
            names,
            vec!["Module", "Assign", "Name", "Call", "Name", "Constant"]
        );
        let root = tree.root();
        assert_eq!(links.parent(root), None);
        assert_eq!(links.node_index(root), Some(0));
    }

    #[test]
    fn test_keyword_has_no_emission_rule() {
        let source = "f(x=1)\n";
        let tokens = make_tokens(source).unwrap();
        let tree = parse(source).unwrap();
        let keyword = tree
            .walk()
            .into_iter()
            .find(|id| tree.name(*id) == "keyword")
            .unwrap();
        let mut generator = TokenOrderGenerator::new(&tokens, &tree, "t.py");
        let err = generator.visit_recursive(keyword).unwrap_err();
        assert!(matches!(
            err,
            AssignLinksError::NoEmissionRule { node: "keyword", .. }
        ));
    }

    #[test]
    fn test_visiting_twice_fails() {
        let source = "x\n";
        let tokens = make_tokens(source).unwrap();
        let tree = parse(source).unwrap();
        let mut generator = TokenOrderGenerator::new(&tokens, &tree, "t.py");
        let name = tree
            .walk()
            .into_iter()
            .find(|id| tree.name(*id) == "Name")
            .unwrap();
        generator.enter(name).unwrap();
        generator.leave(name).unwrap();
        assert!(matches!(
            generator.enter(name),
            Err(AssignLinksError::AlreadyVisited { node: "Name", .. })
        ));
    }

    #[test]
    fn test_find_next_significant_does_not_move() {
        let source = "  # c\nx = 1\n";
        let tokens = make_tokens(source).unwrap();
        let tree = parse(source).unwrap();
        let generator = TokenOrderGenerator::new(&tokens, &tree, "t.py");
        let next = generator.find_next_significant_token().unwrap();
        assert_eq!(next.value, "x");
        assert_eq!(generator.px(), -1);
    }

    #[test]
    fn test_concatenated_strings() {
        let source = "x = ('a'\n     'b')\n";
        let (tokens, tree, _) = linked(source);
        let strings: Vec<&Token> = tokens
            .iter()
            .filter(|t| t.kind == TokenKind::String)
            .collect();
        assert_eq!(strings.len(), 2);
        assert_eq!(strings[0].node, strings[1].node);
        assert_eq!(tree.name(strings[0].node.unwrap()), "Constant");
    }

    #[test]
    fn test_string_runs_stop_at_logical_lines() {
        for source in [
            "'a'\n'b'\n",
            "-'s'\n's'\n",
            "def f():\n    \"\"\"doc\"\"\"\n    'x'\n",
        ] {
            let (tokens, _, _) = linked(source);
            let owners: Vec<_> = tokens
                .iter()
                .filter(|t| t.kind == TokenKind::String)
                .map(|t| t.node)
                .collect();
            assert_eq!(owners.len(), 2, "{}", source);
            assert!(owners.iter().all(Option::is_some), "{}", source);
            assert_ne!(owners[0], owners[1], "{}", source);
        }
    }

    #[test]
    fn test_not_a_string() {
        let source = "x\n";
        let tokens = make_tokens(source).unwrap();
        let tree = parse(source).unwrap();
        let generator = TokenOrderGenerator::new(&tokens, &tree, "t.py");
        assert!(matches!(
            generator.get_concatenated_string_tokens(),
            Err(AssignLinksError::NotAString { .. })
        ));
    }
}
