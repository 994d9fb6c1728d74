//! Statement grammar

use super::parser::{ParseResult, Parser};
use crate::tog::ast::{NodeId, NodeKind, Operator, Position};
use crate::tog::token::{Token, TokenKind};

const AUGMENTED_ASSIGNMENTS: &[&str] = &[
    "+=", "-=", "*=", "/=", "//=", "%=", "@=", "&=", "|=", "^=", ">>=", "<<=", "**=",
];

impl<'t> Parser<'t> {
    pub(crate) fn parse_module(&mut self) -> ParseResult<NodeId> {
        let mut body = Vec::new();
        while !self.at_kind(TokenKind::Endmarker) {
            if self.at_kind(TokenKind::Indent) {
                return Err(self.error("unexpected indent"));
            }
            body.extend(self.parse_statement()?);
        }
        let module = self.add(NodeKind::Module { body }, Position::new(1, 0));
        self.ast.set_root(module);
        Ok(module)
    }

    /// One statement line. Simple statements separated by `;` come back as several nodes.
    fn parse_statement(&mut self) -> ParseResult<Vec<NodeId>> {
        let token = self.peek()?;
        if token.is_op("@") {
            return Ok(vec![self.parse_decorated()?]);
        }
        if token.kind == TokenKind::Name {
            let compound = match token.value.as_str() {
                "def" => Some(self.parse_function_def(Vec::new(), None)?),
                "class" => Some(self.parse_class_def(Vec::new())?),
                "if" => Some(self.parse_if()?),
                "while" => Some(self.parse_while()?),
                "for" => Some(self.parse_for(None)?),
                "try" => Some(self.parse_try()?),
                "with" => Some(self.parse_with(None)?),
                "async" => Some(self.parse_async(Vec::new())?),
                _ => None,
            };
            if let Some(id) = compound {
                return Ok(vec![id]);
            }
        }
        self.parse_simple_statements()
    }

    fn parse_simple_statements(&mut self) -> ParseResult<Vec<NodeId>> {
        let mut statements = vec![self.parse_small_statement()?];
        while self.eat_op(";")? {
            if self.at_kind(TokenKind::Newline) {
                break;
            }
            statements.push(self.parse_small_statement()?);
        }
        self.expect_kind(TokenKind::Newline)?;
        Ok(statements)
    }

    /// The suite after a compound statement header's colon
    fn parse_block(&mut self) -> ParseResult<Vec<NodeId>> {
        self.expect_op(":")?;
        if !self.at_kind(TokenKind::Newline) {
            return self.parse_simple_statements();
        }
        self.advance()?;
        self.expect_kind(TokenKind::Indent)?;
        let mut body = Vec::new();
        while !self.at_kind(TokenKind::Dedent) {
            if self.at_kind(TokenKind::Endmarker) {
                return Err(self.error("expected a dedent"));
            }
            body.extend(self.parse_statement()?);
        }
        self.advance()?;
        Ok(body)
    }

    fn parse_else_block(&mut self) -> ParseResult<Vec<NodeId>> {
        if self.eat_keyword("else")? {
            return self.parse_block();
        }
        Ok(Vec::new())
    }

    fn parse_decorated(&mut self) -> ParseResult<NodeId> {
        let mut decorators = Vec::new();
        while self.eat_op("@")? {
            decorators.push(self.parse_named_test()?);
            self.expect_kind(TokenKind::Newline)?;
        }
        match self.peek()?.value.as_str() {
            "def" => self.parse_function_def(decorators, None),
            "class" => self.parse_class_def(decorators),
            "async" => self.parse_async(decorators),
            _ => Err(self.error("expected a function or class after decorators")),
        }
    }

    fn parse_async(&mut self, decorators: Vec<NodeId>) -> ParseResult<NodeId> {
        let async_token = self.expect_keyword("async")?;
        match self.peek()?.value.as_str() {
            "def" => self.parse_function_def(decorators, Some(async_token)),
            "for" if decorators.is_empty() => self.parse_for(Some(async_token)),
            "with" if decorators.is_empty() => self.parse_with(Some(async_token)),
            _ => Err(self.error("expected 'def', 'for' or 'with' after 'async'")),
        }
    }

    fn parse_function_def(
        &mut self,
        decorator_list: Vec<NodeId>,
        async_token: Option<&'t Token>,
    ) -> ParseResult<NodeId> {
        let def = self.expect_keyword("def")?;
        let start = Self::position_of(async_token.unwrap_or(def));
        let (name, _) = self.expect_identifier()?;
        self.expect_op("(")?;
        let args = self.parse_parameters(")", true)?;
        self.expect_op(")")?;
        let returns = if self.eat_op("->")? {
            Some(self.parse_test()?)
        } else {
            None
        };
        let body = self.parse_block()?;
        Ok(self.add(
            NodeKind::FunctionDef {
                is_async: async_token.is_some(),
                name,
                args,
                body,
                decorator_list,
                returns,
            },
            start,
        ))
    }

    /// Parameter list up to (not including) `closing`
    pub(crate) fn parse_parameters(&mut self, closing: &str, annotations: bool) -> ParseResult<NodeId> {
        let start = self.current_position()?;
        let mut posonlyargs = Vec::new();
        let mut args = Vec::new();
        let mut defaults = Vec::new();
        let mut vararg = None;
        let mut kwonlyargs = Vec::new();
        let mut kw_defaults = Vec::new();
        let mut kwarg = None;
        let mut seen_star = false;

        while !self.at_op(closing) {
            if self.eat_op("/")? {
                posonlyargs.append(&mut args);
            } else if self.eat_op("*")? {
                seen_star = true;
                if !self.at_op(",") && !self.at_op(closing) {
                    vararg = Some(self.parse_arg(annotations)?);
                }
            } else if self.eat_op("**")? {
                kwarg = Some(self.parse_arg(annotations)?);
            } else {
                let arg = self.parse_arg(annotations)?;
                let default = if self.eat_op("=")? {
                    Some(self.parse_test()?)
                } else {
                    None
                };
                if seen_star {
                    kwonlyargs.push(arg);
                    kw_defaults.push(default);
                } else {
                    args.push(arg);
                    if let Some(default) = default {
                        defaults.push(default);
                    } else if !defaults.is_empty() {
                        return Err(self.error("non-default argument follows default argument"));
                    }
                }
            }
            if !self.eat_op(",")? {
                break;
            }
        }

        Ok(self.add(
            NodeKind::Arguments {
                posonlyargs,
                args,
                vararg,
                kwonlyargs,
                kw_defaults,
                kwarg,
                defaults,
            },
            start,
        ))
    }

    fn parse_arg(&mut self, annotations: bool) -> ParseResult<NodeId> {
        let (arg, token) = self.expect_identifier()?;
        let annotation = if annotations && self.eat_op(":")? {
            Some(self.parse_test()?)
        } else {
            None
        };
        Ok(self.add(NodeKind::Arg { arg, annotation }, Self::position_of(token)))
    }

    fn parse_class_def(&mut self, decorator_list: Vec<NodeId>) -> ParseResult<NodeId> {
        let class = self.expect_keyword("class")?;
        let (name, _) = self.expect_identifier()?;
        let (bases, keywords) = if self.at_op("(") {
            let open = self.advance()?;
            self.parse_call_arguments(open)?
        } else {
            (Vec::new(), Vec::new())
        };
        let body = self.parse_block()?;
        Ok(self.add(
            NodeKind::ClassDef {
                name,
                bases,
                keywords,
                body,
                decorator_list,
            },
            Self::position_of(class),
        ))
    }

    /// `if`/`elif`/`else`. The elif chain becomes nested `If` nodes, built bottom-up so that
    /// long chains do not recurse.
    fn parse_if(&mut self) -> ParseResult<NodeId> {
        let mut clauses = Vec::new();
        let token = self.expect_keyword("if")?;
        let test = self.parse_named_test()?;
        let body = self.parse_block()?;
        clauses.push((Self::position_of(token), test, body));

        while self.at_keyword("elif") {
            let token = self.advance()?;
            let test = self.parse_named_test()?;
            let body = self.parse_block()?;
            clauses.push((Self::position_of(token), test, body));
        }

        let mut orelse = self.parse_else_block()?;
        let mut last = None;
        for (position, test, body) in clauses.into_iter().rev() {
            let id = self.add(NodeKind::If { test, body, orelse }, position);
            orelse = vec![id];
            last = Some(id);
        }
        last.ok_or_else(|| self.error("empty if statement"))
    }

    fn parse_while(&mut self) -> ParseResult<NodeId> {
        let token = self.expect_keyword("while")?;
        let test = self.parse_named_test()?;
        let body = self.parse_block()?;
        let orelse = self.parse_else_block()?;
        Ok(self.add(NodeKind::While { test, body, orelse }, Self::position_of(token)))
    }

    fn parse_for(&mut self, async_token: Option<&'t Token>) -> ParseResult<NodeId> {
        let token = self.expect_keyword("for")?;
        let start = Self::position_of(async_token.unwrap_or(token));
        let target = self.parse_exprlist()?;
        self.expect_keyword("in")?;
        let iter = self.parse_testlist()?;
        let body = self.parse_block()?;
        let orelse = self.parse_else_block()?;
        Ok(self.add(
            NodeKind::For {
                is_async: async_token.is_some(),
                target,
                iter,
                body,
                orelse,
            },
            start,
        ))
    }

    fn parse_try(&mut self) -> ParseResult<NodeId> {
        let token = self.expect_keyword("try")?;
        let body = self.parse_block()?;
        let mut handlers = Vec::new();
        while self.at_keyword("except") {
            let except = self.advance()?;
            let (type_, name) = if self.at_op(":") {
                (None, None)
            } else {
                let type_ = self.parse_test()?;
                let name = if self.eat_keyword("as")? {
                    Some(self.expect_identifier()?.0)
                } else {
                    None
                };
                (Some(type_), name)
            };
            let body = self.parse_block()?;
            handlers.push(self.add(
                NodeKind::ExceptHandler { type_, name, body },
                Self::position_of(except),
            ));
        }
        let orelse = self.parse_else_block()?;
        let finalbody = if self.eat_keyword("finally")? {
            self.parse_block()?
        } else {
            Vec::new()
        };
        if handlers.is_empty() && finalbody.is_empty() {
            return Err(self.error("expected 'except' or 'finally'"));
        }
        Ok(self.add(
            NodeKind::Try {
                body,
                handlers,
                orelse,
                finalbody,
            },
            Self::position_of(token),
        ))
    }

    fn parse_with(&mut self, async_token: Option<&'t Token>) -> ParseResult<NodeId> {
        let token = self.expect_keyword("with")?;
        let start = Self::position_of(async_token.unwrap_or(token));
        let mut items = Vec::new();
        loop {
            let context_expr = self.parse_test()?;
            let optional_vars = if self.eat_keyword("as")? {
                Some(self.parse_expr()?)
            } else {
                None
            };
            let position = self.position(context_expr);
            items.push(self.add(
                NodeKind::WithItem {
                    context_expr,
                    optional_vars,
                },
                position,
            ));
            if !self.eat_op(",")? {
                break;
            }
        }
        let body = self.parse_block()?;
        Ok(self.add(
            NodeKind::With {
                is_async: async_token.is_some(),
                items,
                body,
            },
            start,
        ))
    }

    fn parse_small_statement(&mut self) -> ParseResult<NodeId> {
        let token = self.peek()?;
        let start = Self::position_of(token);
        if token.kind == TokenKind::Name {
            match token.value.as_str() {
                "pass" => {
                    self.advance()?;
                    return Ok(self.add(NodeKind::Pass, start));
                }
                "break" => {
                    self.advance()?;
                    return Ok(self.add(NodeKind::Break, start));
                }
                "continue" => {
                    self.advance()?;
                    return Ok(self.add(NodeKind::Continue, start));
                }
                "return" => {
                    self.advance()?;
                    let value = if self.can_start_expression() {
                        Some(self.parse_testlist_star_expr()?)
                    } else {
                        None
                    };
                    return Ok(self.add(NodeKind::Return { value }, start));
                }
                "del" => {
                    self.advance()?;
                    let mut targets = vec![self.parse_expr_or_star()?];
                    while self.eat_op(",")? {
                        if !self.can_start_expression() {
                            break;
                        }
                        targets.push(self.parse_expr_or_star()?);
                    }
                    return Ok(self.add(NodeKind::Delete { targets }, start));
                }
                "raise" => {
                    self.advance()?;
                    let mut exc = None;
                    let mut cause = None;
                    if self.can_start_expression() {
                        exc = Some(self.parse_test()?);
                        if self.eat_keyword("from")? {
                            cause = Some(self.parse_test()?);
                        }
                    }
                    return Ok(self.add(NodeKind::Raise { exc, cause }, start));
                }
                "global" | "nonlocal" => {
                    let keyword = self.advance()?;
                    let mut names = vec![self.expect_identifier()?.0];
                    while self.eat_op(",")? {
                        names.push(self.expect_identifier()?.0);
                    }
                    let kind = if keyword.value == "global" {
                        NodeKind::Global { names }
                    } else {
                        NodeKind::Nonlocal { names }
                    };
                    return Ok(self.add(kind, start));
                }
                "assert" => {
                    self.advance()?;
                    let test = self.parse_test()?;
                    let msg = if self.eat_op(",")? {
                        Some(self.parse_test()?)
                    } else {
                        None
                    };
                    return Ok(self.add(NodeKind::Assert { test, msg }, start));
                }
                "import" => return self.parse_import(),
                "from" => return self.parse_import_from(),
                _ => {}
            }
        }
        self.parse_expression_statement()
    }

    fn parse_import(&mut self) -> ParseResult<NodeId> {
        let token = self.expect_keyword("import")?;
        let mut names = vec![self.parse_alias(true)?];
        while self.eat_op(",")? {
            names.push(self.parse_alias(true)?);
        }
        Ok(self.add(NodeKind::Import { names }, Self::position_of(token)))
    }

    fn parse_import_from(&mut self) -> ParseResult<NodeId> {
        let token = self.expect_keyword("from")?;
        let mut level = 0;
        loop {
            if self.eat_op(".")? {
                level += 1;
            } else if self.eat_op("...")? {
                level += 3;
            } else {
                break;
            }
        }
        let module = if self.at_keyword("import") {
            None
        } else {
            Some(self.dotted_name()?.0)
        };
        if module.is_none() && level == 0 {
            return Err(self.error("expected a module name"));
        }
        self.expect_keyword("import")?;
        let mut names = Vec::new();
        if self.at_op("*") {
            let star = self.advance()?;
            names.push(self.add(
                NodeKind::Alias {
                    name: "*".to_string(),
                    asname: None,
                },
                Self::position_of(star),
            ));
        } else {
            let parenthesized = self.eat_op("(")?;
            names.push(self.parse_alias(false)?);
            while self.eat_op(",")? {
                if parenthesized && self.at_op(")") {
                    break;
                }
                names.push(self.parse_alias(false)?);
            }
            if parenthesized {
                self.expect_op(")")?;
            }
        }
        Ok(self.add(
            NodeKind::ImportFrom {
                module,
                names,
                level,
            },
            Self::position_of(token),
        ))
    }

    fn parse_alias(&mut self, dotted: bool) -> ParseResult<NodeId> {
        let (name, token) = if dotted {
            self.dotted_name()?
        } else {
            self.expect_identifier()?
        };
        let asname = if self.eat_keyword("as")? {
            Some(self.expect_identifier()?.0)
        } else {
            None
        };
        Ok(self.add(NodeKind::Alias { name, asname }, Self::position_of(token)))
    }

    fn parse_expression_statement(&mut self) -> ParseResult<NodeId> {
        let start = self.current_position()?;
        let first = self.parse_yield_or_testlist()?;

        if self.eat_op(":")? {
            let annotation = self.parse_test()?;
            let value = if self.eat_op("=")? {
                Some(self.parse_yield_or_testlist()?)
            } else {
                None
            };
            return Ok(self.add(
                NodeKind::AnnAssign {
                    target: first,
                    annotation,
                    value,
                },
                start,
            ));
        }

        let token = self.peek()?;
        if token.kind == TokenKind::Op && AUGMENTED_ASSIGNMENTS.contains(&token.value.as_str()) {
            self.advance()?;
            let op = Operator::from_augmented(&token.value)
                .ok_or_else(|| self.error("invalid augmented assignment"))?;
            let value = self.parse_yield_or_testlist()?;
            return Ok(self.add(
                NodeKind::AugAssign {
                    target: first,
                    op,
                    value,
                },
                start,
            ));
        }

        if self.at_op("=") {
            let mut parts = vec![first];
            while self.eat_op("=")? {
                parts.push(self.parse_yield_or_testlist()?);
            }
            let value = parts.pop().ok_or_else(|| self.error("missing value"))?;
            return Ok(self.add(
                NodeKind::Assign {
                    targets: parts,
                    value,
                },
                start,
            ));
        }

        Ok(self.add(NodeKind::Expr { value: first }, start))
    }

    fn parse_yield_or_testlist(&mut self) -> ParseResult<NodeId> {
        if self.at_keyword("yield") {
            return self.parse_yield();
        }
        self.parse_testlist_star_expr()
    }
}
