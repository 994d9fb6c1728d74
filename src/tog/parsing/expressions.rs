//! Expression grammar, from the loosest binding level to atoms

use super::parser::{is_keyword, ParseResult, Parser};
use crate::tog::ast::{
    BoolOperator, CmpOperator, ConstantValue, NodeId, NodeKind, Operator, UnaryOperator,
};
use crate::tog::token::{Token, TokenKind};

impl<'t> Parser<'t> {
    /// `a, *b, c` as a tuple, or a single expression without a trailing comma
    pub(crate) fn parse_testlist_star_expr(&mut self) -> ParseResult<NodeId> {
        self.parse_sequence(Self::parse_test_or_star)
    }

    /// Like [Self::parse_testlist_star_expr] without starred elements
    pub(crate) fn parse_testlist(&mut self) -> ParseResult<NodeId> {
        self.parse_sequence(Self::parse_test)
    }

    /// Targets of `for` loops and comprehensions. Stops before `in`.
    pub(crate) fn parse_exprlist(&mut self) -> ParseResult<NodeId> {
        self.parse_sequence(Self::parse_expr_or_star)
    }

    fn parse_sequence(
        &mut self,
        element: fn(&mut Self) -> ParseResult<NodeId>,
    ) -> ParseResult<NodeId> {
        let start = self.current_position()?;
        let first = element(self)?;
        if !self.at_op(",") {
            return Ok(first);
        }
        let mut elts = vec![first];
        while self.eat_op(",")? {
            if !self.can_start_expression() {
                break;
            }
            elts.push(element(self)?);
        }
        Ok(self.add(NodeKind::Tuple { elts }, start))
    }

    pub(crate) fn parse_test_or_star(&mut self) -> ParseResult<NodeId> {
        if self.at_op("*") {
            return self.parse_starred();
        }
        self.parse_named_test()
    }

    pub(crate) fn parse_expr_or_star(&mut self) -> ParseResult<NodeId> {
        if self.at_op("*") {
            return self.parse_starred();
        }
        self.parse_expr()
    }

    fn parse_starred(&mut self) -> ParseResult<NodeId> {
        let star = self.expect_op("*")?;
        let value = self.parse_expr()?;
        Ok(self.add(NodeKind::Starred { value }, Self::position_of(star)))
    }

    /// A test, or `name := test`
    pub(crate) fn parse_named_test(&mut self) -> ParseResult<NodeId> {
        let token = self.peek()?;
        if token.kind == TokenKind::Name && !is_keyword(&token.value) && self.next_is_op(":=") {
            self.advance()?;
            self.advance()?;
            let position = Self::position_of(token);
            let target = self.add(
                NodeKind::Name {
                    id: token.value.clone(),
                },
                position,
            );
            let value = self.parse_test()?;
            return Ok(self.add(NodeKind::NamedExpr { target, value }, position));
        }
        self.parse_test()
    }

    pub(crate) fn parse_test(&mut self) -> ParseResult<NodeId> {
        if self.at_keyword("lambda") {
            return self.parse_lambda();
        }
        let body = self.parse_or_test()?;
        if self.at_keyword("if") {
            self.advance()?;
            let test = self.parse_or_test()?;
            self.expect_keyword("else")?;
            let orelse = self.parse_test()?;
            let position = self.position(body);
            return Ok(self.add(NodeKind::IfExp { test, body, orelse }, position));
        }
        Ok(body)
    }

    fn parse_lambda(&mut self) -> ParseResult<NodeId> {
        let token = self.expect_keyword("lambda")?;
        let args = self.parse_parameters(":", false)?;
        self.expect_op(":")?;
        let body = self.parse_test()?;
        Ok(self.add(NodeKind::Lambda { args, body }, Self::position_of(token)))
    }

    pub(crate) fn parse_yield(&mut self) -> ParseResult<NodeId> {
        let token = self.expect_keyword("yield")?;
        let position = Self::position_of(token);
        if self.eat_keyword("from")? {
            let value = self.parse_test()?;
            return Ok(self.add(NodeKind::YieldFrom { value }, position));
        }
        let value = if self.can_start_expression() {
            Some(self.parse_testlist_star_expr()?)
        } else {
            None
        };
        Ok(self.add(NodeKind::Yield { value }, position))
    }

    pub(crate) fn parse_or_test(&mut self) -> ParseResult<NodeId> {
        self.parse_bool_op("or", BoolOperator::Or, Self::parse_and_test)
    }

    fn parse_and_test(&mut self) -> ParseResult<NodeId> {
        self.parse_bool_op("and", BoolOperator::And, Self::parse_not_test)
    }

    fn parse_bool_op(
        &mut self,
        keyword: &str,
        op: BoolOperator,
        operand: fn(&mut Self) -> ParseResult<NodeId>,
    ) -> ParseResult<NodeId> {
        let first = operand(self)?;
        if !self.at_keyword(keyword) {
            return Ok(first);
        }
        let mut values = vec![first];
        while self.eat_keyword(keyword)? {
            values.push(operand(self)?);
        }
        let position = self.position(first);
        Ok(self.add(NodeKind::BoolOp { op, values }, position))
    }

    fn parse_not_test(&mut self) -> ParseResult<NodeId> {
        if self.at_keyword("not") {
            let token = self.advance()?;
            let operand = self.parse_not_test()?;
            return Ok(self.add(
                NodeKind::UnaryOp {
                    op: UnaryOperator::Not,
                    operand,
                },
                Self::position_of(token),
            ));
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> ParseResult<NodeId> {
        let left = self.parse_expr()?;
        let mut ops = Vec::new();
        let mut comparators = Vec::new();
        while let Some(op) = self.comparison_operator()? {
            ops.push(op);
            comparators.push(self.parse_expr()?);
        }
        if ops.is_empty() {
            return Ok(left);
        }
        let position = self.position(left);
        Ok(self.add(
            NodeKind::Compare {
                left,
                ops,
                comparators,
            },
            position,
        ))
    }

    /// Consume a comparison operator if one is next
    fn comparison_operator(&mut self) -> ParseResult<Option<CmpOperator>> {
        let token = self.peek()?;
        let op = match (token.kind, token.value.as_str()) {
            (TokenKind::Op, "==") => CmpOperator::Eq,
            (TokenKind::Op, "!=") => CmpOperator::NotEq,
            (TokenKind::Op, "<") => CmpOperator::Lt,
            (TokenKind::Op, "<=") => CmpOperator::LtE,
            (TokenKind::Op, ">") => CmpOperator::Gt,
            (TokenKind::Op, ">=") => CmpOperator::GtE,
            (TokenKind::Name, "in") => CmpOperator::In,
            (TokenKind::Name, "not") if self.next_is_keyword("in") => {
                self.advance()?;
                CmpOperator::NotIn
            }
            (TokenKind::Name, "is") => {
                if self.next_is_keyword("not") {
                    self.advance()?;
                    CmpOperator::IsNot
                } else {
                    CmpOperator::Is
                }
            }
            _ => return Ok(None),
        };
        self.advance()?;
        Ok(Some(op))
    }

    /// A bitwise-or expression: everything below comparisons
    pub(crate) fn parse_expr(&mut self) -> ParseResult<NodeId> {
        self.parse_binary(&["|"], Self::parse_xor)
    }

    fn parse_xor(&mut self) -> ParseResult<NodeId> {
        self.parse_binary(&["^"], Self::parse_and)
    }

    fn parse_and(&mut self) -> ParseResult<NodeId> {
        self.parse_binary(&["&"], Self::parse_shift)
    }

    fn parse_shift(&mut self) -> ParseResult<NodeId> {
        self.parse_binary(&["<<", ">>"], Self::parse_arith)
    }

    fn parse_arith(&mut self) -> ParseResult<NodeId> {
        self.parse_binary(&["+", "-"], Self::parse_term)
    }

    fn parse_term(&mut self) -> ParseResult<NodeId> {
        self.parse_binary(&["*", "/", "%", "//", "@"], Self::parse_factor)
    }

    /// Left-associative binary operators
    fn parse_binary(
        &mut self,
        operators: &[&str],
        operand: fn(&mut Self) -> ParseResult<NodeId>,
    ) -> ParseResult<NodeId> {
        let mut left = operand(self)?;
        loop {
            let token = self.peek()?;
            if token.kind != TokenKind::Op || !operators.contains(&token.value.as_str()) {
                return Ok(left);
            }
            self.advance()?;
            let op = Operator::from_symbol(&token.value)
                .ok_or_else(|| self.error("unknown binary operator"))?;
            let right = operand(self)?;
            let position = self.position(left);
            left = self.add(NodeKind::BinOp { left, op, right }, position);
        }
    }

    fn parse_factor(&mut self) -> ParseResult<NodeId> {
        let token = self.peek()?;
        let op = match (token.kind, token.value.as_str()) {
            (TokenKind::Op, "-") => Some(UnaryOperator::USub),
            (TokenKind::Op, "+") => Some(UnaryOperator::UAdd),
            (TokenKind::Op, "~") => Some(UnaryOperator::Invert),
            _ => None,
        };
        if let Some(op) = op {
            self.advance()?;
            let operand = self.parse_factor()?;
            return Ok(self.add(NodeKind::UnaryOp { op, operand }, Self::position_of(token)));
        }
        self.parse_power()
    }

    fn parse_power(&mut self) -> ParseResult<NodeId> {
        let base = self.parse_await()?;
        if self.at_op("**") {
            self.advance()?;
            let exponent = self.parse_factor()?;
            let position = self.position(base);
            return Ok(self.add(
                NodeKind::BinOp {
                    left: base,
                    op: Operator::Pow,
                    right: exponent,
                },
                position,
            ));
        }
        Ok(base)
    }

    fn parse_await(&mut self) -> ParseResult<NodeId> {
        if self.at_keyword("await") {
            let token = self.advance()?;
            let value = self.parse_primary()?;
            return Ok(self.add(NodeKind::Await { value }, Self::position_of(token)));
        }
        self.parse_primary()
    }

    /// An atom followed by calls, subscripts and attribute accesses
    fn parse_primary(&mut self) -> ParseResult<NodeId> {
        let start = self.current_position()?;
        let mut node = self.parse_atom()?;
        loop {
            if self.at_op("(") {
                let open = self.advance()?;
                let (args, keywords) = self.parse_call_arguments(open)?;
                node = self.add(
                    NodeKind::Call {
                        func: node,
                        args,
                        keywords,
                    },
                    start,
                );
            } else if self.eat_op("[")? {
                let slice = self.parse_subscript()?;
                self.expect_op("]")?;
                node = self.add(NodeKind::Subscript { value: node, slice }, start);
            } else if self.eat_op(".")? {
                let (attr, _) = self.expect_identifier()?;
                node = self.add(NodeKind::Attribute { value: node, attr }, start);
            } else {
                return Ok(node);
            }
        }
    }

    /// Arguments of a call or class definition, after the opening paren. Consumes the `)`.
    pub(crate) fn parse_call_arguments(
        &mut self,
        open: &'t Token,
    ) -> ParseResult<(Vec<NodeId>, Vec<NodeId>)> {
        let mut args = Vec::new();
        let mut keywords = Vec::new();
        while !self.at_op(")") {
            let token = self.peek()?;
            let position = Self::position_of(token);
            if token.is_op("*") {
                args.push(self.parse_starred()?);
            } else if token.is_op("**") {
                self.advance()?;
                let value = self.parse_test()?;
                keywords.push(self.add(NodeKind::Keyword { arg: None, value }, position));
            } else if token.kind == TokenKind::Name
                && !is_keyword(&token.value)
                && self.next_is_op("=")
            {
                self.advance()?;
                self.advance()?;
                let value = self.parse_test()?;
                keywords.push(self.add(
                    NodeKind::Keyword {
                        arg: Some(token.value.clone()),
                        value,
                    },
                    position,
                ));
            } else {
                let value = self.parse_named_test()?;
                if self.at_comprehension() {
                    let generators = self.parse_comprehensions()?;
                    args.push(self.add(
                        NodeKind::GeneratorExp {
                            elt: value,
                            generators,
                        },
                        Self::position_of(open),
                    ));
                } else {
                    args.push(value);
                }
            }
            if !self.eat_op(",")? {
                break;
            }
        }
        self.expect_op(")")?;
        Ok((args, keywords))
    }

    /// The inside of `[...]`: an index, a slice, or a tuple of them
    fn parse_subscript(&mut self) -> ParseResult<NodeId> {
        let start = self.current_position()?;
        let first = self.parse_slice_item()?;
        if !self.at_op(",") {
            return Ok(first);
        }
        let mut elts = vec![first];
        while self.eat_op(",")? {
            if self.at_op("]") {
                break;
            }
            elts.push(self.parse_slice_item()?);
        }
        Ok(self.add(NodeKind::Tuple { elts }, start))
    }

    fn parse_slice_item(&mut self) -> ParseResult<NodeId> {
        let start = self.current_position()?;
        let lower = if self.at_op(":") {
            None
        } else {
            let test = self.parse_named_test()?;
            if !self.at_op(":") {
                return Ok(test);
            }
            Some(test)
        };
        self.expect_op(":")?;
        let upper = if self.can_start_expression() {
            Some(self.parse_test()?)
        } else {
            None
        };
        let step = if self.eat_op(":")? && self.can_start_expression() {
            Some(self.parse_test()?)
        } else {
            None
        };
        Ok(self.add(NodeKind::Slice { lower, upper, step }, start))
    }

    fn parse_atom(&mut self) -> ParseResult<NodeId> {
        let token = self.peek()?;
        let position = Self::position_of(token);
        match token.kind {
            TokenKind::Number => {
                self.advance()?;
                Ok(self.add(
                    NodeKind::Constant {
                        value: ConstantValue::Number(token.value.clone()),
                    },
                    position,
                ))
            }
            TokenKind::String => self.parse_strings(),
            TokenKind::Name => {
                let value = match token.value.as_str() {
                    "None" => ConstantValue::None,
                    "True" => ConstantValue::True,
                    "False" => ConstantValue::False,
                    name if is_keyword(name) => return Err(self.error("invalid syntax")),
                    name => {
                        self.advance()?;
                        return Ok(self.add(
                            NodeKind::Name {
                                id: name.to_string(),
                            },
                            position,
                        ));
                    }
                };
                self.advance()?;
                Ok(self.add(NodeKind::Constant { value }, position))
            }
            TokenKind::Op => match token.value.as_str() {
                "(" => self.parse_parenthesized(),
                "[" => self.parse_list(),
                "{" => self.parse_brace(),
                "..." => {
                    self.advance()?;
                    Ok(self.add(
                        NodeKind::Constant {
                            value: ConstantValue::Ellipsis,
                        },
                        position,
                    ))
                }
                _ => Err(self.error("invalid syntax")),
            },
            _ => Err(self.error("invalid syntax")),
        }
    }

    /// Adjacent string literals form one constant
    fn parse_strings(&mut self) -> ParseResult<NodeId> {
        let position = self.current_position()?;
        let mut pieces = Vec::new();
        while self.at_kind(TokenKind::String) {
            pieces.push(self.advance()?);
        }
        let prefixes: Vec<String> = pieces
            .iter()
            .map(|t| string_prefix(&t.value).to_ascii_lowercase())
            .collect();
        let text = pieces
            .iter()
            .map(|t| t.value.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let kind = if prefixes.iter().any(|p| p.contains('f')) {
            NodeKind::JoinedStr { value: text }
        } else if prefixes.iter().any(|p| p.contains('b')) {
            NodeKind::Constant {
                value: ConstantValue::Bytes(text),
            }
        } else {
            NodeKind::Constant {
                value: ConstantValue::Str(text),
            }
        };
        Ok(self.add(kind, position))
    }

    fn parse_parenthesized(&mut self) -> ParseResult<NodeId> {
        let open = self.expect_op("(")?;
        let position = Self::position_of(open);
        if self.eat_op(")")? {
            return Ok(self.add(NodeKind::Tuple { elts: Vec::new() }, position));
        }
        if self.at_keyword("yield") {
            let node = self.parse_yield()?;
            self.expect_op(")")?;
            return Ok(node);
        }
        let first = self.parse_test_or_star()?;
        if self.at_comprehension() {
            let generators = self.parse_comprehensions()?;
            self.expect_op(")")?;
            return Ok(self.add(
                NodeKind::GeneratorExp {
                    elt: first,
                    generators,
                },
                position,
            ));
        }
        if !self.at_op(",") {
            self.expect_op(")")?;
            return Ok(first);
        }
        let elts = self.parse_elements(first, ")")?;
        Ok(self.add(NodeKind::Tuple { elts }, position))
    }

    fn parse_list(&mut self) -> ParseResult<NodeId> {
        let open = self.expect_op("[")?;
        let position = Self::position_of(open);
        if self.eat_op("]")? {
            return Ok(self.add(NodeKind::List { elts: Vec::new() }, position));
        }
        let first = self.parse_test_or_star()?;
        if self.at_comprehension() {
            let generators = self.parse_comprehensions()?;
            self.expect_op("]")?;
            return Ok(self.add(
                NodeKind::ListComp {
                    elt: first,
                    generators,
                },
                position,
            ));
        }
        let elts = self.parse_elements(first, "]")?;
        Ok(self.add(NodeKind::List { elts }, position))
    }

    /// Comma-separated elements after `first`, consuming the closing bracket
    fn parse_elements(&mut self, first: NodeId, closing: &str) -> ParseResult<Vec<NodeId>> {
        let mut elts = vec![first];
        while self.eat_op(",")? {
            if self.at_op(closing) {
                break;
            }
            elts.push(self.parse_test_or_star()?);
        }
        self.expect_op(closing)?;
        Ok(elts)
    }

    /// Dicts, sets and their comprehensions
    fn parse_brace(&mut self) -> ParseResult<NodeId> {
        let open = self.expect_op("{")?;
        let position = Self::position_of(open);
        if self.eat_op("}")? {
            return Ok(self.add(
                NodeKind::Dict {
                    keys: Vec::new(),
                    values: Vec::new(),
                },
                position,
            ));
        }

        let (first_key, first_value) = if self.eat_op("**")? {
            (None, Some(self.parse_expr()?))
        } else {
            let first = self.parse_test_or_star()?;
            if self.eat_op(":")? {
                (Some(first), Some(self.parse_test()?))
            } else {
                (Some(first), None)
            }
        };

        let Some(value) = first_value else {
            // A set
            let first = first_key.ok_or_else(|| self.error("invalid set"))?;
            if self.at_comprehension() {
                let generators = self.parse_comprehensions()?;
                self.expect_op("}")?;
                return Ok(self.add(
                    NodeKind::SetComp {
                        elt: first,
                        generators,
                    },
                    position,
                ));
            }
            let elts = self.parse_elements(first, "}")?;
            return Ok(self.add(NodeKind::Set { elts }, position));
        };

        if let Some(key) = first_key {
            if self.at_comprehension() {
                let generators = self.parse_comprehensions()?;
                self.expect_op("}")?;
                return Ok(self.add(
                    NodeKind::DictComp {
                        key,
                        value,
                        generators,
                    },
                    position,
                ));
            }
        }

        let mut keys = vec![first_key];
        let mut values = vec![value];
        while self.eat_op(",")? {
            if self.at_op("}") {
                break;
            }
            if self.eat_op("**")? {
                keys.push(None);
                values.push(self.parse_expr()?);
            } else {
                keys.push(Some(self.parse_test()?));
                self.expect_op(":")?;
                values.push(self.parse_test()?);
            }
        }
        self.expect_op("}")?;
        Ok(self.add(NodeKind::Dict { keys, values }, position))
    }

    pub(crate) fn at_comprehension(&self) -> bool {
        self.at_keyword("for") || (self.at_keyword("async") && self.next_is_keyword("for"))
    }

    /// One or more `for ... in ... if ...` clauses
    pub(crate) fn parse_comprehensions(&mut self) -> ParseResult<Vec<NodeId>> {
        let mut generators = Vec::new();
        while self.at_comprehension() {
            let start = self.current_position()?;
            let is_async = self.eat_keyword("async")?;
            self.expect_keyword("for")?;
            let target = self.parse_exprlist()?;
            self.expect_keyword("in")?;
            let iter = self.parse_or_test()?;
            let mut ifs = Vec::new();
            while self.eat_keyword("if")? {
                ifs.push(self.parse_or_test()?);
            }
            generators.push(self.add(
                NodeKind::Comprehension {
                    is_async,
                    target,
                    iter,
                    ifs,
                },
                start,
            ));
        }
        Ok(generators)
    }
}

/// The letters before the opening quote of a string literal
pub fn string_prefix(value: &str) -> &str {
    let end = value.find(|c| c == '\'' || c == '"').unwrap_or(0);
    &value[..end]
}
