//! Node kinds
//!
//! One variant per class of Python's `ast` module. `async` statements share a variant with
//! their synchronous form and carry an `is_async` flag; [NodeKind::name] still reports the
//! `Async*` class name.
//!
//! Match statements and parenthesized context managers are not represented.

use super::operators::{BoolOperator, CmpOperator, Operator, UnaryOperator};
use super::NodeId;

#[derive(Debug, Clone, PartialEq)]
pub enum ConstantValue {
    None,
    True,
    False,
    Ellipsis,
    /// Source text of the number
    Number(String),
    /// Source text of the string literal, implicit concatenations joined by a blank
    Str(String),
    Bytes(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    // Module
    Module {
        body: Vec<NodeId>,
    },

    // Statements
    FunctionDef {
        is_async: bool,
        name: String,
        args: NodeId,
        body: Vec<NodeId>,
        decorator_list: Vec<NodeId>,
        returns: Option<NodeId>,
    },
    ClassDef {
        name: String,
        bases: Vec<NodeId>,
        keywords: Vec<NodeId>,
        body: Vec<NodeId>,
        decorator_list: Vec<NodeId>,
    },
    Return {
        value: Option<NodeId>,
    },
    Delete {
        targets: Vec<NodeId>,
    },
    Assign {
        targets: Vec<NodeId>,
        value: NodeId,
    },
    AugAssign {
        target: NodeId,
        op: Operator,
        value: NodeId,
    },
    AnnAssign {
        target: NodeId,
        annotation: NodeId,
        value: Option<NodeId>,
    },
    For {
        is_async: bool,
        target: NodeId,
        iter: NodeId,
        body: Vec<NodeId>,
        orelse: Vec<NodeId>,
    },
    While {
        test: NodeId,
        body: Vec<NodeId>,
        orelse: Vec<NodeId>,
    },
    If {
        test: NodeId,
        body: Vec<NodeId>,
        orelse: Vec<NodeId>,
    },
    With {
        is_async: bool,
        items: Vec<NodeId>,
        body: Vec<NodeId>,
    },
    Raise {
        exc: Option<NodeId>,
        cause: Option<NodeId>,
    },
    Try {
        body: Vec<NodeId>,
        handlers: Vec<NodeId>,
        orelse: Vec<NodeId>,
        finalbody: Vec<NodeId>,
    },
    Assert {
        test: NodeId,
        msg: Option<NodeId>,
    },
    Import {
        names: Vec<NodeId>,
    },
    ImportFrom {
        module: Option<String>,
        names: Vec<NodeId>,
        level: usize,
    },
    Global {
        names: Vec<String>,
    },
    Nonlocal {
        names: Vec<String>,
    },
    Expr {
        value: NodeId,
    },
    Pass,
    Break,
    Continue,

    // Expressions
    BoolOp {
        op: BoolOperator,
        values: Vec<NodeId>,
    },
    NamedExpr {
        target: NodeId,
        value: NodeId,
    },
    BinOp {
        left: NodeId,
        op: Operator,
        right: NodeId,
    },
    UnaryOp {
        op: UnaryOperator,
        operand: NodeId,
    },
    Lambda {
        args: NodeId,
        body: NodeId,
    },
    IfExp {
        test: NodeId,
        body: NodeId,
        orelse: NodeId,
    },
    /// A `None` key marks `**value` unpacking
    Dict {
        keys: Vec<Option<NodeId>>,
        values: Vec<NodeId>,
    },
    Set {
        elts: Vec<NodeId>,
    },
    ListComp {
        elt: NodeId,
        generators: Vec<NodeId>,
    },
    SetComp {
        elt: NodeId,
        generators: Vec<NodeId>,
    },
    DictComp {
        key: NodeId,
        value: NodeId,
        generators: Vec<NodeId>,
    },
    GeneratorExp {
        elt: NodeId,
        generators: Vec<NodeId>,
    },
    Await {
        value: NodeId,
    },
    Yield {
        value: Option<NodeId>,
    },
    YieldFrom {
        value: NodeId,
    },
    Compare {
        left: NodeId,
        ops: Vec<CmpOperator>,
        comparators: Vec<NodeId>,
    },
    Call {
        func: NodeId,
        args: Vec<NodeId>,
        keywords: Vec<NodeId>,
    },
    Constant {
        value: ConstantValue,
    },
    /// An f-string, possibly concatenated with plain strings. `value` is the source text.
    JoinedStr {
        value: String,
    },
    Attribute {
        value: NodeId,
        attr: String,
    },
    Subscript {
        value: NodeId,
        slice: NodeId,
    },
    Starred {
        value: NodeId,
    },
    Name {
        id: String,
    },
    List {
        elts: Vec<NodeId>,
    },
    Tuple {
        elts: Vec<NodeId>,
    },
    Slice {
        lower: Option<NodeId>,
        upper: Option<NodeId>,
        step: Option<NodeId>,
    },

    // Helper nodes
    Arguments {
        posonlyargs: Vec<NodeId>,
        args: Vec<NodeId>,
        vararg: Option<NodeId>,
        kwonlyargs: Vec<NodeId>,
        /// One entry per keyword-only argument
        kw_defaults: Vec<Option<NodeId>>,
        kwarg: Option<NodeId>,
        /// Defaults of the last positional arguments
        defaults: Vec<NodeId>,
    },
    Arg {
        arg: String,
        annotation: Option<NodeId>,
    },
    /// `arg = value`, or `**value` when `arg` is `None`
    Keyword {
        arg: Option<String>,
        value: NodeId,
    },
    Alias {
        name: String,
        asname: Option<String>,
    },
    WithItem {
        context_expr: NodeId,
        optional_vars: Option<NodeId>,
    },
    Comprehension {
        is_async: bool,
        target: NodeId,
        iter: NodeId,
        ifs: Vec<NodeId>,
    },
    ExceptHandler {
        type_: Option<NodeId>,
        name: Option<String>,
        body: Vec<NodeId>,
    },
}

impl NodeKind {
    /// The Python class name
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Module { .. } => "Module",
            NodeKind::FunctionDef { is_async: true, .. } => "AsyncFunctionDef",
            NodeKind::FunctionDef { .. } => "FunctionDef",
            NodeKind::ClassDef { .. } => "ClassDef",
            NodeKind::Return { .. } => "Return",
            NodeKind::Delete { .. } => "Delete",
            NodeKind::Assign { .. } => "Assign",
            NodeKind::AugAssign { .. } => "AugAssign",
            NodeKind::AnnAssign { .. } => "AnnAssign",
            NodeKind::For { is_async: true, .. } => "AsyncFor",
            NodeKind::For { .. } => "For",
            NodeKind::While { .. } => "While",
            NodeKind::If { .. } => "If",
            NodeKind::With { is_async: true, .. } => "AsyncWith",
            NodeKind::With { .. } => "With",
            NodeKind::Raise { .. } => "Raise",
            NodeKind::Try { .. } => "Try",
            NodeKind::Assert { .. } => "Assert",
            NodeKind::Import { .. } => "Import",
            NodeKind::ImportFrom { .. } => "ImportFrom",
            NodeKind::Global { .. } => "Global",
            NodeKind::Nonlocal { .. } => "Nonlocal",
            NodeKind::Expr { .. } => "Expr",
            NodeKind::Pass => "Pass",
            NodeKind::Break => "Break",
            NodeKind::Continue => "Continue",
            NodeKind::BoolOp { .. } => "BoolOp",
            NodeKind::NamedExpr { .. } => "NamedExpr",
            NodeKind::BinOp { .. } => "BinOp",
            NodeKind::UnaryOp { .. } => "UnaryOp",
            NodeKind::Lambda { .. } => "Lambda",
            NodeKind::IfExp { .. } => "IfExp",
            NodeKind::Dict { .. } => "Dict",
            NodeKind::Set { .. } => "Set",
            NodeKind::ListComp { .. } => "ListComp",
            NodeKind::SetComp { .. } => "SetComp",
            NodeKind::DictComp { .. } => "DictComp",
            NodeKind::GeneratorExp { .. } => "GeneratorExp",
            NodeKind::Await { .. } => "Await",
            NodeKind::Yield { .. } => "Yield",
            NodeKind::YieldFrom { .. } => "YieldFrom",
            NodeKind::Compare { .. } => "Compare",
            NodeKind::Call { .. } => "Call",
            NodeKind::Constant { .. } => "Constant",
            NodeKind::JoinedStr { .. } => "JoinedStr",
            NodeKind::Attribute { .. } => "Attribute",
            NodeKind::Subscript { .. } => "Subscript",
            NodeKind::Starred { .. } => "Starred",
            NodeKind::Name { .. } => "Name",
            NodeKind::List { .. } => "List",
            NodeKind::Tuple { .. } => "Tuple",
            NodeKind::Slice { .. } => "Slice",
            NodeKind::Arguments { .. } => "arguments",
            NodeKind::Arg { .. } => "arg",
            NodeKind::Keyword { .. } => "keyword",
            NodeKind::Alias { .. } => "alias",
            NodeKind::WithItem { .. } => "withitem",
            NodeKind::Comprehension { .. } => "comprehension",
            NodeKind::ExceptHandler { .. } => "ExceptHandler",
        }
    }

    pub fn is_statement(&self) -> bool {
        matches!(
            self,
            NodeKind::FunctionDef { .. }
                | NodeKind::ClassDef { .. }
                | NodeKind::Return { .. }
                | NodeKind::Delete { .. }
                | NodeKind::Assign { .. }
                | NodeKind::AugAssign { .. }
                | NodeKind::AnnAssign { .. }
                | NodeKind::For { .. }
                | NodeKind::While { .. }
                | NodeKind::If { .. }
                | NodeKind::With { .. }
                | NodeKind::Raise { .. }
                | NodeKind::Try { .. }
                | NodeKind::Assert { .. }
                | NodeKind::Import { .. }
                | NodeKind::ImportFrom { .. }
                | NodeKind::Global { .. }
                | NodeKind::Nonlocal { .. }
                | NodeKind::Expr { .. }
                | NodeKind::Pass
                | NodeKind::Break
                | NodeKind::Continue
        )
    }

    /// A short description for dumps: names, operators and literal values
    pub fn label(&self) -> String {
        match self {
            NodeKind::FunctionDef { name, .. } | NodeKind::ClassDef { name, .. } => name.clone(),
            NodeKind::Name { id } => id.clone(),
            NodeKind::Attribute { attr, .. } => attr.clone(),
            NodeKind::Arg { arg, .. } => arg.clone(),
            NodeKind::Keyword { arg, .. } => arg.clone().unwrap_or_else(|| "**".to_string()),
            NodeKind::Alias { name, asname } => match asname {
                Some(asname) => format!("{} as {}", name, asname),
                None => name.clone(),
            },
            NodeKind::ImportFrom { module, level, .. } => {
                format!("{}{}", ".".repeat(*level), module.as_deref().unwrap_or(""))
            }
            NodeKind::BinOp { op, .. } | NodeKind::AugAssign { op, .. } => op.as_str().to_string(),
            NodeKind::BoolOp { op, .. } => op.as_str().to_string(),
            NodeKind::UnaryOp { op, .. } => op.as_str().to_string(),
            NodeKind::Compare { ops, .. } => ops
                .iter()
                .map(|op| op.as_str())
                .collect::<Vec<_>>()
                .join(" "),
            NodeKind::Constant { value } => match value {
                ConstantValue::None => "None".to_string(),
                ConstantValue::True => "True".to_string(),
                ConstantValue::False => "False".to_string(),
                ConstantValue::Ellipsis => "...".to_string(),
                ConstantValue::Number(s) | ConstantValue::Str(s) | ConstantValue::Bytes(s) => {
                    s.clone()
                }
            },
            NodeKind::JoinedStr { value } => value.clone(),
            NodeKind::Global { names } | NodeKind::Nonlocal { names } => names.join(", "),
            _ => String::new(),
        }
    }

    /// Child node ids in source order
    pub fn child_ids(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        match self {
            NodeKind::Module { body } => out.extend(body),
            NodeKind::FunctionDef {
                args,
                body,
                decorator_list,
                returns,
                ..
            } => {
                out.extend(decorator_list);
                out.push(*args);
                out.extend(returns);
                out.extend(body);
            }
            NodeKind::ClassDef {
                bases,
                keywords,
                body,
                decorator_list,
                ..
            } => {
                out.extend(decorator_list);
                out.extend(bases);
                out.extend(keywords);
                out.extend(body);
            }
            NodeKind::Return { value } => out.extend(value),
            NodeKind::Delete { targets } => out.extend(targets),
            NodeKind::Assign { targets, value } => {
                out.extend(targets);
                out.push(*value);
            }
            NodeKind::AugAssign { target, value, .. } => out.extend([*target, *value]),
            NodeKind::AnnAssign {
                target,
                annotation,
                value,
            } => {
                out.extend([*target, *annotation]);
                out.extend(value);
            }
            NodeKind::For {
                target,
                iter,
                body,
                orelse,
                ..
            } => {
                out.extend([*target, *iter]);
                out.extend(body);
                out.extend(orelse);
            }
            NodeKind::While { test, body, orelse } | NodeKind::If { test, body, orelse } => {
                out.push(*test);
                out.extend(body);
                out.extend(orelse);
            }
            NodeKind::With { items, body, .. } => {
                out.extend(items);
                out.extend(body);
            }
            NodeKind::Raise { exc, cause } => {
                out.extend(exc);
                out.extend(cause);
            }
            NodeKind::Try {
                body,
                handlers,
                orelse,
                finalbody,
            } => {
                out.extend(body);
                out.extend(handlers);
                out.extend(orelse);
                out.extend(finalbody);
            }
            NodeKind::Assert { test, msg } => {
                out.push(*test);
                out.extend(msg);
            }
            NodeKind::Import { names } | NodeKind::ImportFrom { names, .. } => out.extend(names),
            NodeKind::Expr { value } => out.push(*value),
            NodeKind::BoolOp { values, .. } => out.extend(values),
            NodeKind::NamedExpr { target, value } => out.extend([*target, *value]),
            NodeKind::BinOp { left, right, .. } => out.extend([*left, *right]),
            NodeKind::UnaryOp { operand, .. } => out.push(*operand),
            NodeKind::Lambda { args, body } => out.extend([*args, *body]),
            NodeKind::IfExp { test, body, orelse } => out.extend([*body, *test, *orelse]),
            NodeKind::Dict { keys, values } => {
                for (key, value) in keys.iter().zip(values) {
                    out.extend(key);
                    out.push(*value);
                }
            }
            NodeKind::Set { elts } | NodeKind::List { elts } | NodeKind::Tuple { elts } => {
                out.extend(elts)
            }
            NodeKind::ListComp { elt, generators }
            | NodeKind::SetComp { elt, generators }
            | NodeKind::GeneratorExp { elt, generators } => {
                out.push(*elt);
                out.extend(generators);
            }
            NodeKind::DictComp {
                key,
                value,
                generators,
            } => {
                out.extend([*key, *value]);
                out.extend(generators);
            }
            NodeKind::Await { value }
            | NodeKind::YieldFrom { value }
            | NodeKind::Starred { value }
            | NodeKind::Keyword { value, .. } => out.push(*value),
            NodeKind::Yield { value } => out.extend(value),
            NodeKind::Compare {
                left, comparators, ..
            } => {
                out.push(*left);
                out.extend(comparators);
            }
            NodeKind::Call {
                func,
                args,
                keywords,
            } => {
                out.push(*func);
                out.extend(args);
                out.extend(keywords);
            }
            NodeKind::Attribute { value, .. } => out.push(*value),
            NodeKind::Subscript { value, slice } => out.extend([*value, *slice]),
            NodeKind::Slice { lower, upper, step } => {
                out.extend(lower);
                out.extend(upper);
                out.extend(step);
            }
            NodeKind::Arguments {
                posonlyargs,
                args,
                vararg,
                kwonlyargs,
                kw_defaults,
                kwarg,
                defaults,
            } => {
                let positional: Vec<NodeId> =
                    posonlyargs.iter().chain(args.iter()).copied().collect();
                let first_default = positional.len().saturating_sub(defaults.len());
                for (i, arg) in positional.iter().enumerate() {
                    out.push(*arg);
                    if i >= first_default {
                        out.extend(defaults.get(i - first_default));
                    }
                }
                out.extend(vararg);
                for (arg, default) in kwonlyargs.iter().zip(kw_defaults) {
                    out.push(*arg);
                    out.extend(default);
                }
                out.extend(kwarg);
            }
            NodeKind::Arg { annotation, .. } => out.extend(annotation),
            NodeKind::WithItem {
                context_expr,
                optional_vars,
            } => {
                out.push(*context_expr);
                out.extend(optional_vars);
            }
            NodeKind::Comprehension {
                target, iter, ifs, ..
            } => {
                out.extend([*target, *iter]);
                out.extend(ifs);
            }
            NodeKind::ExceptHandler { type_, body, .. } => {
                out.extend(type_);
                out.extend(body);
            }
            NodeKind::Global { .. }
            | NodeKind::Nonlocal { .. }
            | NodeKind::Pass
            | NodeKind::Break
            | NodeKind::Continue
            | NodeKind::Constant { .. }
            | NodeKind::JoinedStr { .. }
            | NodeKind::Name { .. }
            | NodeKind::Alias { .. } => {}
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_async_names() {
        let def = NodeKind::FunctionDef {
            is_async: true,
            name: "f".to_string(),
            args: NodeId(0),
            body: vec![],
            decorator_list: vec![],
            returns: None,
        };
        assert_eq!(def.name(), "AsyncFunctionDef");
        assert!(def.is_statement());
    }

    #[test]
    fn test_expressions_are_not_statements() {
        let name = NodeKind::Name {
            id: "x".to_string(),
        };
        assert!(!name.is_statement());
        assert!(NodeKind::Pass.is_statement());
    }

    #[test]
    fn test_argument_children_pair_defaults() {
        let args = NodeKind::Arguments {
            posonlyargs: vec![],
            args: vec![NodeId(1), NodeId(2)],
            vararg: None,
            kwonlyargs: vec![NodeId(4)],
            kw_defaults: vec![None],
            kwarg: Some(NodeId(5)),
            defaults: vec![NodeId(3)],
        };
        assert_eq!(
            args.child_ids(),
            vec![NodeId(1), NodeId(2), NodeId(3), NodeId(4), NodeId(5)]
        );
    }
}
