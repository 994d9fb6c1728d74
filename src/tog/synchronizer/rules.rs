//! Emission rules: the order in which each node kind emits its tokens and children
//!
//! Rules only emit what the tree implies. Commas, parens and line breaks may be emitted
//! where they surely exist (the synchronizer ignores insignificant tokens), but they are
//! never required.

use super::actions::{name, op, visit_all, Action, Helper};
use crate::tog::ast::{Ast, ConstantValue, NodeId, NodeKind, UnaryOperator};
use crate::tog::token::TokenKind;

/// The actions for one node, or `None` for kinds that only their parent knows how to emit
pub(crate) fn emission_rule(tree: &Ast, id: NodeId) -> Option<Vec<Action>> {
    let mut out = Vec::new();
    match tree.kind(id) {
        NodeKind::Module { body } => out.extend(visit_all(body)),

        NodeKind::FunctionDef {
            is_async,
            name: def_name,
            args,
            body,
            decorator_list,
            returns,
        } => {
            decorators(&mut out, decorator_list);
            if *is_async {
                out.push(name("async"));
            }
            out.push(name("def"));
            out.push(name(def_name.as_str()));
            out.push(op("("));
            out.push(Action::Visit(*args));
            out.push(op(")"));
            if let Some(returns) = returns {
                out.push(op("->"));
                out.push(Action::Visit(*returns));
            }
            block(&mut out, body);
        }

        NodeKind::ClassDef {
            name: class_name,
            bases,
            keywords,
            body,
            decorator_list,
        } => {
            decorators(&mut out, decorator_list);
            out.push(name("class"));
            out.push(name(class_name.as_str()));
            if !bases.is_empty() || !keywords.is_empty() {
                out.push(op("("));
                call_arguments(&mut out, tree, bases, keywords);
                out.push(op(")"));
            }
            block(&mut out, body);
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
            let positional: Vec<NodeId> = posonlyargs.iter().chain(args).copied().collect();
            let first_default = positional.len().saturating_sub(defaults.len());
            for (i, arg) in positional.iter().enumerate() {
                out.push(Action::Visit(*arg));
                if i >= first_default {
                    if let Some(default) = defaults.get(i - first_default) {
                        out.push(op("="));
                        out.push(Action::Visit(*default));
                    }
                }
                if i + 1 == posonlyargs.len() {
                    out.push(op("/"));
                }
            }
            if let Some(vararg) = vararg {
                out.push(op("*"));
                out.push(Action::Visit(*vararg));
            } else if !kwonlyargs.is_empty() {
                out.push(op("*"));
            }
            for (i, arg) in kwonlyargs.iter().enumerate() {
                out.push(Action::Visit(*arg));
                if let Some(Some(default)) = kw_defaults.get(i) {
                    out.push(op("="));
                    out.push(Action::Visit(*default));
                }
            }
            if let Some(kwarg) = kwarg {
                out.push(op("**"));
                out.push(Action::Visit(*kwarg));
            }
        }

        NodeKind::Arg { arg, annotation } => {
            out.push(name(arg.as_str()));
            if let Some(annotation) = annotation {
                out.push(op(":"));
                out.push(Action::Visit(*annotation));
            }
        }

        NodeKind::Return { value } => {
            out.push(name("return"));
            out.extend(value.map(Action::Visit));
        }

        NodeKind::Delete { targets } => {
            out.push(name("del"));
            out.extend(visit_all(targets));
        }

        NodeKind::Assign { targets, value } => {
            for target in targets {
                out.push(Action::Visit(*target));
                out.push(op("="));
            }
            out.push(Action::Visit(*value));
        }

        NodeKind::AugAssign {
            target,
            op: operator,
            value,
        } => {
            out.push(Action::Visit(*target));
            out.push(op(format!("{}=", operator.as_str())));
            out.push(Action::Visit(*value));
        }

        NodeKind::AnnAssign {
            target,
            annotation,
            value,
        } => {
            out.push(Action::Visit(*target));
            out.push(op(":"));
            out.push(Action::Visit(*annotation));
            if let Some(value) = value {
                out.push(op("="));
                out.push(Action::Visit(*value));
            }
        }

        NodeKind::For {
            is_async,
            target,
            iter,
            body,
            orelse,
        } => {
            if *is_async {
                out.push(name("async"));
            }
            out.push(name("for"));
            out.push(Action::Visit(*target));
            out.push(name("in"));
            out.push(Action::Visit(*iter));
            block(&mut out, body);
            else_block(&mut out, "else", orelse);
        }

        NodeKind::While { test, body, orelse } => {
            out.push(name("while"));
            out.push(Action::Visit(*test));
            block(&mut out, body);
            else_block(&mut out, "else", orelse);
        }

        NodeKind::If { test, body, orelse } => {
            out.push(Action::Helper(Helper::IfKeyword));
            out.push(Action::Visit(*test));
            block(&mut out, body);
            if !orelse.is_empty() {
                out.push(Action::Helper(Helper::IfElse(orelse.clone())));
            }
        }

        NodeKind::With {
            is_async,
            items,
            body,
        } => {
            if *is_async {
                out.push(name("async"));
            }
            out.push(name("with"));
            out.extend(visit_all(items));
            block(&mut out, body);
        }

        NodeKind::WithItem {
            context_expr,
            optional_vars,
        } => {
            out.push(Action::Visit(*context_expr));
            if let Some(vars) = optional_vars {
                out.push(name("as"));
                out.push(Action::Visit(*vars));
            }
        }

        NodeKind::Raise { exc, cause } => {
            out.push(name("raise"));
            if let Some(exc) = exc {
                out.push(Action::Visit(*exc));
                if let Some(cause) = cause {
                    out.push(name("from"));
                    out.push(Action::Visit(*cause));
                }
            }
        }

        NodeKind::Try {
            body,
            handlers,
            orelse,
            finalbody,
        } => {
            out.push(name("try"));
            block(&mut out, body);
            out.extend(visit_all(handlers));
            else_block(&mut out, "else", orelse);
            else_block(&mut out, "finally", finalbody);
        }

        NodeKind::ExceptHandler {
            type_,
            name: handler_name,
            body,
        } => {
            out.push(name("except"));
            if let Some(type_) = type_ {
                out.push(Action::Visit(*type_));
                if let Some(handler_name) = handler_name {
                    out.push(name("as"));
                    out.push(name(handler_name.as_str()));
                }
            }
            block(&mut out, body);
        }

        NodeKind::Assert { test, msg } => {
            out.push(name("assert"));
            out.push(Action::Visit(*test));
            out.extend(msg.map(Action::Visit));
        }

        NodeKind::Import { names } => {
            out.push(name("import"));
            out.extend(visit_all(names));
        }

        NodeKind::ImportFrom {
            module,
            names,
            level,
        } => {
            out.push(name("from"));
            if *level > 0 {
                out.push(Action::Helper(Helper::ImportDots(*level)));
            }
            if let Some(module) = module {
                out.push(name(module.as_str()));
            }
            out.push(name("import"));
            out.extend(visit_all(names));
        }

        NodeKind::Alias {
            name: alias_name,
            asname,
        } => {
            if alias_name == "*" {
                out.push(op("*"));
            } else {
                out.push(name(alias_name.as_str()));
            }
            if let Some(asname) = asname {
                out.push(name("as"));
                out.push(name(asname.as_str()));
            }
        }

        NodeKind::Global { names } | NodeKind::Nonlocal { names } => {
            out.push(name(tree.kind(id).name().to_ascii_lowercase()));
            out.extend(names.iter().map(|n| name(n.as_str())));
        }

        NodeKind::Expr { value } => out.push(Action::Visit(*value)),
        NodeKind::Pass => out.push(name("pass")),
        NodeKind::Break => out.push(name("break")),
        NodeKind::Continue => out.push(name("continue")),

        NodeKind::BoolOp { op: operator, values } => {
            for (i, value) in values.iter().enumerate() {
                if i > 0 {
                    out.push(name(operator.as_str()));
                }
                out.push(Action::Visit(*value));
            }
        }

        NodeKind::NamedExpr { target, value } => {
            out.push(Action::Visit(*target));
            out.push(op(":="));
            out.push(Action::Visit(*value));
        }

        NodeKind::BinOp {
            left,
            op: operator,
            right,
        } => {
            out.push(Action::Visit(*left));
            out.push(op(operator.as_str()));
            out.push(Action::Visit(*right));
        }

        NodeKind::UnaryOp {
            op: operator,
            operand,
        } => {
            if *operator == UnaryOperator::Not {
                out.push(name("not"));
            } else {
                out.push(op(operator.as_str()));
            }
            out.push(Action::Visit(*operand));
        }

        NodeKind::Lambda { args, body } => {
            out.push(name("lambda"));
            out.push(Action::Visit(*args));
            out.push(op(":"));
            out.push(Action::Visit(*body));
        }

        NodeKind::IfExp { test, body, orelse } => {
            out.push(Action::Visit(*body));
            out.push(name("if"));
            out.push(Action::Visit(*test));
            out.push(name("else"));
            out.push(Action::Visit(*orelse));
        }

        NodeKind::Dict { keys, values } => {
            out.push(op("{"));
            for (key, value) in keys.iter().zip(values) {
                match key {
                    Some(key) => {
                        out.push(Action::Visit(*key));
                        out.push(op(":"));
                    }
                    None => out.push(op("**")),
                }
                out.push(Action::Visit(*value));
            }
            out.push(op("}"));
        }

        NodeKind::Set { elts } => {
            out.push(op("{"));
            out.extend(visit_all(elts));
            out.push(op("}"));
        }

        NodeKind::ListComp { elt, generators } => {
            out.push(op("["));
            out.push(Action::Visit(*elt));
            out.extend(visit_all(generators));
            out.push(op("]"));
        }

        NodeKind::SetComp { elt, generators } => {
            out.push(op("{"));
            out.push(Action::Visit(*elt));
            out.extend(visit_all(generators));
            out.push(op("}"));
        }

        NodeKind::DictComp {
            key,
            value,
            generators,
        } => {
            out.push(op("{"));
            out.push(Action::Visit(*key));
            out.push(op(":"));
            out.push(Action::Visit(*value));
            out.extend(visit_all(generators));
            out.push(op("}"));
        }

        NodeKind::GeneratorExp { elt, generators } => {
            out.push(Action::Visit(*elt));
            out.extend(visit_all(generators));
        }

        NodeKind::Comprehension {
            is_async,
            target,
            iter,
            ifs,
        } => {
            if *is_async {
                out.push(name("async"));
            }
            out.push(name("for"));
            out.push(Action::Visit(*target));
            out.push(name("in"));
            out.push(Action::Visit(*iter));
            for condition in ifs {
                out.push(name("if"));
                out.push(Action::Visit(*condition));
            }
        }

        NodeKind::Await { value } => {
            out.push(name("await"));
            out.push(Action::Visit(*value));
        }

        NodeKind::Yield { value } => {
            out.push(name("yield"));
            out.extend(value.map(Action::Visit));
        }

        NodeKind::YieldFrom { value } => {
            out.push(name("yield"));
            out.push(name("from"));
            out.push(Action::Visit(*value));
        }

        NodeKind::Compare {
            left,
            ops,
            comparators,
        } => {
            out.push(Action::Visit(*left));
            for (operator, comparator) in ops.iter().zip(comparators) {
                if operator.is_word() {
                    out.extend(operator.as_str().split(' ').map(name));
                } else {
                    out.push(op(operator.as_str()));
                }
                out.push(Action::Visit(*comparator));
            }
        }

        NodeKind::Call {
            func,
            args,
            keywords,
        } => {
            out.push(Action::Visit(*func));
            out.push(op("("));
            call_arguments(&mut out, tree, args, keywords);
            out.push(op(")"));
        }

        NodeKind::Starred { value } => {
            out.push(op("*"));
            out.push(Action::Visit(*value));
        }

        NodeKind::Constant { value } => match value {
            ConstantValue::None => out.push(name("None")),
            ConstantValue::True => out.push(name("True")),
            ConstantValue::False => out.push(name("False")),
            ConstantValue::Ellipsis => out.push(op("...")),
            ConstantValue::Number(text) => {
                out.push(Action::Token(TokenKind::Number, text.clone()))
            }
            ConstantValue::Str(_) | ConstantValue::Bytes(_) => {
                out.push(Action::Helper(Helper::StringTokens))
            }
        },

        NodeKind::JoinedStr { .. } => out.push(Action::Helper(Helper::StringTokens)),

        NodeKind::Attribute { value, attr } => {
            out.push(Action::Visit(*value));
            out.push(op("."));
            out.push(name(attr.as_str()));
        }

        NodeKind::Subscript { value, slice } => {
            out.push(Action::Visit(*value));
            out.push(op("["));
            out.push(Action::Visit(*slice));
            out.push(op("]"));
        }

        NodeKind::Slice { lower, upper, step } => {
            out.extend(lower.map(Action::Visit));
            out.push(op(":"));
            out.extend(upper.map(Action::Visit));
            match step {
                Some(step) => {
                    out.push(op(":"));
                    out.push(Action::Visit(*step));
                }
                None => out.push(Action::Helper(Helper::SliceColon)),
            }
        }

        NodeKind::Name { id } => out.push(name(id.as_str())),

        NodeKind::List { elts } => {
            out.push(op("["));
            out.extend(visit_all(elts));
            out.push(op("]"));
        }

        NodeKind::Tuple { elts } => out.extend(visit_all(elts)),

        NodeKind::Keyword { .. } => return None,
    }
    Some(out)
}

fn decorators(out: &mut Vec<Action>, decorator_list: &[NodeId]) {
    for decorator in decorator_list {
        out.push(op("@"));
        out.push(Action::Visit(*decorator));
    }
}

/// `:` and an indented (or same-line) body
fn block(out: &mut Vec<Action>, body: &[NodeId]) {
    out.push(op(":"));
    out.push(Action::BeginBlock);
    out.extend(visit_all(body));
    out.push(Action::EndBlock);
}

/// `else:`, `finally:` and similar trailing clauses, when present
fn else_block(out: &mut Vec<Action>, keyword: &str, body: &[NodeId]) {
    if body.is_empty() {
        return;
    }
    out.push(name(keyword));
    block(out, body);
}

/// Positional arguments and keywords in source order.
///
/// The tree keeps them in two lists, but Python allows them to interleave (`f(*a, x=1, *b)`),
/// so they are merged and sorted by position. Keywords are emitted here, on behalf of the
/// call, and never visited themselves.
fn call_arguments(out: &mut Vec<Action>, tree: &Ast, args: &[NodeId], keywords: &[NodeId]) {
    let mut items: Vec<NodeId> = args.iter().chain(keywords).copied().collect();
    items.sort_by_key(|id| tree.position(*id));
    for item in items {
        match tree.kind(item) {
            NodeKind::Keyword { arg: None, value } => {
                out.push(op("**"));
                out.push(Action::Visit(*value));
            }
            NodeKind::Keyword {
                arg: Some(arg),
                value,
            } => {
                out.push(name(arg.as_str()));
                out.push(op("="));
                out.push(Action::Visit(*value));
            }
            _ => out.push(Action::Visit(item)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tog::parsing::parse;

    fn rule_for(source: &str, kind: &str) -> Vec<Action> {
        let tree = parse(source).unwrap();
        let id = tree
            .walk()
            .into_iter()
            .find(|id| tree.name(*id) == kind)
            .unwrap();
        emission_rule(&tree, id).unwrap()
    }

    fn significant(actions: &[Action]) -> Vec<String> {
        actions
            .iter()
            .filter_map(|a| match a {
                Action::Name(v) | Action::Op(v) => Some(v.clone()),
                Action::Token(_, v) => Some(v.clone()),
                Action::Visit(_) => Some("<visit>".to_string()),
                Action::Helper(h) => Some(format!("{:?}", h)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_function_def_rule() {
        let actions = rule_for("def f(a, b=1) -> int:\n    pass\n", "FunctionDef");
        assert_eq!(
            significant(&actions),
            vec!["def", "f", "(", "<visit>", ")", "->", "<visit>", ":", "<visit>"]
        );
    }

    #[test]
    fn test_call_arguments_are_sorted_by_position() {
        let actions = rule_for("f(1, *[a, 3], x=2, y=5, **k)\n", "Call");
        assert_eq!(
            significant(&actions),
            vec![
                "<visit>", "(", "<visit>", "<visit>", "x", "=", "<visit>", "y", "=", "<visit>",
                "**", "<visit>", ")"
            ]
        );
    }

    #[test]
    fn test_keywords_have_no_rule() {
        let tree = parse("f(x=1)\n").unwrap();
        let keyword = tree
            .walk()
            .into_iter()
            .find(|id| tree.name(*id) == "keyword")
            .unwrap();
        assert_eq!(emission_rule(&tree, keyword), None);
    }

    #[test]
    fn test_arguments_rule() {
        let actions = rule_for("def f(a, /, b=2, *args, c, d=4, **kw):\n    pass\n", "arguments");
        assert_eq!(
            significant(&actions),
            vec![
                "<visit>", "/", "<visit>", "=", "<visit>", "*", "<visit>", "<visit>", "<visit>",
                "=", "<visit>", "**", "<visit>"
            ]
        );
    }

    #[test]
    fn test_bare_star_before_keyword_only() {
        let actions = rule_for("def f(*, c):\n    pass\n", "arguments");
        assert_eq!(significant(&actions), vec!["*", "<visit>"]);
    }

    #[test]
    fn test_word_comparisons() {
        let actions = rule_for("a is not b\n", "Compare");
        assert_eq!(
            significant(&actions),
            vec!["<visit>", "is", "not", "<visit>"]
        );
    }

    #[test]
    fn test_if_rule_defers_keywords() {
        let actions = rule_for("if a:\n    pass\nelse:\n    pass\n", "If");
        assert_eq!(actions[0], Action::Helper(Helper::IfKeyword));
        assert!(matches!(actions.last(), Some(Action::Helper(Helper::IfElse(_)))));
    }

    #[test]
    fn test_global_keyword() {
        let actions = rule_for("def f():\n    global a, b\n", "Global");
        assert_eq!(significant(&actions), vec!["global", "a", "b"]);
    }
}
