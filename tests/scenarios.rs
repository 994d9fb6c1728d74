//! End-to-end scenarios for the synchronizer and the paren balancer

use tokenorder::tog::ast::Ast;
use tokenorder::tog::balance::{balance_parens, balance_parens_report, PairingError};
use tokenorder::tog::lexing::make_tokens;
use tokenorder::tog::parsing::parse;
use tokenorder::tog::synchronizer::{synchronize, synchronize_with, AssignLinksError, Driver, Links};
use tokenorder::tog::token::{Token, TokenKind};
use tokenorder::tog::traversal::{nearest_common_ancestor, tokens_for_node};

fn linked(source: &str) -> (Vec<Token>, Ast, Links) {
    let mut tokens = make_tokens(source).unwrap();
    balance_parens(&mut tokens);
    let tree = parse(source).unwrap();
    let links = synchronize(&mut tokens, &tree, "scenario.py").unwrap();
    (tokens, tree, links)
}

fn owner<'a>(tokens: &[Token], tree: &'a Ast, index: usize) -> Option<&'a str> {
    tokens[index].node.map(|id| tree.name(id))
}

fn find(tokens: &[Token], kind: TokenKind, value: &str) -> usize {
    tokens
        .iter()
        .position(|t| t.kind == kind && t.value == value)
        .unwrap()
}

#[test]
fn test_function_with_default() {
    let (tokens, tree, _) = linked("def f(a, b=1):\n    pass\n");
    assert_eq!(owner(&tokens, &tree, find(&tokens, TokenKind::Name, "def")), Some("FunctionDef"));
    assert_eq!(owner(&tokens, &tree, find(&tokens, TokenKind::Name, "b")), Some("arg"));
    assert_eq!(owner(&tokens, &tree, find(&tokens, TokenKind::Op, "=")), Some("arguments"));
    assert_eq!(owner(&tokens, &tree, find(&tokens, TokenKind::Number, "1")), Some("Constant"));

    // Parens are paired by the balancer and owned by nobody
    let open = find(&tokens, TokenKind::Op, "(");
    let close = find(&tokens, TokenKind::Op, ")");
    assert_eq!(tokens[open].matching_paren, Some(close));
    assert_eq!(tokens[close].matching_paren, Some(open));
    assert_eq!(tokens[open].node, None);
    assert_eq!(tokens[close].node, None);
}

#[test]
fn test_call_arguments_follow_source_order() {
    let source = "f(1, *[a, 3], x=2, y=5)\n";
    let (tokens, _, links) = linked(source);
    let matched: Vec<&str> = links
        .sync_trace()
        .iter()
        .map(|&i| tokens[i].value.as_str())
        .collect();
    assert_eq!(
        matched,
        vec!["f", "1", "*", "[", "a", "3", "]", "x", "=", "2", "y", "=", "5", ""]
    );
}

#[test]
fn test_elif_is_its_own_if() {
    let (tokens, tree, links) = linked("if a:\n    pass\nelif b:\n    pass\n");
    let elif = find(&tokens, TokenKind::Name, "elif");
    let if_ = find(&tokens, TokenKind::Name, "if");
    let inner = tokens[elif].node.unwrap();
    let outer = tokens[if_].node.unwrap();
    assert_eq!(tree.name(inner), "If");
    assert_eq!(links.parent(inner), Some(outer));
}

#[test]
fn test_else_if_is_nested() {
    let (tokens, tree, links) = linked("if a:\n    pass\nelse:\n    if b:\n        pass\n");
    let else_ = find(&tokens, TokenKind::Name, "else");
    let outer = tokens[else_].node.unwrap();
    let inner_if = tokens
        .iter()
        .filter(|t| t.is_name("if"))
        .nth(1)
        .and_then(|t| t.node)
        .unwrap();
    assert_eq!(tree.name(outer), "If");
    assert_eq!(links.parent(inner_if), Some(outer));
}

#[test]
fn test_dotted_import_alias() {
    let (tokens, tree, _) = linked("import a.b.c\n");
    let alias = tokens[find(&tokens, TokenKind::Name, "a")].node;
    assert!(alias.is_some());
    assert_eq!(tree.name(alias.unwrap()), "alias");
    for value in ["b", "c"] {
        assert_eq!(tokens[find(&tokens, TokenKind::Name, value)].node, alias);
    }
    let dots: Vec<&Token> = tokens.iter().filter(|t| t.is_op(".")).collect();
    assert_eq!(dots.len(), 2);
    assert!(dots.iter().all(|t| t.node == alias));
}

#[test]
fn test_removed_paren_is_reported() {
    let mut tokens = make_tokens("x = f(a)\n").unwrap();
    let close = find(&tokens, TokenKind::Op, ")");
    tokens[close].kind = TokenKind::Killed;
    tokens[close].value.clear();
    let (count, errors) = balance_parens_report(&mut tokens);
    assert_eq!(count, 0);
    assert_eq!(errors.len(), 1);
    assert!(matches!(errors[0], PairingError::UnclosedOpen { line: 1, .. }));
}

#[test]
fn test_corrupted_keyword_fails_fast() {
    let mut tokens = make_tokens("klass f():\n    pass\n").unwrap();
    let tree = parse("def f():\n    pass\n").unwrap();
    let err = synchronize(&mut tokens, &tree, "corrupt.py").unwrap_err();
    let AssignLinksError::Mismatch { context, expected, found } = &err else {
        panic!("unexpected error: {:?}", err);
    };
    assert_eq!(context.file_name, "corrupt.py");
    assert_eq!(context.line, 1);
    assert_eq!(expected, "name:def");
    assert_eq!(found, "name:klass");
    assert!(err.to_string().contains("klass f():"));
    assert!(tokens.iter().all(|t| t.node.is_none()));
}

#[test]
fn test_second_pass_fails() {
    let source = "def f(a):\n    return a\n";
    let mut tokens = make_tokens(source).unwrap();
    let tree = parse(source).unwrap();
    synchronize(&mut tokens, &tree, "twice.py").unwrap();
    for driver in [Driver::Recursive, Driver::Iterative] {
        let err = synchronize_with(&mut tokens, &tree, "twice.py", driver).unwrap_err();
        assert!(matches!(err, AssignLinksError::AlreadyLinked { .. }));
    }
}

#[test]
fn test_deep_nesting_matches_recursive_trace() {
    let depth = 50;
    let source = format!("x = {}1{}\n", "[".repeat(depth), "]".repeat(depth));
    let trace = |driver| {
        let mut tokens = make_tokens(&source).unwrap();
        let tree = parse(&source).unwrap();
        synchronize_with(&mut tokens, &tree, "deep.py", driver)
            .unwrap()
            .sync_trace()
            .to_vec()
    };
    let iterative = trace(Driver::Iterative);
    assert_eq!(iterative.len(), 2 * depth + 4);
    assert_eq!(iterative, trace(Driver::Recursive));
}

#[test]
fn test_deep_else_if_nesting_matches_recursive_trace() {
    let depth = 90;
    let mut source = String::new();
    for i in 0..depth {
        let pad = "    ".repeat(i);
        source.push_str(&format!("{pad}if c{i}:\n{pad}    pass\n{pad}else:\n"));
    }
    source.push_str(&format!("{}pass\n", "    ".repeat(depth)));

    let run = |driver| {
        let mut tokens = make_tokens(&source).unwrap();
        let tree = parse(&source).unwrap();
        let links = synchronize_with(&mut tokens, &tree, "nested.py", driver).unwrap();
        (tokens, tree, links)
    };
    let (tokens, tree, links) = run(Driver::Iterative);
    let (_, _, recursive) = run(Driver::Recursive);
    assert_eq!(links.sync_trace().len(), 6 * depth + 2);
    assert_eq!(links.sync_trace(), recursive.sync_trace());

    let innermost = tokens.iter().rev().find(|t| t.is_name("if")).unwrap();
    let mut id = innermost.node.unwrap();
    let mut enclosing_ifs = 0;
    while let Some(parent) = links.parent(id) {
        if tree.name(parent) == "If" {
            enclosing_ifs += 1;
        }
        id = parent;
    }
    assert_eq!(enclosing_ifs, depth - 1);
}

#[test]
fn test_node_ranges_and_common_ancestors() {
    let (tokens, tree, links) = linked("y = g(a + b, c)\n");
    let call = tree
        .walk()
        .into_iter()
        .find(|id| tree.name(*id) == "Call")
        .unwrap();
    let range = tokens_for_node(&links, &tokens, call).unwrap();
    let text: String = tokens[range].iter().map(|t| t.value.as_str()).collect();
    assert_eq!(text, "g(a + b, c)");

    let a = tokens[find(&tokens, TokenKind::Name, "a")].node.unwrap();
    let c = tokens[find(&tokens, TokenKind::Name, "c")].node.unwrap();
    assert_eq!(nearest_common_ancestor(&links, a, c), Some(call));
}
