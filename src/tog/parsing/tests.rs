use super::*;
use crate::tog::ast::{CmpOperator, ConstantValue, NodeKind, Position};

fn dump(source: &str) -> String {
    parse(source).unwrap().dump()
}

fn find<'a>(ast: &'a Ast, name: &str) -> Vec<&'a NodeKind> {
    ast.walk()
        .into_iter()
        .filter(|id| ast.name(*id) == name)
        .map(|id| ast.kind(id))
        .collect()
}

#[test]
fn test_assignment() {
    assert_eq!(dump("x = 1\n"), "Module\n  Assign\n    Name x\n    Constant 1\n");
}

#[test]
fn test_empty_module() {
    assert_eq!(dump(""), "Module\n");
    assert_eq!(dump("# only a comment\n"), "Module\n");
}

#[test]
fn test_function_def() {
    assert_eq!(
        dump("def f(a, b=1):\n    return a\n"),
        "Module\n  FunctionDef f\n    arguments\n      arg a\n      arg b\n      Constant 1\n    Return\n      Name a\n"
    );
}

#[test]
fn test_elif_chain_nests_in_orelse() {
    let source = "if a:\n    pass\nelif b:\n    pass\nelse:\n    pass\n";
    assert_eq!(
        dump(source),
        "Module\n  If\n    Name a\n    Pass\n    If\n      Name b\n      Pass\n      Pass\n"
    );
}

#[test]
fn test_decorated_class() {
    assert_eq!(
        dump("@dec\nclass A(B, metaclass=M):\n    pass\n"),
        "Module\n  ClassDef A\n    Name dec\n    Name B\n    keyword metaclass\n      Name M\n    Pass\n"
    );
}

#[test]
fn test_call_argument_positions() {
    let ast = parse("f(1, *[a, 3], x=2, y=5)\n").unwrap();
    let calls = find(&ast, "Call");
    let NodeKind::Call { args, keywords, .. } = calls[0] else {
        panic!("expected a call");
    };
    assert_eq!(ast.name(args[1]), "Starred");
    assert_eq!(ast.position(args[1]), Position::new(1, 5));
    assert_eq!(ast.position(keywords[0]), Position::new(1, 14));
    assert_eq!(ast.position(keywords[1]), Position::new(1, 19));
}

#[test]
fn test_string_concatenation() {
    let ast = parse("s = 'a' 'b'\nt = f'{x}' 'y'\nu = b'z'\n").unwrap();
    let constants = find(&ast, "Constant");
    assert_eq!(
        constants[0],
        &NodeKind::Constant {
            value: ConstantValue::Str("'a' 'b'".to_string())
        }
    );
    assert_eq!(
        constants[1],
        &NodeKind::Constant {
            value: ConstantValue::Bytes("b'z'".to_string())
        }
    );
    assert_eq!(find(&ast, "JoinedStr").len(), 1);
}

#[test]
fn test_relative_imports() {
    let ast = parse("from ..a import (b as c, d,)\nfrom ... import x\nimport p.q as r\n").unwrap();
    let labels: Vec<String> = ast
        .walk()
        .into_iter()
        .filter(|id| matches!(ast.name(*id), "ImportFrom" | "Import" | "alias"))
        .map(|id| format!("{} {}", ast.name(id), ast.kind(id).label()))
        .collect();
    assert_eq!(
        labels,
        vec![
            "ImportFrom ..a",
            "alias b as c",
            "alias d",
            "ImportFrom ...",
            "alias x",
            "Import ",
            "alias p.q as r"
        ]
    );
}

#[test]
fn test_word_comparisons() {
    let ast = parse("a not in b is not c\n").unwrap();
    let compares = find(&ast, "Compare");
    let NodeKind::Compare { ops, .. } = compares[0] else {
        panic!("expected a comparison");
    };
    assert_eq!(ops, &vec![CmpOperator::NotIn, CmpOperator::IsNot]);
}

#[test]
fn test_lambda_parameters() {
    let ast = parse("f = lambda x, *y, z=1, **k: x\n").unwrap();
    let arguments = find(&ast, "arguments");
    let NodeKind::Arguments {
        args,
        vararg,
        kwonlyargs,
        kw_defaults,
        kwarg,
        ..
    } = arguments[0]
    else {
        panic!("expected arguments");
    };
    assert_eq!(args.len(), 1);
    assert!(vararg.is_some());
    assert_eq!(kwonlyargs.len(), 1);
    assert!(kw_defaults[0].is_some());
    assert!(kwarg.is_some());
}

#[test]
fn test_positional_only_and_bare_star() {
    let ast = parse("def f(a, /, b, *, c):\n    pass\n").unwrap();
    let arguments = find(&ast, "arguments");
    let NodeKind::Arguments {
        posonlyargs,
        args,
        vararg,
        kwonlyargs,
        ..
    } = arguments[0]
    else {
        panic!("expected arguments");
    };
    assert_eq!(posonlyargs.len(), 1);
    assert_eq!(args.len(), 1);
    assert!(vararg.is_none());
    assert_eq!(kwonlyargs.len(), 1);
}

#[test]
fn test_slices() {
    assert_eq!(
        dump("a[1:2, ::3]\n"),
        "Module\n  Expr\n    Subscript\n      Name a\n      Tuple\n        Slice\n          Constant 1\n          Constant 2\n        Slice\n          Constant 3\n"
    );
}

#[test]
fn test_dict_unpacking() {
    let ast = parse("d = {**a, 'b': 1}\n").unwrap();
    let dicts = find(&ast, "Dict");
    let NodeKind::Dict { keys, values } = dicts[0] else {
        panic!("expected a dict");
    };
    assert_eq!(keys.len(), 2);
    assert!(keys[0].is_none());
    assert!(keys[1].is_some());
    assert_eq!(values.len(), 2);
}

#[test]
fn test_comprehension() {
    assert_eq!(
        dump("[x for x in y if x]\n"),
        "Module\n  Expr\n    ListComp\n      Name x\n      comprehension\n        Name x\n        Name y\n        Name x\n"
    );
}

#[test]
fn test_compound_statements() {
    let source = "\
async def f():
    async with a as b, c:
        pass
    async for x in y:
        await x
try:
    pass
except E as e:
    raise X from e
else:
    pass
finally:
    pass
while x:
    break
else:
    continue
";
    let ast = parse(source).unwrap();
    assert_eq!(find(&ast, "AsyncFunctionDef").len(), 1);
    assert_eq!(find(&ast, "AsyncWith").len(), 1);
    assert_eq!(find(&ast, "withitem").len(), 2);
    assert_eq!(find(&ast, "AsyncFor").len(), 1);
    assert_eq!(find(&ast, "Await").len(), 1);
    assert_eq!(find(&ast, "ExceptHandler").len(), 1);
    assert_eq!(find(&ast, "Raise").len(), 1);
    assert_eq!(find(&ast, "While").len(), 1);
}

#[test]
fn test_assignment_forms() {
    let ast = parse("a = b = c\nx += 1\ny: int = 2\nz: str\n(p, q) = *r, s = t\n").unwrap();
    assert_eq!(find(&ast, "Assign").len(), 2);
    assert_eq!(find(&ast, "AugAssign").len(), 1);
    assert_eq!(find(&ast, "AnnAssign").len(), 2);
    let assigns = find(&ast, "Assign");
    let NodeKind::Assign { targets, .. } = assigns[0] else {
        panic!("expected an assignment");
    };
    assert_eq!(targets.len(), 2);
}

#[test]
fn test_walrus_and_conditional() {
    let ast = parse("if (n := len(a)) > 10:\n    x = 1 if n else 2\n").unwrap();
    assert_eq!(find(&ast, "NamedExpr").len(), 1);
    assert_eq!(find(&ast, "IfExp").len(), 1);
}

#[test]
fn test_generator_argument() {
    let ast = parse("sum(x for x in y)\n").unwrap();
    assert_eq!(find(&ast, "GeneratorExp").len(), 1);
}

#[test]
fn test_long_elif_chain() {
    let mut source = String::from("if x == 0:\n    pass\n");
    for i in 1..2000 {
        source.push_str(&format!("elif x == {}:\n    pass\n", i));
    }
    let ast = parse(&source).unwrap();
    assert_eq!(find(&ast, "If").len(), 2000);
}

#[test]
fn test_syntax_error() {
    let err = parse("def f(:):\n    pass\n").unwrap_err();
    assert!(matches!(err, ParseError::Syntax { line: 1, .. }), "{}", err);
}

#[test]
fn test_tokenize_error_is_wrapped() {
    assert_eq!(
        parse("x = (1,\n"),
        Err(ParseError::Tokenize(TokenizeError::UnclosedBracket {
            bracket: '(',
            line: 1,
            col: 4
        }))
    );
    assert_eq!(
        parse("def f(:\n    pass\n"),
        Err(ParseError::Tokenize(TokenizeError::UnclosedBracket {
            bracket: '(',
            line: 1,
            col: 5
        }))
    );
}

#[test]
fn test_unexpected_indent() {
    assert!(parse("    x = 1\n").is_err());
}
