//! Property-based tests for the token list builder and the synchronizer
//!
//! Generated programs are built from a small expression grammar, so every one of them parses;
//! arbitrary text only has to survive tokenizing without losing a byte.

use proptest::prelude::*;
use tokenorder::tog::lexing::make_tokens;
use tokenorder::tog::parsing::parse;
use tokenorder::tog::synchronizer::{synchronize_with, Driver};
use tokenorder::tog::token::detokenize;

fn name() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["a", "b", "foo", "bar_1", "x"]).prop_map(str::to_string)
}

fn atom() -> impl Strategy<Value = String> {
    prop_oneof![
        name(),
        (0u32..1000).prop_map(|n| n.to_string()),
        prop::sample::select(vec!["'s'", "\"t\"", "None", "True"]).prop_map(str::to_string),
    ]
}

fn expr() -> impl Strategy<Value = String> {
    atom().prop_recursive(4, 32, 4, |inner| {
        prop_oneof![
            (inner.clone(), prop::sample::select(vec!["+", "-", "*", "//", "%", "<", "==", "and", "or"]), inner.clone())
                .prop_map(|(l, op, r)| format!("{} {} {}", l, op, r)),
            inner.clone().prop_map(|e| format!("({})", e)),
            inner.clone().prop_map(|e| format!("-{}", e)),
            inner.clone().prop_map(|e| format!("(not {})", e)),
            (name(), prop::collection::vec(inner.clone(), 0..3))
                .prop_map(|(f, args)| format!("{}({})", f, args.join(", "))),
            prop::collection::vec(inner.clone(), 0..3).prop_map(|items| format!("[{}]", items.join(", "))),
            (inner.clone(), name()).prop_map(|(e, attr)| format!("({}).{}", e, attr)),
            (inner.clone(), inner).prop_map(|(e, i)| format!("{}[{}]", e, i)),
        ]
    })
}

fn statement() -> impl Strategy<Value = String> {
    prop_oneof![
        (name(), expr()).prop_map(|(n, e)| format!("{} = {}\n", n, e)),
        expr().prop_map(|e| format!("{}\n", e)),
        (expr(), name(), expr()).prop_map(|(c, n, e)| format!("if {}:\n    {} = {}\n", c, n, e)),
        (name(), expr()).prop_map(|(n, e)| format!("def {}(p, q=1):\n    return {}\n", n, e)),
        expr().prop_map(|e| format!("x = {}  # note\n", e)),
    ]
}

fn program() -> impl Strategy<Value = String> {
    prop::collection::vec(statement(), 1..6).prop_map(|lines| lines.concat())
}

proptest! {
    #[test]
    fn test_tokenize_round_trip(source in "[a-z0-9 =+()\\[\\]:,.#'\\n]{0,60}") {
        if let Ok(tokens) = make_tokens(&source) {
            prop_assert_eq!(detokenize(&tokens), source);
        }
    }

    #[test]
    fn test_generated_programs_round_trip(source in program()) {
        let tokens = make_tokens(&source).unwrap();
        prop_assert_eq!(detokenize(&tokens), source);
    }

    #[test]
    fn test_generated_programs_link(source in program()) {
        let tree = parse(&source).unwrap();
        let mut traces = Vec::new();
        for driver in [Driver::Recursive, Driver::Iterative] {
            let mut tokens = make_tokens(&source).unwrap();
            let links = synchronize_with(&mut tokens, &tree, "gen.py", driver)
                .map_err(|e| TestCaseError::fail(format!("{}\n{}", source, e)))?;

            let trace = links.sync_trace().to_vec();
            prop_assert!(trace.windows(2).all(|w| w[0] < w[1]));
            for token in tokens.iter().filter(|t| t.is_significant() && !t.value.is_empty()) {
                prop_assert!(token.node.is_some(), "unowned {}", token.dump());
            }
            traces.push(trace);
        }
        prop_assert_eq!(&traces[0], &traces[1]);
    }
}
