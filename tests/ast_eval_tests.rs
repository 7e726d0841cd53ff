// Typed expression tree: lowering and integer evaluation.

mod common;

use common::parse_expr;
use metarule::ast::{BinaryOp, Environment, Expr};
use metarule::errors::{ErrorCategory, SourceContext};
use metarule::ErrorKind;

fn eval_with(source: &str, env: &Environment) -> Result<i64, metarule::MetaruleError> {
    parse_expr(source).evaluate(env, &SourceContext::from_source("test", source))
}

fn eval(source: &str) -> i64 {
    eval_with(source, &Environment::new()).unwrap()
}

#[test]
fn arithmetic() {
    assert_eq!(eval("12 - (97 - 11) + 121"), 47);
    assert_eq!(eval("12 - ((97 - 11)) + 121"), 47);
    assert_eq!(eval("2 + 3 * 4"), 14);
    assert_eq!(eval("(2 + 3) * 4"), 20);
    assert_eq!(eval("7 / 2"), 3);
    assert_eq!(eval("10 - 3 - 2"), 5);
}

#[test]
fn unary_operators() {
    assert_eq!(eval("-5 + +2"), -3);
    assert_eq!(eval("!0"), 1);
    assert_eq!(eval("!7"), 0);
    assert_eq!(eval("~0"), -1);
    assert_eq!(eval("--3"), 3);
}

#[test]
fn comparisons_yield_one_or_zero() {
    assert_eq!(eval("1 < 2"), 1);
    assert_eq!(eval("2 <= 1"), 0);
    assert_eq!(eval("3 > 2 + 1"), 0);
    assert_eq!(eval("3 >= 2 + 1"), 1);
}

#[test]
fn identifiers_resolve_through_environment() {
    let env: Environment = [("a".to_string(), 6), ("b".to_string(), 7)].into_iter().collect();
    assert_eq!(eval_with("a * b - 2", &env).unwrap(), 40);

    let err = eval_with("a + c", &env).unwrap_err();
    assert_eq!(err.kind, ErrorKind::UnboundIdentifier { name: "c".into() });
    assert_eq!(err.source_info.primary_span.offset(), 4);
}

#[test]
fn arithmetic_failures_are_errors() {
    let err = eval_with("1 / (2 - 2)", &Environment::new()).unwrap_err();
    assert_eq!(err.kind, ErrorKind::DivisionByZero);
    assert_eq!(err.category(), ErrorCategory::Eval);

    let err = eval_with("9223372036854775807 + 1", &Environment::new()).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::ArithmeticOverflow { .. }));
}

#[test]
fn binary_nodes_keep_operand_order() {
    match parse_expr("a - b") {
        Expr::Binary { op, lhs, rhs, .. } => {
            assert_eq!(op, BinaryOp::Sub);
            assert_eq!(lhs.to_string(), "a");
            assert_eq!(rhs.to_string(), "b");
        }
        other => panic!("expected a binary node, got {:?}", other),
    }
}

#[test]
fn typed_tree_serializes() {
    let json = serde_json::to_value(parse_expr("-x")).unwrap();
    assert_eq!(json["Unary"]["op"], "Negate");
    assert_eq!(json["Unary"]["operand"]["Identifier"][0], "x");
}
