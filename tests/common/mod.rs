//! Shared helpers for the integration tests.
#![allow(dead_code)]

use metarule::ast::Expr;
use metarule::grammars::expression;
use metarule::{MacroMatch, MacroRule, Node, TokenStream};

pub const STRUCT_PATTERN: &str =
    "struct $struct_name:ident { $( $field_name:ident : $field_type:ident ; )* }";
pub const FUNCTION_PATTERN: &str = "( $( $struct_name:ident )* ) -> $expr:expr";

pub fn lex(source: &str) -> TokenStream {
    TokenStream::lex(source).unwrap()
}

/// Full-input match with the expression grammar.
pub fn expression(source: &str) -> Option<Node> {
    expression::grammar().compile(&lex(source))
}

pub fn parse_expr(source: &str) -> Expr {
    Expr::parse(source)
        .unwrap()
        .unwrap_or_else(|| panic!("{:?} should parse as an expression", source))
}

pub fn apply(pattern: &str, input: &str) -> Option<MacroMatch> {
    MacroRule::compile(pattern).unwrap().apply(input).unwrap()
}
