//! Typed expression tree.
//!
//! The expression grammar produces a generic match tree; this module lowers
//! it into an `Expr` with explicit unary and binary nodes. Chain pairs become
//! left-nested `Binary` nodes, parentheses disappear, and every node keeps
//! the span it was parsed from.

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

use crate::combinators::Node;
use crate::errors::{
    to_source_span, unspanned, ErrorKind, ErrorReporting, MetaruleError, PhaseContext,
    SourceContext,
};
use crate::grammars::expression;
use crate::syntax::{Span, Token, TokenKind, TokenStream};

/// Values bound to identifiers during evaluation.
pub type Environment = HashMap<String, i64>;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum UnaryOp {
    Plus,
    Negate,
    Not,
    BitNot,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum BinaryOp {
    Mul,
    Div,
    Add,
    Sub,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
}

impl UnaryOp {
    pub fn from_kind(kind: TokenKind) -> Option<Self> {
        match kind {
            TokenKind::Plus => Some(UnaryOp::Plus),
            TokenKind::Minus => Some(UnaryOp::Negate),
            TokenKind::Not => Some(UnaryOp::Not),
            TokenKind::Tilde => Some(UnaryOp::BitNot),
            _ => None,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Plus => "+",
            UnaryOp::Negate => "-",
            UnaryOp::Not => "!",
            UnaryOp::BitNot => "~",
        }
    }
}

impl BinaryOp {
    pub fn from_kind(kind: TokenKind) -> Option<Self> {
        match kind {
            TokenKind::Asterisk => Some(BinaryOp::Mul),
            TokenKind::Slash => Some(BinaryOp::Div),
            TokenKind::Plus => Some(BinaryOp::Add),
            TokenKind::Minus => Some(BinaryOp::Sub),
            TokenKind::LessThan => Some(BinaryOp::Less),
            TokenKind::LessEqual => Some(BinaryOp::LessEqual),
            TokenKind::GreaterThan => Some(BinaryOp::Greater),
            TokenKind::GreaterEqual => Some(BinaryOp::GreaterEqual),
            _ => None,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Less => "<",
            BinaryOp::LessEqual => "<=",
            BinaryOp::Greater => ">",
            BinaryOp::GreaterEqual => ">=",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Expr {
    Number(i64, Span),
    Identifier(String, Span),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
        span: Span,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
        span: Span,
    },
}

impl Expr {
    /// Parse `source` with the expression grammar.
    ///
    /// `Ok(None)` means the text is not an expression; `Err` is reserved for
    /// lexing errors and out-of-range literals.
    pub fn parse(source: &str) -> Result<Option<Expr>, MetaruleError> {
        let stream = TokenStream::lex(source)?;
        match expression::grammar().compile(&stream) {
            Some(node) => {
                let source = SourceContext::from_source("expression", source);
                Expr::lower(&node, &source).map(Some)
            }
            None => Ok(None),
        }
    }

    /// Lower a match of the expression grammar (or an `expr` capture).
    pub fn lower(node: &Node, source: &SourceContext) -> Result<Expr, MetaruleError> {
        let context = PhaseContext::new(source.clone(), "eval");
        lower_node(node, &context)
    }

    pub fn span(&self) -> Span {
        match self {
            Expr::Number(_, span) | Expr::Identifier(_, span) => *span,
            Expr::Unary { span, .. } | Expr::Binary { span, .. } => *span,
        }
    }

    /// Fully parenthesized rendering: `((a - b) + c)`.
    pub fn pretty(&self) -> String {
        match self {
            Expr::Number(n, _) => n.to_string(),
            Expr::Identifier(name, _) => name.clone(),
            Expr::Unary { op, operand, .. } => format!("{}{}", op.symbol(), operand.pretty()),
            Expr::Binary { op, lhs, rhs, .. } => {
                format!("({} {} {})", lhs.pretty(), op.symbol(), rhs.pretty())
            }
        }
    }

    /// Evaluate with checked `i64` arithmetic. Comparisons and `!` yield 1 or 0.
    pub fn evaluate(&self, env: &Environment, source: &SourceContext) -> Result<i64, MetaruleError> {
        let context = PhaseContext::new(source.clone(), "eval");
        self.evaluate_in(env, &context)
    }

    fn evaluate_in(&self, env: &Environment, context: &PhaseContext) -> Result<i64, MetaruleError> {
        let span = to_source_span(self.span());
        match self {
            Expr::Number(n, _) => Ok(*n),
            Expr::Identifier(name, _) => env
                .get(name)
                .copied()
                .ok_or_else(|| context.report(ErrorKind::UnboundIdentifier { name: name.clone() }, span)),
            Expr::Unary { op, operand, .. } => {
                let value = operand.evaluate_in(env, context)?;
                match op {
                    UnaryOp::Plus => Ok(value),
                    UnaryOp::Negate => value
                        .checked_neg()
                        .ok_or_else(|| overflow(context, op.symbol(), span)),
                    UnaryOp::Not => Ok((value == 0) as i64),
                    UnaryOp::BitNot => Ok(!value),
                }
            }
            Expr::Binary { op, lhs, rhs, .. } => {
                let lhs = lhs.evaluate_in(env, context)?;
                let rhs = rhs.evaluate_in(env, context)?;
                let checked = match op {
                    BinaryOp::Mul => lhs.checked_mul(rhs),
                    BinaryOp::Div if rhs == 0 => {
                        return Err(context.report(ErrorKind::DivisionByZero, span));
                    }
                    BinaryOp::Div => lhs.checked_div(rhs),
                    BinaryOp::Add => lhs.checked_add(rhs),
                    BinaryOp::Sub => lhs.checked_sub(rhs),
                    BinaryOp::Less => Some((lhs < rhs) as i64),
                    BinaryOp::LessEqual => Some((lhs <= rhs) as i64),
                    BinaryOp::Greater => Some((lhs > rhs) as i64),
                    BinaryOp::GreaterEqual => Some((lhs >= rhs) as i64),
                };
                checked.ok_or_else(|| overflow(context, op.symbol(), span))
            }
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pretty())
    }
}

fn overflow(context: &PhaseContext, operation: &str, span: miette::SourceSpan) -> MetaruleError {
    context.report(
        ErrorKind::ArithmeticOverflow {
            operation: operation.into(),
        },
        span,
    )
}

// ============================================================================
// LOWERING
// ============================================================================

fn lower_node(node: &Node, context: &PhaseContext) -> Result<Expr, MetaruleError> {
    match node {
        Node::Token(token) => lower_token(token, context),

        Node::Capture { node, .. } => lower_node(node, context),

        // `( expression )`
        Node::Group(items) if items.len() == 3 && is_kind(&items[0], TokenKind::LeftParen) => {
            lower_node(&items[1], context)
        }

        // `op unary`
        Node::Group(items) if items.len() == 2 => {
            let op = operator(&items[0], UnaryOp::from_kind, context)?;
            let operand = lower_node(&items[1], context)?;
            let span = span_of(node, operand.span());
            Ok(Expr::Unary {
                op,
                operand: Box::new(operand),
                span,
            })
        }

        // `(accumulated, [op operand])`
        Node::Chain(left, right) => {
            let (op_node, rhs_node) = match right.elements() {
                Some([op, rhs]) => (op, rhs),
                _ => return Err(malformed(context, "operator and operand", right)),
            };
            let op = operator(op_node, BinaryOp::from_kind, context)?;
            let lhs = lower_node(left, context)?;
            let rhs = lower_node(rhs_node, context)?;
            let span = lhs.span().join(rhs.span());
            Ok(Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                span,
            })
        }

        _ => Err(malformed(context, "expression", node)),
    }
}

fn lower_token(token: &Token, context: &PhaseContext) -> Result<Expr, MetaruleError> {
    match token.kind {
        TokenKind::Number => token
            .text
            .parse::<i64>()
            .map(|n| Expr::Number(n, token.span))
            .map_err(|_| {
                context.report(
                    ErrorKind::InvalidLiteral {
                        literal_type: "integer".into(),
                        value: token.text.clone(),
                    },
                    to_source_span(token.span),
                )
            }),
        TokenKind::Identifier => Ok(Expr::Identifier(token.text.clone(), token.span)),
        _ => Err(context.malformed_tree("number or identifier", to_source_span(token.span))),
    }
}

fn operator<T>(
    node: &Node,
    from_kind: fn(TokenKind) -> Option<T>,
    context: &PhaseContext,
) -> Result<T, MetaruleError> {
    node.token()
        .and_then(|token| from_kind(token.kind))
        .ok_or_else(|| malformed(context, "operator", node))
}

fn is_kind(node: &Node, kind: TokenKind) -> bool {
    node.token().is_some_and(|token| token.kind == kind)
}

fn span_of(node: &Node, fallback: Span) -> Span {
    node.span().unwrap_or(fallback)
}

fn malformed(context: &PhaseContext, expected: &str, node: &Node) -> MetaruleError {
    let span = node.span().map_or_else(unspanned, to_source_span);
    context.malformed_tree(expected, span)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Expr {
        Expr::parse(source).unwrap().unwrap()
    }

    #[test]
    fn lowering_keeps_spans() {
        let expr = parse("a - 12");
        assert_eq!(expr.span(), Span::new(0, 6));
        match expr {
            Expr::Binary { op, lhs, rhs, .. } => {
                assert_eq!(op, BinaryOp::Sub);
                assert_eq!(*lhs, Expr::Identifier("a".into(), Span::new(0, 1)));
                assert_eq!(*rhs, Expr::Number(12, Span::new(4, 6)));
            }
            other => panic!("expected binary expression, got {:?}", other),
        }
    }

    #[test]
    fn unary_span_covers_operator() {
        assert_eq!(parse("  -x").span(), Span::new(2, 4));
    }

    #[test]
    fn rejection_is_not_an_error() {
        assert!(Expr::parse("a +").unwrap().is_none());
    }

    #[test]
    fn oversized_literal_is_reported() {
        let err = Expr::parse("99999999999999999999").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::InvalidLiteral { .. }));
    }
}
