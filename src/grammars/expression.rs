//! Arithmetic expression grammar.
//!
//! Five tiers, lowest precedence first:
//!
//! ```text
//! expression     = comparison
//! comparison     = addition (('<' | '<=' | '>' | '>=') addition)*
//! addition       = multiplication (('+' | '-') multiplication)*
//! multiplication = unary (('*' | '/') unary)*
//! unary          = ('+' | '-' | '!' | '~') unary | primitive
//! primitive      = '(' expression ')' | identifier | number
//! ```
//!
//! Binary tiers are `Chain`s, so repeated operators fold to the left.

use once_cell::sync::Lazy;

use crate::combinators::{Grammar, GrammarBuilder, Rule};
use crate::errors::MetaruleError;
use crate::syntax::TokenKind;

pub const EXPRESSION: &str = "expression";
pub const COMPARISON: &str = "comparison";
pub const ADDITION: &str = "addition";
pub const MULTIPLICATION: &str = "multiplication";
pub const UNARY: &str = "unary";
pub const PRIMITIVE: &str = "primitive";

const UNARY_OPERATORS: [TokenKind; 4] = [
    TokenKind::Plus,
    TokenKind::Minus,
    TokenKind::Not,
    TokenKind::Tilde,
];
const MULTIPLICATIVE_OPERATORS: [TokenKind; 2] = [TokenKind::Asterisk, TokenKind::Slash];
const ADDITIVE_OPERATORS: [TokenKind; 2] = [TokenKind::Plus, TokenKind::Minus];
// `>=` is listed twice; the second alternative is unreachable under
// first-match `one_of` and is kept as such.
const COMPARISON_OPERATORS: [TokenKind; 5] = [
    TokenKind::LessThan,
    TokenKind::LessEqual,
    TokenKind::GreaterThan,
    TokenKind::GreaterEqual,
    TokenKind::GreaterEqual,
];

static GRAMMAR: Lazy<Grammar> =
    Lazy::new(|| build().expect("expression grammar references only its own rules"));

/// The shared expression grammar, built on first use.
pub fn grammar() -> &'static Grammar {
    &GRAMMAR
}

/// Assemble a fresh copy of the expression grammar.
pub fn build() -> Result<Grammar, MetaruleError> {
    GrammarBuilder::new()
        .define(
            PRIMITIVE,
            Rule::one_of([
                Rule::group([
                    Rule::token(TokenKind::LeftParen),
                    Rule::reference(EXPRESSION),
                    Rule::token(TokenKind::RightParen),
                ]),
                Rule::token(TokenKind::Identifier),
                Rule::token(TokenKind::Number),
            ]),
        )
        .define(
            UNARY,
            Rule::one_of(
                UNARY_OPERATORS
                    .into_iter()
                    .map(|op| Rule::group([Rule::token(op), Rule::reference(UNARY)]))
                    .chain([Rule::reference(PRIMITIVE)]),
            ),
        )
        .define(MULTIPLICATION, binary_tier(UNARY, &MULTIPLICATIVE_OPERATORS))
        .define(ADDITION, binary_tier(MULTIPLICATION, &ADDITIVE_OPERATORS))
        .define(COMPARISON, binary_tier(ADDITION, &COMPARISON_OPERATORS))
        .define(EXPRESSION, Rule::reference(COMPARISON))
        .build(EXPRESSION)
}

/// `operand (op operand)*` for each `op` in `operators`, tried in order.
fn binary_tier(operand: &str, operators: &[TokenKind]) -> Rule {
    Rule::chain(
        Rule::reference(operand),
        Rule::one_of(
            operators
                .iter()
                .map(|&op| Rule::group([Rule::token(op), Rule::reference(operand)])),
        ),
    )
}
