//! Macro-pattern grammar and its lowering into rules.
//!
//! A pattern is a sequence of literal tokens and capture forms:
//!
//! ```text
//! struct $name:ident { $( $field:ident : $ty:ident ; )* }
//! ( $( $arg:ident )* ) -> $body:expr
//! ```
//!
//! The pattern grammar recognizes that notation; [`lower`] turns the match
//! into a [`Rule`] that recognizes the *use sites* of the pattern.

use once_cell::sync::Lazy;
use tracing::trace;

use super::expression::EXPRESSION;
use crate::combinators::{Grammar, GrammarBuilder, Node, Rule};
use crate::errors::{
    to_source_span, unspanned, ErrorKind, ErrorReporting, MetaruleError, PhaseContext,
    SourceContext,
};
use crate::syntax::{fnv1a, Token, TokenKind, TokenStream};

pub const PATTERN: &str = "pattern";
pub const ELEMENT: &str = "element";
pub const GROUP_REP: &str = "group_rep";
pub const IDENT: &str = "ident";
pub const IDENTIFIER: &str = "identifier";
pub const EXPR: &str = "expr";
pub const BRACES: &str = "braces";
pub const PARENS: &str = "parens";
pub const LITERAL: &str = "literal";

const IDENT_FRAGMENT: u32 = fnv1a("ident");
const EXPR_FRAGMENT: u32 = fnv1a("expr");

/// Punctuation and operators a pattern may contain verbatim.
pub const LITERAL_TOKENS: [TokenKind; 15] = [
    TokenKind::Colon,
    TokenKind::Comma,
    TokenKind::Semicolon,
    TokenKind::Arrow,
    TokenKind::Plus,
    TokenKind::Minus,
    TokenKind::Asterisk,
    TokenKind::Slash,
    TokenKind::Tilde,
    TokenKind::Not,
    TokenKind::Equal,
    TokenKind::LessThan,
    TokenKind::GreaterThan,
    TokenKind::LessEqual,
    TokenKind::GreaterEqual,
];

static GRAMMAR: Lazy<Grammar> =
    Lazy::new(|| build().expect("pattern grammar references only its own rules"));

/// The shared pattern grammar, built on first use.
pub fn grammar() -> &'static Grammar {
    &GRAMMAR
}

/// Assemble a fresh copy of the pattern grammar.
pub fn build() -> Result<Grammar, MetaruleError> {
    // `$name:` prefix shared by both capture forms
    let capture = |fragment: u32| {
        Rule::group([
            Rule::token(TokenKind::Dollar),
            Rule::token(TokenKind::Identifier),
            Rule::token(TokenKind::Colon),
            Rule::identifier(fragment),
        ])
    };
    let delimited = |open: TokenKind, close: TokenKind| {
        Rule::group([
            Rule::token(open),
            Rule::reference(PATTERN),
            Rule::token(close),
        ])
    };

    // Alternatives are tried in this order; each is captured under its own
    // rule name so `lower` knows which one matched.
    let alternatives = [GROUP_REP, IDENT, IDENTIFIER, EXPR, BRACES, PARENS, LITERAL]
        .map(|name| Rule::capture(name, Rule::reference(name)));

    GrammarBuilder::new()
        .define(PATTERN, Rule::list(Rule::reference(ELEMENT)))
        .define(ELEMENT, Rule::one_of(alternatives))
        .define(
            GROUP_REP,
            Rule::group([
                Rule::token(TokenKind::Dollar),
                Rule::token(TokenKind::LeftParen),
                Rule::reference(PATTERN),
                Rule::token(TokenKind::RightParen),
                Rule::token(TokenKind::Asterisk),
            ]),
        )
        .define(IDENT, capture(IDENT_FRAGMENT))
        .define(IDENTIFIER, Rule::token(TokenKind::Identifier))
        .define(EXPR, capture(EXPR_FRAGMENT))
        .define(BRACES, delimited(TokenKind::LeftCurly, TokenKind::RightCurly))
        .define(PARENS, delimited(TokenKind::LeftParen, TokenKind::RightParen))
        .define(LITERAL, Rule::one_of(LITERAL_TOKENS.map(Rule::token)))
        .build(PATTERN)
}

// ============================================================================
// PUBLIC API
// ============================================================================

/// Parse pattern text and lower it into the rule it describes.
pub fn compile_pattern(source: &str) -> Result<Rule, MetaruleError> {
    let context = PhaseContext::new(SourceContext::from_source("pattern", source), "pattern");
    let stream = TokenStream::lex(source)?;

    // `pattern` is a list, so evaluation always succeeds; where it stopped is
    // where the text stopped being a pattern.
    let (node, remaining) = grammar()
        .evaluate(&stream)
        .into_option()
        .ok_or_else(|| context.invalid_pattern("pattern grammar did not match", unspanned()))?;

    if !remaining.is_at_end() {
        let token = remaining.peek();
        return Err(context
            .invalid_pattern(&format!("unexpected {} in pattern", token.kind), to_source_span(token.span))
            .with_help("patterns contain identifiers, punctuation, `$name:ident`, `$name:expr` and `$( ... )*`"));
    }

    lower(&node, &context)
}

/// Lower a match of the pattern grammar into a rule.
///
/// A sequence of one element lowers to that element; longer sequences
/// become a `Group`.
pub fn lower(node: &Node, context: &PhaseContext) -> Result<Rule, MetaruleError> {
    let elements = expect_elements(node, context)?;
    let rules = lower_sequence(elements, context)?;
    Ok(decompose(rules))
}

// ============================================================================
// LOWERING
// ============================================================================

fn lower_sequence(elements: &[Node], context: &PhaseContext) -> Result<Vec<Rule>, MetaruleError> {
    elements
        .iter()
        .map(|element| lower_element(element, context))
        .collect()
}

fn lower_element(node: &Node, context: &PhaseContext) -> Result<Rule, MetaruleError> {
    let Node::Capture { name, node: inner } = node else {
        return Err(context.malformed_tree("captured pattern element", span_of(node)));
    };

    let rule = match name.as_str() {
        GROUP_REP => {
            let body = expect_elements(child(inner, 2, context)?, context)?;
            if body.is_empty() {
                return Err(context.report(ErrorKind::EmptyRepetition, span_of(inner)));
            }
            Rule::optional(Rule::list(decompose(lower_sequence(body, context)?)))
        }
        IDENT => Rule::capture(binding_name(inner, context)?, Rule::token(TokenKind::Identifier)),
        EXPR => Rule::capture(binding_name(inner, context)?, Rule::reference(EXPRESSION)),
        IDENTIFIER => {
            let id = expect_token(inner, context)?
                .id
                .ok_or_else(|| context.malformed_tree("identifier id", span_of(inner)))?;
            Rule::identifier(id)
        }
        BRACES | PARENS => {
            let open = expect_token(child(inner, 0, context)?, context)?.kind;
            let close = expect_token(child(inner, 2, context)?, context)?.kind;
            let body = lower_sequence(expect_elements(child(inner, 1, context)?, context)?, context)?;

            let mut rules = vec![Rule::token(open)];
            if !body.is_empty() {
                rules.push(decompose(body));
            }
            rules.push(Rule::token(close));
            Rule::Group(rules)
        }
        LITERAL => Rule::token(expect_token(inner, context)?.kind),
        _ => return Err(context.malformed_tree("known pattern element", span_of(node))),
    };

    trace!(element = name.as_str(), rule = %rule, "lowered pattern element");
    Ok(rule)
}

fn decompose(mut rules: Vec<Rule>) -> Rule {
    if rules.len() == 1 {
        rules.remove(0)
    } else {
        Rule::Group(rules)
    }
}

/// The `name` in `$name:ident` / `$name:expr`.
fn binding_name(node: &Node, context: &PhaseContext) -> Result<String, MetaruleError> {
    Ok(expect_token(child(node, 1, context)?, context)?.text.clone())
}

fn child<'a>(node: &'a Node, index: usize, context: &PhaseContext) -> Result<&'a Node, MetaruleError> {
    match node {
        Node::Group(items) => items
            .get(index)
            .ok_or_else(|| context.malformed_tree("group element", span_of(node))),
        _ => Err(context.malformed_tree("group", span_of(node))),
    }
}

fn expect_elements<'a>(node: &'a Node, context: &PhaseContext) -> Result<&'a [Node], MetaruleError> {
    match node {
        Node::List(items) => Ok(items),
        _ => Err(context.malformed_tree("pattern sequence", span_of(node))),
    }
}

fn expect_token<'a>(node: &'a Node, context: &PhaseContext) -> Result<&'a Token, MetaruleError> {
    node.token()
        .ok_or_else(|| context.malformed_tree("token", span_of(node)))
}

fn span_of(node: &Node) -> miette::SourceSpan {
    node.span().map_or_else(unspanned, to_source_span)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn accepts(source: &str) -> bool {
        grammar().compile(&TokenStream::lex(source).unwrap()).is_some()
    }

    #[test]
    fn recognizes_capture_forms() {
        assert!(accepts("$x:ident"));
        assert!(accepts("$e:expr"));
        assert!(accepts("$( $x:ident , )*"));
        assert!(accepts("struct $name:ident { $( $f:ident : $t:ident ; )* }"));
        assert!(accepts("( $( $a:ident )* ) -> $body:expr"));
        assert!(accepts(""));
    }

    #[test]
    fn rejects_unknown_fragments_and_stray_delimiters() {
        assert!(!accepts("$x:ty"));
        assert!(!accepts("$x"));
        assert!(!accepts("$( a )"));
        assert!(!accepts("{ a"));
        assert!(!accepts("a )"));
        assert!(!accepts("12"));
    }

    #[test]
    fn single_literal_lowers_to_itself() {
        assert_eq!(compile_pattern("->").unwrap(), Rule::token(TokenKind::Arrow));
        assert_eq!(compile_pattern("fn").unwrap(), Rule::keyword("fn"));
    }

    #[test]
    fn empty_pattern_is_empty_group() {
        assert_eq!(compile_pattern("").unwrap(), Rule::group([]));
    }

    #[test]
    fn delimiters_wrap_their_body() {
        assert_eq!(
            compile_pattern("{ }").unwrap(),
            Rule::group([Rule::token(TokenKind::LeftCurly), Rule::token(TokenKind::RightCurly)])
        );
        assert_eq!(
            compile_pattern("( a , b )").unwrap(),
            Rule::group([
                Rule::token(TokenKind::LeftParen),
                Rule::group([
                    Rule::keyword("a"),
                    Rule::token(TokenKind::Comma),
                    Rule::keyword("b"),
                ]),
                Rule::token(TokenKind::RightParen),
            ])
        );
    }

    #[test]
    fn empty_repetition_is_an_error() {
        let err = compile_pattern("a $( )*").unwrap_err();
        assert_eq!(err.kind, ErrorKind::EmptyRepetition);
    }

    #[test]
    fn invalid_pattern_points_at_the_offending_token() {
        let err = compile_pattern("a b $x:ty").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::InvalidPattern { .. }));
        assert_eq!(err.source_info.primary_span.offset(), 4);
    }

    #[test]
    fn lex_errors_pass_through() {
        let err = compile_pattern("a @ b").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::UnexpectedCharacter { .. }));
    }

    fn nested_braces(depth: usize) -> String {
        format!("{}a{}", "{".repeat(depth), "}".repeat(depth))
    }

    #[test]
    fn deeply_nested_braces_are_rejected_without_overflow() {
        let err = compile_pattern(&nested_braces(5_000)).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::InvalidPattern { .. }));
    }

    #[test]
    fn moderately_nested_braces_compile() {
        let mut expected = Rule::keyword("a");
        for _ in 0..20 {
            expected = Rule::group([
                Rule::token(TokenKind::LeftCurly),
                expected,
                Rule::token(TokenKind::RightCurly),
            ]);
        }
        assert_eq!(compile_pattern(&nested_braces(20)).unwrap(), expected);
    }
}
