//! The combinator vocabulary.
//!
//! A [`Rule`] is a plain value: grammars are trees of rules tied together by
//! named references. Evaluation is a pure function of a rule and a stream; the
//! only context it needs is the grammar to resolve references in and the
//! current nesting depth.

use serde::Serialize;
use std::fmt;

use super::{Evaluator, Node, ParseResult};
use crate::syntax::{fnv1a, TokenKind, TokenStream};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Rule {
    /// One token of the given kind.
    Token(TokenKind),
    /// One identifier whose id equals the given hash.
    Identifier(u32),
    /// Every sub-rule, in order.
    Group(Vec<Rule>),
    /// One `first`, then zero or more `next`, folded to the left.
    Chain(Box<Rule>, Box<Rule>),
    /// Inner rule or nothing; never fails.
    Optional(Box<Rule>),
    /// Zero or more repetitions; never fails.
    List(Box<Rule>),
    /// First alternative that matches.
    OneOf(Vec<Rule>),
    /// A rule of the enclosing grammar, by name.
    Reference(String),
    /// Inner rule, with its value recorded under a name.
    Capture(String, Box<Rule>),
}

impl Rule {
    pub fn token(kind: TokenKind) -> Self {
        Rule::Token(kind)
    }

    pub fn identifier(id: u32) -> Self {
        Rule::Identifier(id)
    }

    /// Matches the literal word `word`.
    pub fn keyword(word: &str) -> Self {
        Rule::Identifier(fnv1a(word))
    }

    pub fn group(rules: impl IntoIterator<Item = Rule>) -> Self {
        Rule::Group(rules.into_iter().collect())
    }

    pub fn chain(first: Rule, next: Rule) -> Self {
        Rule::Chain(Box::new(first), Box::new(next))
    }

    pub fn optional(inner: Rule) -> Self {
        Rule::Optional(Box::new(inner))
    }

    pub fn list(inner: Rule) -> Self {
        Rule::List(Box::new(inner))
    }

    pub fn one_of(alternatives: impl IntoIterator<Item = Rule>) -> Self {
        Rule::OneOf(alternatives.into_iter().collect())
    }

    pub fn reference(name: impl Into<String>) -> Self {
        Rule::Reference(name.into())
    }

    pub fn capture(name: impl Into<String>, inner: Rule) -> Self {
        Rule::Capture(name.into(), Box::new(inner))
    }

    /// Names of all rules this rule refers to, in tree order.
    pub fn references(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_references(&mut names);
        names
    }

    fn collect_references<'a>(&'a self, names: &mut Vec<&'a str>) {
        match self {
            Rule::Token(_) | Rule::Identifier(_) => {}
            Rule::Group(rules) | Rule::OneOf(rules) => {
                for rule in rules {
                    rule.collect_references(names);
                }
            }
            Rule::Chain(first, next) => {
                first.collect_references(names);
                next.collect_references(names);
            }
            Rule::Optional(inner) | Rule::List(inner) | Rule::Capture(_, inner) => {
                inner.collect_references(names)
            }
            Rule::Reference(name) => names.push(name),
        }
    }

    /// Evaluate against `stream`. `depth` counts the structural rules above
    /// this one; at `max_depth` a structural rule fails without recursing.
    pub(crate) fn evaluate(
        &self,
        stream: &TokenStream,
        evaluator: &Evaluator<'_>,
        depth: usize,
    ) -> ParseResult<Node> {
        match self {
            Rule::Token(kind) => {
                let token = stream.peek();
                if token.kind == *kind {
                    ParseResult::success(Node::Token(token.clone()), stream.advance())
                } else {
                    ParseResult::Failure
                }
            }
            Rule::Identifier(id) => {
                let token = stream.peek();
                if token.is_identifier(*id) {
                    ParseResult::success(Node::Identifier(token.clone()), stream.advance())
                } else {
                    ParseResult::Failure
                }
            }
            _ if depth >= evaluator.max_depth() => {
                evaluator.depth_exceeded(self, stream);
                ParseResult::Failure
            }
            Rule::Group(rules) => evaluate_group(rules, stream, evaluator, depth + 1),
            Rule::Chain(first, next) => evaluate_chain(first, next, stream, evaluator, depth + 1),
            Rule::Optional(inner) => evaluate_optional(inner, stream, evaluator, depth + 1),
            Rule::List(inner) => evaluate_list(inner, stream, evaluator, depth + 1),
            Rule::OneOf(alternatives) => evaluate_one_of(alternatives, stream, evaluator, depth + 1),
            Rule::Reference(name) => evaluator.evaluate_reference(name, stream, depth + 1),
            Rule::Capture(name, inner) => {
                inner
                    .evaluate(stream, evaluator, depth + 1)
                    .map(|node| Node::Capture {
                        name: name.clone(),
                        node: Box::new(node),
                    })
            }
        }
    }
}

// ============================================================================
// STRUCTURAL COMBINATORS
// ============================================================================

fn evaluate_group(
    rules: &[Rule],
    stream: &TokenStream,
    evaluator: &Evaluator<'_>,
    depth: usize,
) -> ParseResult<Node> {
    let mut values = Vec::with_capacity(rules.len());
    let mut current = stream.clone();
    for rule in rules {
        match rule.evaluate(&current, evaluator, depth) {
            ParseResult::Success { value, remaining } => {
                values.push(value);
                current = remaining;
            }
            ParseResult::Failure => return ParseResult::Failure,
        }
    }
    ParseResult::success(Node::Group(values), current)
}

fn evaluate_chain(
    first: &Rule,
    next: &Rule,
    stream: &TokenStream,
    evaluator: &Evaluator<'_>,
    depth: usize,
) -> ParseResult<Node> {
    let (mut accumulated, mut current) = match first.evaluate(stream, evaluator, depth).into_option() {
        Some(success) => success,
        None => return ParseResult::Failure,
    };
    // a `next` that consumes nothing would repeat forever
    while let Some((value, remaining)) = next.evaluate(&current, evaluator, depth).into_option() {
        if remaining == current {
            break;
        }
        accumulated = Node::Chain(Box::new(accumulated), Box::new(value));
        current = remaining;
    }
    ParseResult::success(accumulated, current)
}

fn evaluate_optional(
    inner: &Rule,
    stream: &TokenStream,
    evaluator: &Evaluator<'_>,
    depth: usize,
) -> ParseResult<Node> {
    match inner.evaluate(stream, evaluator, depth) {
        ParseResult::Success { value, remaining } => {
            ParseResult::success(Node::Optional(Some(Box::new(value))), remaining)
        }
        ParseResult::Failure => ParseResult::success(Node::Optional(None), stream.clone()),
    }
}

fn evaluate_list(
    inner: &Rule,
    stream: &TokenStream,
    evaluator: &Evaluator<'_>,
    depth: usize,
) -> ParseResult<Node> {
    let mut values = Vec::new();
    let mut current = stream.clone();
    while let Some((value, remaining)) = inner.evaluate(&current, evaluator, depth).into_option() {
        if remaining == current {
            break;
        }
        values.push(value);
        current = remaining;
    }
    ParseResult::success(Node::List(values), current)
}

fn evaluate_one_of(
    alternatives: &[Rule],
    stream: &TokenStream,
    evaluator: &Evaluator<'_>,
    depth: usize,
) -> ParseResult<Node> {
    for alternative in alternatives {
        let result = alternative.evaluate(stream, evaluator, depth);
        if result.is_success() {
            return result;
        }
    }
    ParseResult::Failure
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::Token(kind) => write!(f, "{}", kind),
            Rule::Identifier(id) => write!(f, "ident#{:08x}", id),
            Rule::Group(rules) => write_call(f, "group", rules, ", "),
            Rule::Chain(first, next) => write!(f, "chain({}, {})", first, next),
            Rule::Optional(inner) => write!(f, "optional({})", inner),
            Rule::List(inner) => write!(f, "list({})", inner),
            Rule::OneOf(rules) => write_call(f, "one_of", rules, " | "),
            Rule::Reference(name) => write!(f, "@{}", name),
            Rule::Capture(name, inner) => write!(f, "${}:{}", name, inner),
        }
    }
}

fn write_call(f: &mut fmt::Formatter<'_>, name: &str, rules: &[Rule], separator: &str) -> fmt::Result {
    write!(f, "{}(", name)?;
    for (i, rule) in rules.iter().enumerate() {
        if i > 0 {
            f.write_str(separator)?;
        }
        write!(f, "{}", rule)?;
    }
    f.write_str(")")
}
