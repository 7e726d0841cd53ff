//! Macro rules: capture patterns compiled into grammars.
//!
//! A [`MacroRule`] is built from pattern text such as
//! `struct $name:ident { $( $field:ident : $ty:ident ; )* }`. The pattern is
//! lowered into a [`Rule`] and installed as the start rule of a grammar that
//! also carries the expression grammar, so `$x:expr` captures resolve against
//! `expression`. Applying the rule to input text either accepts the whole
//! input and yields its captures, or rejects it.
//!
//! A compiled rule holds no evaluation state and may be applied from many
//! threads at once.

use serde::Serialize;
use tracing::debug;

use crate::combinators::{Bindings, Evaluator, Grammar, GrammarBuilder, Node, Rule, DEFAULT_MAX_DEPTH};
use crate::errors::MetaruleError;
use crate::grammars::{expression, pattern};
use crate::syntax::TokenStream;

/// Name of the start rule of every compiled macro grammar.
pub const MACRO: &str = "macro";

// ============================================================================
// MACRO RULE
// ============================================================================

#[derive(Debug, Clone)]
pub struct MacroRule {
    pattern: String,
    rule: Rule,
    grammar: Grammar,
    max_depth: usize,
}

impl MacroRule {
    /// Compile pattern text into a rule and its grammar.
    pub fn compile(pattern: &str) -> Result<Self, MetaruleError> {
        let rule = pattern::compile_pattern(pattern)?;
        let grammar = GrammarBuilder::new()
            .extend(expression::grammar())
            .define(MACRO, rule.clone())
            .build(MACRO)?;

        debug!(pattern, rule = %rule, "compiled macro rule");
        Ok(Self {
            pattern: pattern.to_string(),
            rule,
            grammar,
            max_depth: DEFAULT_MAX_DEPTH,
        })
    }

    /// Limit the number of nested structural rules while matching.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// The pattern text this rule was compiled from.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn rule(&self) -> &Rule {
        &self.rule
    }

    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    /// Tokenize `input` and match it against the rule.
    ///
    /// Rejection is `Ok(None)`; only a lexing error is an `Err`.
    pub fn apply(&self, input: &str) -> Result<Option<MacroMatch>, MetaruleError> {
        let stream = TokenStream::lex(input)?;
        Ok(self
            .apply_stream(&stream)
            .map(|node| MacroMatch::new(node, input)))
    }

    /// Match an already tokenized stream; the whole stream must be consumed.
    pub fn apply_stream(&self, stream: &TokenStream) -> Option<Node> {
        Evaluator::new(&self.grammar)
            .with_max_depth(self.max_depth)
            .compile(stream)
    }
}

// ============================================================================
// MACRO MATCH
// ============================================================================

/// An accepted input: the match tree plus every capture it contains.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MacroMatch {
    node: Node,
    bindings: Bindings,
    #[serde(skip)]
    input: String,
}

impl MacroMatch {
    fn new(node: Node, input: &str) -> Self {
        let bindings = node.bindings();
        Self {
            node,
            bindings,
            input: input.to_string(),
        }
    }

    pub fn node(&self) -> &Node {
        &self.node
    }

    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    /// Values captured under `name`, in match order. Empty if none.
    pub fn get(&self, name: &str) -> &[Node] {
        self.bindings.get(name).map_or(&[], Vec::as_slice)
    }

    /// The input text a captured node was matched from.
    pub fn text(&self, node: &Node) -> &str {
        node.span()
            .and_then(|span| self.input.get(span.start..span.end))
            .unwrap_or("")
    }

    /// Source text of every value captured under `name`.
    pub fn texts(&self, name: &str) -> Vec<&str> {
        self.get(name).iter().map(|node| self.text(node)).collect()
    }
}
