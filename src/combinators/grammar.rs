//! Named rule sets and their evaluation.
//!
//! A [`Grammar`] is assembled once through a [`GrammarBuilder`], which checks
//! that every `Reference` names a rule of the grammar. After that the grammar
//! is immutable and cheap to clone; it holds no stream state and can be
//! shared across threads.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use super::{Node, ParseResult, Rule};
use crate::errors::{unspanned, ErrorKind, ErrorReporting, MetaruleError, PhaseContext};
use crate::syntax::TokenStream;

/// Maximum number of nested structural rules (everything but `Token` and
/// `Identifier`) before evaluation gives up.
///
/// Each level costs two small stack frames, so the default stays well inside
/// the 2 MiB stack of a spawned thread even in unoptimized builds. One level
/// of parentheses in the expression grammar costs 12, one prefix operator 3.
pub const DEFAULT_MAX_DEPTH: usize = 512;

// ============================================================================
// GRAMMAR
// ============================================================================

#[derive(Debug, Clone)]
pub struct Grammar {
    rules: Arc<HashMap<String, Rule>>,
    start: String,
}

impl Grammar {
    /// Name of the rule `compile` and `evaluate` start from.
    pub fn start(&self) -> &str {
        &self.start
    }

    pub fn rule(&self, name: &str) -> Option<&Rule> {
        self.rules.get(name)
    }

    /// Rule names in sorted order.
    pub fn rule_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.rules.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Evaluate the start rule with default settings.
    pub fn evaluate(&self, stream: &TokenStream) -> ParseResult<Node> {
        Evaluator::new(self).evaluate(stream)
    }

    /// Evaluate the start rule and require that it consumes all input.
    pub fn compile(&self, stream: &TokenStream) -> Option<Node> {
        Evaluator::new(self).compile(stream)
    }
}

/// Accept `stream` with `grammar` only if the match reaches End.
pub fn compile(grammar: &Grammar, stream: &TokenStream) -> Option<Node> {
    grammar.compile(stream)
}

// ============================================================================
// BUILDER
// ============================================================================

#[derive(Debug, Default)]
pub struct GrammarBuilder {
    rules: HashMap<String, Rule>,
    duplicates: Vec<String>,
}

impl GrammarBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `rule` under `name`. Rules may refer to names defined later.
    pub fn define(mut self, name: impl Into<String>, rule: Rule) -> Self {
        let name = name.into();
        if self.rules.contains_key(&name) {
            self.duplicates.push(name);
        } else {
            self.rules.insert(name, rule);
        }
        self
    }

    /// Import every rule of an existing grammar.
    pub fn extend(mut self, grammar: &Grammar) -> Self {
        for (name, rule) in grammar.rules.iter() {
            self = self.define(name.clone(), rule.clone());
        }
        self
    }

    /// Resolve references and fix the start rule.
    pub fn build(self, start: impl Into<String>) -> Result<Grammar, MetaruleError> {
        let start = start.into();
        let context = PhaseContext::unsourced("grammar");

        if let Some(name) = self.duplicates.into_iter().next() {
            return Err(context.report(ErrorKind::DuplicateRule { name }, unspanned()));
        }

        if !self.rules.contains_key(&start) {
            return Err(context.report(ErrorKind::MissingStartRule { name: start }, unspanned()));
        }

        let mut names: Vec<&String> = self.rules.keys().collect();
        names.sort_unstable();
        for rule_name in names {
            for reference in self.rules[rule_name].references() {
                if !self.rules.contains_key(reference) {
                    return Err(context
                        .report(
                            ErrorKind::UnresolvedReference {
                                rule: rule_name.clone(),
                                name: reference.to_string(),
                            },
                            unspanned(),
                        )
                        .with_help(format!("define a rule named '{}'", reference)));
                }
            }
        }

        Ok(Grammar {
            rules: Arc::new(self.rules),
            start,
        })
    }
}

// ============================================================================
// EVALUATOR
// ============================================================================

/// Evaluation settings for one grammar.
#[derive(Debug, Clone, Copy)]
pub struct Evaluator<'g> {
    grammar: &'g Grammar,
    max_depth: usize,
}

impl<'g> Evaluator<'g> {
    pub fn new(grammar: &'g Grammar) -> Self {
        Self {
            grammar,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Limit the number of nested structural rules.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Evaluate the grammar's start rule.
    pub fn evaluate(&self, stream: &TokenStream) -> ParseResult<Node> {
        self.evaluate_reference(&self.grammar.start, stream, 0)
    }

    /// Evaluate an arbitrary rule in the context of the grammar.
    pub fn evaluate_rule(&self, rule: &Rule, stream: &TokenStream) -> ParseResult<Node> {
        rule.evaluate(stream, self, 0)
    }

    /// Evaluate the start rule; accept only if the match ends at End.
    pub fn compile(&self, stream: &TokenStream) -> Option<Node> {
        let tokens = stream.remaining().len();
        let (node, remaining) = match self.evaluate(stream).into_option() {
            Some(success) => success,
            None => {
                debug!(rule = %self.grammar.start, tokens, "no match");
                return None;
            }
        };

        if !remaining.is_at_end() {
            debug!(
                rule = %self.grammar.start,
                tokens,
                trailing = remaining.remaining().len(),
                "match left trailing input"
            );
            return None;
        }

        debug!(rule = %self.grammar.start, tokens, "accepted");
        Some(node)
    }

    pub(crate) fn evaluate_reference(
        &self,
        name: &str,
        stream: &TokenStream,
        depth: usize,
    ) -> ParseResult<Node> {
        match self.grammar.rule(name) {
            Some(rule) => rule.evaluate(stream, self, depth),
            None => ParseResult::Failure,
        }
    }

    #[cold]
    pub(crate) fn depth_exceeded(&self, rule: &Rule, stream: &TokenStream) {
        warn!(
            rule = %rule,
            max_depth = self.max_depth,
            position = stream.position(),
            "rule depth limit reached"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorCategory;
    use crate::syntax::TokenKind;

    /// `nested = ( nested ) | identifier`
    fn nesting_grammar() -> Grammar {
        GrammarBuilder::new()
            .define(
                "nested",
                Rule::one_of([
                    Rule::group([
                        Rule::token(TokenKind::LeftParen),
                        Rule::reference("nested"),
                        Rule::token(TokenKind::RightParen),
                    ]),
                    Rule::token(TokenKind::Identifier),
                ]),
            )
            .build("nested")
            .unwrap()
    }

    fn nested_source(depth: usize) -> String {
        format!("{}x{}", "(".repeat(depth), ")".repeat(depth))
    }

    #[test]
    fn references_may_be_defined_later() {
        let grammar = GrammarBuilder::new()
            .define("pair", Rule::group([Rule::reference("item"), Rule::reference("item")]))
            .define("item", Rule::token(TokenKind::Number))
            .build("pair")
            .unwrap();
        assert!(grammar.compile(&TokenStream::lex("1 2").unwrap()).is_some());
        assert_eq!(grammar.rule_names(), vec!["item", "pair"]);
    }

    #[test]
    fn unresolved_reference_is_rejected() {
        let err = GrammarBuilder::new()
            .define("start", Rule::reference("missing"))
            .build("start")
            .unwrap_err();
        assert_eq!(
            err.kind,
            ErrorKind::UnresolvedReference {
                rule: "start".into(),
                name: "missing".into()
            }
        );
        assert_eq!(err.category(), ErrorCategory::Grammar);
    }

    #[test]
    fn duplicate_rule_is_rejected() {
        let err = GrammarBuilder::new()
            .define("a", Rule::token(TokenKind::Number))
            .define("a", Rule::token(TokenKind::Identifier))
            .build("a")
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::DuplicateRule { name: "a".into() });
    }

    #[test]
    fn missing_start_rule_is_rejected() {
        let err = GrammarBuilder::new()
            .define("a", Rule::token(TokenKind::Number))
            .build("b")
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::MissingStartRule { name: "b".into() });
    }

    #[test]
    fn extend_imports_rules() {
        let base = nesting_grammar();
        let grammar = GrammarBuilder::new()
            .extend(&base)
            .define("start", Rule::group([Rule::reference("nested"), Rule::token(TokenKind::Semicolon)]))
            .build("start")
            .unwrap();
        assert!(grammar.compile(&TokenStream::lex("((a));").unwrap()).is_some());
    }

    #[test]
    fn compile_requires_end_of_input() {
        let grammar = nesting_grammar();
        assert!(compile(&grammar, &TokenStream::lex("(a)").unwrap()).is_some());
        assert!(compile(&grammar, &TokenStream::lex("(a) b").unwrap()).is_none());
        assert!(compile(&grammar, &TokenStream::lex("(a").unwrap()).is_none());
    }

    #[test]
    fn depth_limit_turns_deep_input_into_failure() {
        let grammar = nesting_grammar();
        let shallow = TokenStream::lex(&nested_source(10)).unwrap();
        let deep = TokenStream::lex(&nested_source(5_000)).unwrap();

        assert!(grammar.compile(&shallow).is_some());
        assert!(grammar.compile(&deep).is_none());
        // three structural rules per level: reference, one_of, group
        assert!(Evaluator::new(&grammar).with_max_depth(30).compile(&shallow).is_none());
        assert!(Evaluator::new(&grammar).with_max_depth(31).compile(&shallow).is_some());
    }

    #[test]
    fn evaluate_rule_uses_grammar_references() {
        let grammar = nesting_grammar();
        let evaluator = Evaluator::new(&grammar);
        let rule = Rule::list(Rule::reference("nested"));
        let result = evaluator.evaluate_rule(&rule, &TokenStream::lex("a (b) ((c))").unwrap());
        assert_eq!(result.value().unwrap().elements().unwrap().len(), 3);
    }
}
