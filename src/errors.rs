//! Metarule Error Handling - Unified Diagnostic API
//!
//! Combinator evaluation never produces errors: a rule that does not match
//! yields `ParseResult::Failure`. The types here cover the boundaries around
//! the engine: lexing source text, assembling grammars, compiling macro
//! patterns and evaluating typed expressions.

use miette::{Diagnostic, LabeledSpan, NamedSource, SourceSpan};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::syntax::Span;

// ============================================================================
// SOURCE CONTEXT - Error reporting infrastructure
// ============================================================================

/// Source text an error points into.
#[derive(Debug, Clone)]
pub struct SourceContext {
    pub name: String,
    pub content: String,
}

impl SourceContext {
    /// Create a source context from real input text
    pub fn from_source(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    /// Create a fallback when there is no user source, e.g. for grammar assembly
    pub fn fallback(context: &str) -> Self {
        Self {
            name: "fallback".to_string(),
            content: format!("// {}", context),
        }
    }

    /// Convert to NamedSource for use with miette error reporting
    pub fn to_named_source(&self) -> Arc<NamedSource<String>> {
        Arc::new(NamedSource::new(self.name.clone(), self.content.clone()))
    }
}

impl Default for SourceContext {
    fn default() -> Self {
        Self::fallback("default context")
    }
}

// ============================================================================
// ERROR TYPES
// ============================================================================

/// The single error type of the crate
#[derive(Debug)]
pub struct MetaruleError {
    /// What went wrong
    pub kind: ErrorKind,
    /// Where it happened
    pub source_info: SourceInfo,
    /// How to help
    pub diagnostic_info: DiagnosticInfo,
}

/// All error kinds, grouped by the phase that raises them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ErrorKind {
    // Lex errors - the token source rejected the text
    #[error("Lex error: unexpected character '{found}'")]
    UnexpectedCharacter { found: String },

    // Grammar errors - a grammar could not be assembled
    #[error("Grammar error: rule '{rule}' references undefined rule '{name}'")]
    UnresolvedReference { rule: String, name: String },
    #[error("Grammar error: rule '{name}' is defined more than once")]
    DuplicateRule { name: String },
    #[error("Grammar error: start rule '{name}' is not defined")]
    MissingStartRule { name: String },

    // Pattern errors - a macro pattern could not be compiled
    #[error("Pattern error: {reason}")]
    InvalidPattern { reason: String },
    #[error("Pattern error: repetition `$( )*` must contain at least one element")]
    EmptyRepetition,

    // Eval errors - lowering or evaluating a typed expression
    #[error("Eval error: invalid {literal_type} literal '{value}'")]
    InvalidLiteral { literal_type: String, value: String },
    #[error("Eval error: expected {expected} in match tree")]
    MalformedTree { expected: String },
    #[error("Eval error: identifier '{name}' is not bound")]
    UnboundIdentifier { name: String },
    #[error("Eval error: division by zero")]
    DivisionByZero,
    #[error("Eval error: arithmetic overflow in '{operation}'")]
    ArithmeticOverflow { operation: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Lex,
    Grammar,
    Pattern,
    Eval,
}

impl ErrorKind {
    /// Get the error category for test assertions
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::UnexpectedCharacter { .. } => ErrorCategory::Lex,

            Self::UnresolvedReference { .. }
            | Self::DuplicateRule { .. }
            | Self::MissingStartRule { .. } => ErrorCategory::Grammar,

            Self::InvalidPattern { .. } | Self::EmptyRepetition => ErrorCategory::Pattern,

            Self::InvalidLiteral { .. }
            | Self::MalformedTree { .. }
            | Self::UnboundIdentifier { .. }
            | Self::DivisionByZero
            | Self::ArithmeticOverflow { .. } => ErrorCategory::Eval,
        }
    }

    /// Get error code suffix for diagnostic codes
    pub const fn code_suffix(&self) -> &'static str {
        match self {
            Self::UnexpectedCharacter { .. } => "unexpected_character",
            Self::UnresolvedReference { .. } => "unresolved_reference",
            Self::DuplicateRule { .. } => "duplicate_rule",
            Self::MissingStartRule { .. } => "missing_start_rule",
            Self::InvalidPattern { .. } => "invalid_pattern",
            Self::EmptyRepetition => "empty_repetition",
            Self::InvalidLiteral { .. } => "invalid_literal",
            Self::MalformedTree { .. } => "malformed_tree",
            Self::UnboundIdentifier { .. } => "unbound_identifier",
            Self::DivisionByZero => "division_by_zero",
            Self::ArithmeticOverflow { .. } => "arithmetic_overflow",
        }
    }

    fn primary_label(&self) -> &'static str {
        match self {
            Self::UnexpectedCharacter { .. } => "not a token",
            Self::UnresolvedReference { .. } => "undefined rule",
            Self::DuplicateRule { .. } => "duplicate rule",
            Self::MissingStartRule { .. } => "missing start rule",
            Self::InvalidPattern { .. } => "pattern rejected",
            Self::EmptyRepetition => "empty repetition",
            Self::InvalidLiteral { .. } => "invalid literal",
            Self::MalformedTree { .. } => "unexpected shape",
            Self::UnboundIdentifier { .. } => "unbound identifier",
            Self::DivisionByZero => "division by zero",
            Self::ArithmeticOverflow { .. } => "overflows i64",
        }
    }
}

/// Context-specific source information
#[derive(Debug, Clone)]
pub struct SourceInfo {
    pub source: Arc<NamedSource<String>>,
    pub primary_span: SourceSpan,
}

/// Diagnostic enhancement data
#[derive(Debug, Clone)]
pub struct DiagnosticInfo {
    pub help: Option<String>,
    pub error_code: String,
}

impl std::error::Error for MetaruleError {}

impl fmt::Display for MetaruleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.kind, f)
    }
}

impl Diagnostic for MetaruleError {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(&self.diagnostic_info.error_code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.diagnostic_info
            .help
            .as_ref()
            .map(|h| Box::new(h) as Box<dyn fmt::Display + 'a>)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let labels = vec![LabeledSpan::new_with_span(
            Some(self.kind.primary_label().to_string()),
            self.source_info.primary_span,
        )];
        Some(Box::new(labels.into_iter()))
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        Some(&*self.source_info.source)
    }
}

impl MetaruleError {
    /// Attach a help message to an already-built error
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.diagnostic_info.help = Some(help.into());
        self
    }

    pub fn category(&self) -> ErrorCategory {
        self.kind.category()
    }
}

// ============================================================================
// ERROR CREATION
// ============================================================================

/// Context-aware error creation
pub trait ErrorReporting {
    /// Create an error with context-appropriate enhancements
    fn report(&self, kind: ErrorKind, span: SourceSpan) -> MetaruleError;

    fn unexpected_character(&self, found: &str, span: SourceSpan) -> MetaruleError {
        self.report(
            ErrorKind::UnexpectedCharacter {
                found: found.into(),
            },
            span,
        )
    }

    fn invalid_pattern(&self, reason: &str, span: SourceSpan) -> MetaruleError {
        self.report(
            ErrorKind::InvalidPattern {
                reason: reason.into(),
            },
            span,
        )
    }

    fn malformed_tree(&self, expected: &str, span: SourceSpan) -> MetaruleError {
        self.report(
            ErrorKind::MalformedTree {
                expected: expected.into(),
            },
            span,
        )
    }
}

/// General-purpose error creation context: a source plus the phase name used
/// in diagnostic codes.
pub struct PhaseContext {
    pub source: SourceContext,
    pub phase: String,
}

impl PhaseContext {
    pub fn new(source: SourceContext, phase: impl Into<String>) -> Self {
        Self {
            source,
            phase: phase.into(),
        }
    }

    /// Context for errors that have no user source, such as grammar assembly.
    pub fn unsourced(phase: &str) -> Self {
        Self::new(SourceContext::fallback(phase), phase)
    }
}

impl ErrorReporting for PhaseContext {
    fn report(&self, kind: ErrorKind, span: SourceSpan) -> MetaruleError {
        let error_code = format!("metarule::{}::{}", self.phase, kind.code_suffix());

        MetaruleError {
            kind,
            source_info: SourceInfo {
                source: self.source.to_named_source(),
                primary_span: span,
            },
            diagnostic_info: DiagnosticInfo {
                help: None,
                error_code,
            },
        }
    }
}

/// Creates a placeholder span for errors not tied to a source location.
pub fn unspanned() -> SourceSpan {
    SourceSpan::from(0..0)
}

/// Converts a token Span to a miette SourceSpan.
pub fn to_source_span(span: Span) -> SourceSpan {
    SourceSpan::from(span.start..span.end)
}

// ============================================================================
// ERROR FORMATTING UTILITIES
// ============================================================================

/// Prints a MetaruleError with full miette diagnostics
pub fn print_error(error: MetaruleError) {
    use miette::Report;
    let report = Report::new(error);
    eprintln!("{report:?}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_code_includes_phase_and_kind() {
        let ctx = PhaseContext::new(SourceContext::from_source("input", "a # b"), "lex");
        let err = ctx.unexpected_character("#", to_source_span(Span { start: 2, end: 3 }));
        assert_eq!(err.diagnostic_info.error_code, "metarule::lex::unexpected_character");
        assert_eq!(err.category(), ErrorCategory::Lex);
        assert_eq!(err.to_string(), "Lex error: unexpected character '#'");
    }

    #[test]
    fn help_is_attached() {
        let err = PhaseContext::unsourced("grammar")
            .report(ErrorKind::DuplicateRule { name: "a".into() }, unspanned())
            .with_help("rename one of the rules");
        assert_eq!(err.diagnostic_info.help.as_deref(), Some("rename one of the rules"));
        assert_eq!(err.category(), ErrorCategory::Grammar);
    }
}
