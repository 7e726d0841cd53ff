use crate::syntax::TokenStream;

/// Outcome of evaluating a rule against a stream.
///
/// A failure carries nothing: no position, no reason, and in particular no
/// remaining stream, so callers cannot assume anything was consumed.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseResult<T> {
    Success { value: T, remaining: TokenStream },
    Failure,
}

impl<T> ParseResult<T> {
    pub fn success(value: T, remaining: TokenStream) -> Self {
        ParseResult::Success { value, remaining }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ParseResult::Success { .. })
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, ParseResult::Failure)
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            ParseResult::Success { value, .. } => Some(value),
            ParseResult::Failure => None,
        }
    }

    pub fn remaining(&self) -> Option<&TokenStream> {
        match self {
            ParseResult::Success { remaining, .. } => Some(remaining),
            ParseResult::Failure => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ParseResult<U> {
        match self {
            ParseResult::Success { value, remaining } => ParseResult::Success {
                value: f(value),
                remaining,
            },
            ParseResult::Failure => ParseResult::Failure,
        }
    }

    pub fn into_option(self) -> Option<(T, TokenStream)> {
        match self {
            ParseResult::Success { value, remaining } => Some((value, remaining)),
            ParseResult::Failure => None,
        }
    }
}
