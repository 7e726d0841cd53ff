//! Token source for the grammar engine.
//!
//! Source text is split into typed tokens by a pest grammar; identifiers are
//! tagged with a stable FNV-1a id so grammar rules can match literal words by
//! hash. A [`TokenStream`] is the immutable cursor combinators consume.

use serde::Serialize;

pub mod lexer;
pub mod stream;
pub mod token;

pub use lexer::tokenize;
pub use stream::TokenStream;
pub use token::{fnv1a, Token, TokenKind};

/// Represents a byte span in the source text.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Smallest span covering both `self` and `other`.
    pub fn join(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}
