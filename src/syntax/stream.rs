//! Immutable cursor over a token sequence.

use std::sync::Arc;

use super::{tokenize, Token};
use crate::errors::MetaruleError;

/// A position in a shared, immutable token sequence.
///
/// `advance` returns a new stream and never touches the receiver, so any
/// number of derived streams can coexist and be handed to other threads.
/// The sequence always ends with an End token and advancing past it stays on
/// it.
#[derive(Debug, Clone)]
pub struct TokenStream {
    tokens: Arc<[Token]>,
    position: usize,
}

impl TokenStream {
    /// Wrap a token sequence, appending an End token if it lacks one.
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if !tokens.last().is_some_and(Token::is_end) {
            let offset = tokens.last().map_or(0, |t| t.span.end);
            tokens.push(Token::end(offset));
        }
        Self {
            tokens: tokens.into(),
            position: 0,
        }
    }

    /// Tokenize `source` and position the stream at its first token.
    pub fn lex(source: &str) -> Result<Self, MetaruleError> {
        Ok(Self::new(tokenize(source)?))
    }

    /// The current token. At end of input this is the End token.
    pub fn peek(&self) -> &Token {
        &self.tokens[self.position]
    }

    /// A stream one token further on.
    pub fn advance(&self) -> Self {
        Self {
            tokens: Arc::clone(&self.tokens),
            position: (self.position + 1).min(self.tokens.len() - 1),
        }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn is_at_end(&self) -> bool {
        self.peek().is_end()
    }

    /// Tokens from the current position up to, but excluding, End.
    pub fn remaining(&self) -> &[Token] {
        &self.tokens[self.position..self.tokens.len() - 1]
    }
}

/// Two streams are equal when they point at the same place in the same
/// token sequence.
impl PartialEq for TokenStream {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.tokens, &other.tokens) && self.position == other.position
    }
}

impl Eq for TokenStream {}
