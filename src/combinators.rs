//! Grammar-composition engine.
//!
//! Grammars are assembled from a handful of combinators ([`Rule`]) and
//! evaluated against an immutable [`TokenStream`](crate::syntax::TokenStream).
//! Evaluation never mutates its input: every rule receives a stream and, on
//! success, hands back a new one. Failure is an ordinary value.

pub mod grammar;
pub mod node;
pub mod result;
pub mod rule;

pub use grammar::{compile, Evaluator, Grammar, GrammarBuilder, DEFAULT_MAX_DEPTH};
pub use node::{Bindings, Node};
pub use result::ParseResult;
pub use rule::Rule;
