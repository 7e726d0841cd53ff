//! Metarule: a grammar-composition engine.
//!
//! Grammars are built from a small vocabulary of combinators ([`Rule`]) over
//! an immutable token stream. Two grammars ship with the crate: a five-tier
//! arithmetic expression grammar and a macro-pattern grammar whose matches
//! compile into new rules ([`MacroRule`]).

pub use crate::combinators::{compile, Grammar, GrammarBuilder, Node, ParseResult, Rule};
pub use crate::errors::{ErrorKind, MetaruleError};
pub use crate::macros::{MacroMatch, MacroRule};
pub use crate::syntax::{Token, TokenKind, TokenStream};

pub mod ast;
pub mod cli;
pub mod combinators;
pub mod errors;
pub mod grammars;
pub mod macros;
pub mod syntax;
