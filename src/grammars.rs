//! Concrete grammars built from the combinators.
//!
//! Both grammars are assembled once, on first use, and shared for the life of
//! the process.

pub mod expression;
pub mod pattern;
