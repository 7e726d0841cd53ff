//! Token model shared by the tokenizer, the combinators and the grammars.

use serde::Serialize;
use std::fmt;

use super::Span;

const FNV_OFFSET_BASIS: u32 = 2_166_136_261;
const FNV_PRIME: u32 = 16_777_619;

/// 32-bit FNV-1a hash of an identifier.
///
/// This is the id the tokenizer assigns to every identifier token, and the
/// function grammars use to embed literal words (`fnv1a("struct")`).
pub const fn fnv1a(text: &str) -> u32 {
    let bytes = text.as_bytes();
    let mut hash = FNV_OFFSET_BASIS;
    let mut i = 0;
    while i < bytes.len() {
        hash ^= bytes[i] as u32;
        hash = hash.wrapping_mul(FNV_PRIME);
        i += 1;
    }
    hash
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum TokenKind {
    Identifier,
    Number,
    LeftParen,
    RightParen,
    LeftCurly,
    RightCurly,
    Plus,
    Minus,
    Asterisk,
    Slash,
    Tilde,
    Not,
    Equal,
    LessThan,
    GreaterThan,
    LessEqual,
    GreaterEqual,
    Colon,
    Comma,
    Semicolon,
    Arrow,
    Dollar,
    End,
}

impl TokenKind {
    /// The fixed spelling of punctuation and operator kinds.
    pub const fn symbol(self) -> Option<&'static str> {
        match self {
            TokenKind::LeftParen => Some("("),
            TokenKind::RightParen => Some(")"),
            TokenKind::LeftCurly => Some("{"),
            TokenKind::RightCurly => Some("}"),
            TokenKind::Plus => Some("+"),
            TokenKind::Minus => Some("-"),
            TokenKind::Asterisk => Some("*"),
            TokenKind::Slash => Some("/"),
            TokenKind::Tilde => Some("~"),
            TokenKind::Not => Some("!"),
            TokenKind::Equal => Some("="),
            TokenKind::LessThan => Some("<"),
            TokenKind::GreaterThan => Some(">"),
            TokenKind::LessEqual => Some("<="),
            TokenKind::GreaterEqual => Some(">="),
            TokenKind::Colon => Some(":"),
            TokenKind::Comma => Some(","),
            TokenKind::Semicolon => Some(";"),
            TokenKind::Arrow => Some("->"),
            TokenKind::Dollar => Some("$"),
            TokenKind::Identifier | TokenKind::Number | TokenKind::End => None,
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.symbol() {
            Some(symbol) => write!(f, "'{}'", symbol),
            None => match self {
                TokenKind::Identifier => f.write_str("identifier"),
                TokenKind::Number => f.write_str("number"),
                _ => f.write_str("end of input"),
            },
        }
    }
}

/// A single lexical unit.
///
/// `id` is present only for identifiers and always equals `fnv1a(&text)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u32>,
    pub text: String,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, span: Span) -> Self {
        let text = text.into();
        let id = (kind == TokenKind::Identifier).then(|| fnv1a(&text));
        Self {
            kind,
            id,
            text,
            span,
        }
    }

    /// The End-of-stream marker, positioned at `offset`.
    pub fn end(offset: usize) -> Self {
        Self::new(TokenKind::End, "", Span::new(offset, offset))
    }

    pub fn is_end(&self) -> bool {
        self.kind == TokenKind::End
    }

    /// True for an identifier token whose id is `id`.
    pub fn is_identifier(&self, id: u32) -> bool {
        self.kind == TokenKind::Identifier && self.id == Some(id)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Identifier | TokenKind::Number => f.write_str(&self.text),
            TokenKind::End => f.write_str("<end>"),
            kind => f.write_str(kind.symbol().unwrap_or_default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fnv1a_matches_reference_values() {
        assert_eq!(fnv1a(""), 2_166_136_261);
        assert_eq!(fnv1a("a"), 0xe40c_292c);
        assert_eq!(fnv1a("foobar"), 0xbf9c_f968);
    }

    #[test]
    fn fnv1a_is_const() {
        const STRUCT: u32 = fnv1a("struct");
        assert_eq!(STRUCT, fnv1a("struct"));
        assert_ne!(STRUCT, fnv1a("Struct"));
    }

    #[test]
    fn only_identifiers_carry_ids() {
        let ident = Token::new(TokenKind::Identifier, "name", Span::new(0, 4));
        let number = Token::new(TokenKind::Number, "42", Span::new(5, 7));
        assert_eq!(ident.id, Some(fnv1a("name")));
        assert!(ident.is_identifier(fnv1a("name")));
        assert_eq!(number.id, None);
        assert!(!number.is_identifier(fnv1a("42")));
    }
}
