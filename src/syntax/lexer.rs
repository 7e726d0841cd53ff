//! Metarule Tokenizer
//!
//! Converts source text into the token sequence the combinators consume.
//! The sequence is always terminated by exactly one End token.

use pest::{error::InputLocation, iterators::Pair, Parser};
use pest_derive::Parser;

use super::{Span, Token, TokenKind};
use crate::errors::{to_source_span, ErrorReporting, MetaruleError, PhaseContext, SourceContext};

#[derive(Parser)]
#[grammar = "syntax/grammar.pest"]
struct TokenParser;

// ============================================================================
// PUBLIC API
// ============================================================================

/// Tokenize `source`.
///
/// Fails only on characters that start no token; the error points at the
/// first such character.
pub fn tokenize(source: &str) -> Result<Vec<Token>, MetaruleError> {
    let context = PhaseContext::new(SourceContext::from_source("input", source), "lex");

    let pairs = TokenParser::parse(Rule::tokens, source).map_err(|e| {
        let offset = match e.location {
            InputLocation::Pos(pos) => pos,
            InputLocation::Span((start, _)) => start,
        };
        let found = source[offset..].chars().next().map(String::from).unwrap_or_default();
        let end = offset + found.len();
        context.unexpected_character(&found, to_source_span(Span::new(offset, end)))
    })?;

    let mut tokens = Vec::new();
    for pair in pairs.flatten() {
        if let Some(token) = build_token(&pair, &context)? {
            tokens.push(token);
        }
    }
    tokens.push(Token::end(source.len()));
    Ok(tokens)
}

// ============================================================================
// TOKEN BUILDERS
// ============================================================================

fn build_token(pair: &Pair<Rule>, context: &PhaseContext) -> Result<Option<Token>, MetaruleError> {
    let span = Span::new(pair.as_span().start(), pair.as_span().end());
    let kind = match pair.as_rule() {
        Rule::identifier => TokenKind::Identifier,
        Rule::number => TokenKind::Number,
        Rule::arrow => TokenKind::Arrow,
        Rule::less_equal => TokenKind::LessEqual,
        Rule::greater_equal => TokenKind::GreaterEqual,
        Rule::left_paren => TokenKind::LeftParen,
        Rule::right_paren => TokenKind::RightParen,
        Rule::left_curly => TokenKind::LeftCurly,
        Rule::right_curly => TokenKind::RightCurly,
        Rule::plus => TokenKind::Plus,
        Rule::minus => TokenKind::Minus,
        Rule::asterisk => TokenKind::Asterisk,
        Rule::slash => TokenKind::Slash,
        Rule::tilde => TokenKind::Tilde,
        Rule::not => TokenKind::Not,
        Rule::equal => TokenKind::Equal,
        Rule::less_than => TokenKind::LessThan,
        Rule::greater_than => TokenKind::GreaterThan,
        Rule::colon => TokenKind::Colon,
        Rule::comma => TokenKind::Comma,
        Rule::semicolon => TokenKind::Semicolon,
        Rule::dollar => TokenKind::Dollar,
        Rule::invalid => {
            return Err(context.unexpected_character(pair.as_str(), to_source_span(span)));
        }
        // tokens, EOI and the silent helpers carry no token of their own
        _ => return Ok(None),
    };
    Ok(Some(Token::new(kind, pair.as_str(), span)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::syntax::fnv1a;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn empty_input_is_just_end() {
        let tokens = tokenize("").unwrap();
        assert_eq!(tokens.len(), 1);
        assert!(tokens[0].is_end());
        assert_eq!(tokens[0].span, Span::new(0, 0));
    }

    #[test]
    fn longest_operator_wins() {
        assert_eq!(
            kinds("-> - <= < >= >"),
            vec![
                TokenKind::Arrow,
                TokenKind::Minus,
                TokenKind::LessEqual,
                TokenKind::LessThan,
                TokenKind::GreaterEqual,
                TokenKind::GreaterThan,
                TokenKind::End,
            ]
        );
    }

    #[test]
    fn macro_pattern_tokens() {
        assert_eq!(
            kinds("$( $x:ident ; )*"),
            vec![
                TokenKind::Dollar,
                TokenKind::LeftParen,
                TokenKind::Dollar,
                TokenKind::Identifier,
                TokenKind::Colon,
                TokenKind::Identifier,
                TokenKind::Semicolon,
                TokenKind::RightParen,
                TokenKind::Asterisk,
                TokenKind::End,
            ]
        );
    }

    #[test]
    fn identifiers_are_hashed_and_spanned() {
        let tokens = tokenize("struct  name_2 12").unwrap();
        assert_eq!(tokens[0].id, Some(fnv1a("struct")));
        assert_eq!(tokens[1].text, "name_2");
        assert_eq!(tokens[1].span, Span::new(8, 14));
        assert_eq!(tokens[2].kind, TokenKind::Number);
        assert_eq!(tokens[3].span, Span::new(17, 17));
    }

    #[test]
    fn comments_and_whitespace_are_skipped() {
        assert_eq!(
            kinds("a // trailing comment\n / b"),
            vec![
                TokenKind::Identifier,
                TokenKind::Slash,
                TokenKind::Identifier,
                TokenKind::End,
            ]
        );
    }

    #[test]
    fn unknown_character_is_reported_with_span() {
        let err = tokenize("a + #b").unwrap_err();
        assert_eq!(
            err.kind,
            ErrorKind::UnexpectedCharacter {
                found: "#".to_string()
            }
        );
        assert_eq!(err.source_info.primary_span.offset(), 4);
        assert_eq!(err.source_info.primary_span.len(), 1);
    }
}
