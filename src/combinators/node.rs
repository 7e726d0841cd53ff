use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::syntax::{Span, Token};

/// Captured values by capture name, in the order they were matched.
pub type Bindings = BTreeMap<String, Vec<Node>>;

/// The value a successful rule evaluation produces.
///
/// Each variant mirrors the rule that built it: a `Group` rule yields a
/// `Group` node with one child per sub-rule, a `Chain` yields left-nested
/// `Chain` pairs, and so on.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Node {
    /// A token matched by kind.
    Token(Token),
    /// An identifier matched by id.
    Identifier(Token),
    Group(Vec<Node>),
    /// `(accumulated, next)`; repeated application nests to the left.
    Chain(Box<Node>, Box<Node>),
    Optional(Option<Box<Node>>),
    List(Vec<Node>),
    Capture { name: String, node: Box<Node> },
}

impl Node {
    /// The matched token, for `Token` and `Identifier` nodes.
    pub fn token(&self) -> Option<&Token> {
        match self {
            Node::Token(token) | Node::Identifier(token) => Some(token),
            _ => None,
        }
    }

    /// Children of a `Group` or `List`.
    pub fn elements(&self) -> Option<&[Node]> {
        match self {
            Node::Group(items) | Node::List(items) => Some(items),
            _ => None,
        }
    }

    /// Source span covered by the node; `None` when it matched no tokens.
    pub fn span(&self) -> Option<Span> {
        match self {
            Node::Token(token) | Node::Identifier(token) => Some(token.span),
            Node::Group(items) | Node::List(items) => items
                .iter()
                .filter_map(Node::span)
                .reduce(Span::join),
            Node::Chain(left, right) => match (left.span(), right.span()) {
                (Some(l), Some(r)) => Some(l.join(r)),
                (l, r) => l.or(r),
            },
            Node::Optional(inner) => inner.as_ref().and_then(|n| n.span()),
            Node::Capture { node, .. } => node.span(),
        }
    }

    /// Every capture in the tree, nested ones included, grouped by name.
    pub fn bindings(&self) -> Bindings {
        let mut bindings = Bindings::new();
        self.collect_bindings(&mut bindings);
        bindings
    }

    fn collect_bindings(&self, bindings: &mut Bindings) {
        match self {
            Node::Token(_) | Node::Identifier(_) => {}
            Node::Group(items) | Node::List(items) => {
                for item in items {
                    item.collect_bindings(bindings);
                }
            }
            Node::Chain(left, right) => {
                left.collect_bindings(bindings);
                right.collect_bindings(bindings);
            }
            Node::Optional(inner) => {
                if let Some(node) = inner {
                    node.collect_bindings(bindings);
                }
            }
            Node::Capture { name, node } => {
                bindings
                    .entry(name.clone())
                    .or_default()
                    .push(node.as_ref().clone());
                node.collect_bindings(bindings);
            }
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Token(token) | Node::Identifier(token) => write!(f, "{}", token),
            Node::Group(items) => {
                f.write_str("[")?;
                write_separated(f, items)?;
                f.write_str("]")
            }
            Node::Chain(left, right) => write!(f, "({} {})", left, right),
            Node::Optional(None) => f.write_str("_"),
            Node::Optional(Some(node)) => write!(f, "{}", node),
            Node::List(items) => {
                f.write_str("*[")?;
                write_separated(f, items)?;
                f.write_str("]")
            }
            Node::Capture { name, node } => write!(f, "${}={}", name, node),
        }
    }
}

fn write_separated(f: &mut fmt::Formatter<'_>, items: &[Node]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(" ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}
