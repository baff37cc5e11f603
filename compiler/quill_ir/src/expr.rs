//! Expression tree produced by the parser.
//!
//! A script is a flat sequence of `Expr` nodes. Literal brackets produce
//! `Compound` nodes whose kind decides how the interpreter treats the
//! children:
//!
//! - `Vector`: `[ ... ]`, children become array elements
//! - `Hash`: `#[ ... ]`, children are paired into key/value entries
//! - `FunctionBody`: `{ ... }`, becomes a closure, evaluated on application
//! - `Subexpression`: evaluated like a top-level sequence (host-built)
//!
//! Trees are immutable after construction. `Display` renders a node back
//! to literal syntax.

use std::fmt;
use std::sync::Arc;

use crate::{Annotation, Offset, Word};

/// Kind of a bracketed compound node.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CompoundKind {
    Vector,
    Hash,
    FunctionBody,
    Subexpression,
}

impl CompoundKind {
    /// Opening and closing delimiters used when rendering.
    pub fn delimiters(self) -> Option<(&'static str, &'static str)> {
        match self {
            CompoundKind::Vector => Some(("[", "]")),
            CompoundKind::Hash => Some(("#[", "]")),
            CompoundKind::FunctionBody => Some(("{", "}")),
            CompoundKind::Subexpression => None,
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            CompoundKind::Vector => "vector",
            CompoundKind::Hash => "hash",
            CompoundKind::FunctionBody => "function body",
            CompoundKind::Subexpression => "subexpression",
        }
    }
}

/// A bracketed node with owned children.
#[derive(Clone, Debug, PartialEq)]
pub struct Compound {
    kind: CompoundKind,
    children: Arc<[Expr]>,
    offset: Offset,
}

impl Compound {
    pub fn new(kind: CompoundKind, children: Vec<Expr>, offset: Offset) -> Self {
        Compound {
            kind,
            children: children.into(),
            offset,
        }
    }

    #[inline]
    pub fn kind(&self) -> CompoundKind {
        self.kind
    }

    #[inline]
    pub fn children(&self) -> &[Expr] {
        &self.children
    }

    /// Offset of the opening bracket.
    #[inline]
    pub fn offset(&self) -> Offset {
        self.offset
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.children.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

/// A node of the expression tree.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Word(Word),
    Number { value: f64, offset: Offset },
    Text { value: Arc<str>, offset: Offset },
    Annotation(Annotation),
    Compound(Compound),
}

impl Expr {
    pub fn number(value: f64, offset: Offset) -> Self {
        Expr::Number { value, offset }
    }

    pub fn text(value: impl Into<Arc<str>>, offset: Offset) -> Self {
        Expr::Text {
            value: value.into(),
            offset,
        }
    }

    pub fn word(text: impl Into<Arc<str>>, offset: Offset) -> Self {
        Expr::Word(Word::new(text, offset))
    }

    pub fn compound(kind: CompoundKind, children: Vec<Expr>, offset: Offset) -> Self {
        Expr::Compound(Compound::new(kind, children, offset))
    }

    /// Wrap a sequence so it can be evaluated as a single node.
    pub fn subexpression(children: Vec<Expr>) -> Self {
        let offset = children.first().map_or(Offset::INVALID, Expr::offset);
        Self::compound(CompoundKind::Subexpression, children, offset)
    }

    /// Source position where this node starts.
    pub fn offset(&self) -> Offset {
        match self {
            Expr::Word(word) => word.offset(),
            Expr::Number { offset, .. } | Expr::Text { offset, .. } => *offset,
            Expr::Annotation(annotation) => annotation.offset(),
            Expr::Compound(compound) => compound.offset(),
        }
    }

    pub fn as_compound(&self) -> Option<&Compound> {
        match self {
            Expr::Compound(compound) => Some(compound),
            _ => None,
        }
    }
}

/// Render a number the way the parser reads it back.
pub fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        format!("{value}")
    }
}

/// Quote and escape text for a string literal.
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{07}' => out.push_str("\\a"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0B}' => out.push_str("\\v"),
            '\u{0C}' => out.push_str("\\f"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}

fn write_children(f: &mut fmt::Formatter<'_>, children: &[Expr]) -> fmt::Result {
    for (i, child) in children.iter().enumerate() {
        if i > 0 {
            f.write_str(" ")?;
        }
        write!(f, "{child}")?;
    }
    Ok(())
}

impl fmt::Display for Compound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind.delimiters() {
            Some((open, close)) if self.children.is_empty() => write!(f, "{open} {close}"),
            Some((open, close)) => {
                write!(f, "{open} ")?;
                write_children(f, &self.children)?;
                write!(f, " {close}")
            }
            None => write_children(f, &self.children),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Word(word) => write!(f, "{word}"),
            Expr::Number { value, .. } => f.write_str(&format_number(*value)),
            Expr::Text { value, .. } => f.write_str(&escape_text(value)),
            Expr::Annotation(annotation) => write!(f, "{annotation}"),
            Expr::Compound(compound) => write!(f, "{compound}"),
        }
    }
}
