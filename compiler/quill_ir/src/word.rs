//! Word and annotation tokens.

use std::fmt;
use std::sync::Arc;

use crate::Offset;

/// An unevaluated bare-name token.
///
/// Words are resolved by the interpreter's word-handler pipeline at eval
/// time. As a runtime value (a quoted word) it compares by text only.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Word {
    text: Arc<str>,
    offset: Offset,
}

impl Word {
    pub fn new(text: impl Into<Arc<str>>, offset: Offset) -> Self {
        Word {
            text: text.into(),
            offset,
        }
    }

    /// A word with no source position.
    pub fn synthetic(text: impl Into<Arc<str>>) -> Self {
        Self::new(text, Offset::INVALID)
    }

    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The shared text, for cheap conversion into a text value.
    #[inline]
    pub fn shared_text(&self) -> Arc<str> {
        Arc::clone(&self.text)
    }

    #[inline]
    pub fn offset(&self) -> Offset {
        self.offset
    }

    /// A new word with the same offset and different text.
    ///
    /// Used by handlers that strip a prefix (`'name`, `=>name`).
    #[must_use]
    pub fn with_text(&self, text: &str) -> Self {
        Word {
            text: Arc::from(text),
            offset: self.offset,
        }
    }
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// The raw text captured between `(%` and `%)`.
///
/// Annotations are never evaluated; the interpreter hands them to
/// registered observers (documentation hooks).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Annotation {
    text: Arc<str>,
    offset: Offset,
}

impl Annotation {
    pub fn new(text: impl Into<Arc<str>>, offset: Offset) -> Self {
        Annotation {
            text: text.into(),
            offset,
        }
    }

    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[inline]
    pub fn offset(&self) -> Offset {
        self.offset
    }
}

impl fmt::Display for Annotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(%{}%)", self.text)
    }
}
