//! Line/column source positions.

use std::fmt;

/// A position in source text.
///
/// Lines and columns are 1-based. `Offset::INVALID` (line 0) marks values
/// that were not produced by the parser, e.g. words synthesized by a host.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Offset {
    pub line: u32,
    pub column: u32,
}

impl Offset {
    /// Sentinel for "no source position".
    pub const INVALID: Offset = Offset { line: 0, column: 0 };

    /// Position of the first character of a source string.
    pub const START: Offset = Offset { line: 1, column: 1 };

    #[inline]
    pub const fn new(line: u32, column: u32) -> Self {
        Offset { line, column }
    }

    #[inline]
    pub const fn is_valid(self) -> bool {
        self.line != 0
    }
}

impl Default for Offset {
    fn default() -> Self {
        Self::INVALID
    }
}

impl fmt::Display for Offset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "{}:{}", self.line, self.column)
        } else {
            f.write_str("<unknown>")
        }
    }
}
