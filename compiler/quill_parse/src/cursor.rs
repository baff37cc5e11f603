//! Character cursor with line/column tracking.
//!
//! The cursor works on decoded `char`s so columns count characters, not
//! bytes. Line breaks are `\n`, `\r` and `\r\n`; the pair counts once.

use quill_ir::Offset;

/// Cursor over the characters of one source string.
#[derive(Clone, Debug)]
pub struct Cursor {
    chars: Vec<char>,
    pos: usize,
    line: u32,
    column: u32,
}

impl Cursor {
    pub fn new(source: &str) -> Self {
        Cursor {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    /// The character under the cursor, `None` at end of input.
    #[inline]
    pub fn current(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    /// The character after the current one.
    #[inline]
    pub fn peek(&self) -> Option<char> {
        self.chars.get(self.pos + 1).copied()
    }

    #[inline]
    pub fn is_eof(&self) -> bool {
        self.pos >= self.chars.len()
    }

    /// Position of the current character.
    #[inline]
    pub fn offset(&self) -> Offset {
        Offset::new(self.line, self.column)
    }

    /// Consume the current character and return it.
    pub fn advance(&mut self) -> Option<char> {
        let c = self.current()?;
        self.pos += 1;
        match c {
            '\n' => self.new_line(),
            // `\r\n` is one break: the `\n` does the counting.
            '\r' if self.current() != Some('\n') => self.new_line(),
            '\r' => {}
            _ => self.column += 1,
        }
        Some(c)
    }

    /// Consume characters while `pred` holds.
    pub fn eat_while(&mut self, mut pred: impl FnMut(char) -> bool) {
        while let Some(c) = self.current() {
            if !pred(c) {
                break;
            }
            self.advance();
        }
    }

    fn new_line(&mut self) {
        self.line += 1;
        self.column = 1;
    }
}
