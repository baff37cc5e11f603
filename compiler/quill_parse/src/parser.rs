//! Recursive-descent parser.
//!
//! One `Parser` parses one source string: `parse` consumes it. Compound
//! forms recurse through `parse_expression` until their closing bracket;
//! hitting end of input first reports the offset of the opening bracket.

use quill_ir::{
    parse_failure, Annotation, CompoundKind, EvalResult, Exception, Expr, Offset, Word,
};
use quill_stack::ensure_sufficient_stack;
use tracing::trace;

use crate::Cursor;

#[inline]
fn is_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}

#[inline]
fn is_bracket(c: char) -> bool {
    matches!(c, '[' | ']' | '{' | '}' | '(' | ')')
}

#[inline]
fn is_closing(c: char) -> bool {
    matches!(c, ']' | '}' | ')')
}

/// Characters that end a word or a number.
#[inline]
fn is_terminator(c: char) -> bool {
    is_whitespace(c) || is_bracket(c) || c == '"'
}

fn unescape(c: char) -> Option<char> {
    Some(match c {
        'a' => '\u{07}',
        'b' => '\u{08}',
        'f' => '\u{0C}',
        'n' => '\n',
        'r' => '\r',
        't' => '\t',
        'v' => '\u{0B}',
        '\'' | '"' | '\\' | '?' | '%' => c,
        _ => return None,
    })
}

/// Single-use parser over one source string.
pub struct Parser {
    cursor: Cursor,
}

impl Parser {
    pub fn new(source: &str) -> Self {
        Parser {
            cursor: Cursor::new(source),
        }
    }

    /// Parse the whole source into top-level expressions.
    pub fn parse(mut self) -> EvalResult<Vec<Expr>> {
        let mut exprs = Vec::new();
        while let Some(c) = self.cursor.current() {
            if is_closing(c) {
                return Err(self.unexpected(c));
            }
            if let Some(expr) = self.parse_expression()? {
                exprs.push(expr);
            }
        }
        trace!(count = exprs.len(), "parsed top-level expressions");
        Ok(exprs)
    }

    /// Parse whatever starts at the cursor.
    ///
    /// Whitespace and comments produce `None`.
    fn parse_expression(&mut self) -> EvalResult<Option<Expr>> {
        let Some(c) = self.cursor.current() else {
            return Ok(None);
        };
        let offset = self.cursor.offset();
        trace!(%offset, ?c, "parse_expression");
        match c {
            c if is_whitespace(c) => {
                self.cursor.eat_while(is_whitespace);
                Ok(None)
            }
            '(' => match self.cursor.peek() {
                Some('*') => {
                    self.skip_comment(offset)?;
                    Ok(None)
                }
                Some('%') => self.parse_annotation(offset).map(Some),
                _ => Err(self.unexpected(c)),
            },
            '#' if self.cursor.peek() == Some('[') => {
                self.cursor.advance();
                self.parse_compound(CompoundKind::Hash, ']', offset).map(Some)
            }
            '[' => self.parse_compound(CompoundKind::Vector, ']', offset).map(Some),
            '{' => self
                .parse_compound(CompoundKind::FunctionBody, '}', offset)
                .map(Some),
            '"' => self.parse_string(offset).map(Some),
            c if is_closing(c) => Err(self.unexpected(c)),
            c if c.is_ascii_digit() => self.parse_number(offset).map(Some),
            _ => Ok(Some(self.parse_word(offset))),
        }
    }

    /// Parse a bracketed form. The cursor sits on the opening bracket.
    fn parse_compound(
        &mut self,
        kind: CompoundKind,
        close: char,
        open: Offset,
    ) -> EvalResult<Expr> {
        self.cursor.advance();
        let mut children = Vec::new();
        loop {
            match self.cursor.current() {
                None => {
                    return Err(parse_failure(
                        format!("unterminated {} (missing `{close}`)", kind.describe()),
                        open,
                    ))
                }
                Some(c) if c == close => {
                    self.cursor.advance();
                    break;
                }
                Some(c) if is_closing(c) => return Err(self.unexpected(c)),
                Some(_) => {
                    if let Some(child) = ensure_sufficient_stack(|| self.parse_expression())? {
                        children.push(child);
                    }
                }
            }
        }
        Ok(Expr::compound(kind, children, open))
    }

    fn parse_string(&mut self, open: Offset) -> EvalResult<Expr> {
        self.cursor.advance();
        let mut text = String::new();
        loop {
            let escape_at = self.cursor.offset();
            match self.cursor.advance() {
                None => return Err(parse_failure("unterminated string literal", open)),
                Some('"') => break,
                Some('\\') => {
                    let Some(escaped) = self.cursor.advance() else {
                        return Err(parse_failure("unterminated string literal", open));
                    };
                    match unescape(escaped) {
                        Some(c) => text.push(c),
                        None => {
                            return Err(parse_failure(
                                format!("invalid escape sequence `\\{escaped}`"),
                                escape_at,
                            ))
                        }
                    }
                }
                Some(c) => text.push(c),
            }
        }
        Ok(Expr::text(text, open))
    }

    /// Digits with `.` and `_` dividers, optionally followed by `%`.
    fn parse_number(&mut self, start: Offset) -> EvalResult<Expr> {
        let mut literal = String::new();
        while let Some(c) = self.cursor.current() {
            match c {
                '0'..='9' | '.' => literal.push(c),
                '_' => {}
                _ => break,
            }
            self.cursor.advance();
        }
        let mut value: f64 = literal
            .parse()
            .map_err(|_| parse_failure(format!("malformed number literal `{literal}`"), start))?;
        if self.cursor.current() == Some('%') {
            self.cursor.advance();
            value /= 100.0;
        }
        if let Some(c) = self.cursor.current() {
            if !is_terminator(c) {
                return Err(parse_failure(
                    format!("unexpected `{c}` after number literal `{literal}`"),
                    self.cursor.offset(),
                ));
            }
        }
        Ok(Expr::number(value, start))
    }

    fn parse_word(&mut self, start: Offset) -> Expr {
        let mut text = String::new();
        while let Some(c) = self.cursor.current() {
            if is_terminator(c) {
                break;
            }
            text.push(c);
            self.cursor.advance();
        }
        Expr::Word(Word::new(text, start))
    }

    /// `(* ... *)`. Parentheses inside must balance; the comment ends at a
    /// `)` directly preceded by `*` once nesting is back to zero.
    fn skip_comment(&mut self, open: Offset) -> EvalResult<()> {
        self.cursor.advance();
        self.cursor.advance();
        let mut depth = 0usize;
        let mut previous = None;
        loop {
            let Some(c) = self.cursor.advance() else {
                return Err(parse_failure("unterminated comment", open));
            };
            match c {
                '(' => depth += 1,
                ')' if depth == 0 && previous == Some('*') => return Ok(()),
                ')' => depth = depth.saturating_sub(1),
                _ => {}
            }
            previous = Some(c);
        }
    }

    /// `(% ... %)`, keeping the inner text verbatim.
    fn parse_annotation(&mut self, open: Offset) -> EvalResult<Expr> {
        self.cursor.advance();
        self.cursor.advance();
        let mut text = String::new();
        loop {
            match self.cursor.advance() {
                None => return Err(parse_failure("unterminated annotation", open)),
                Some('%') if self.cursor.current() == Some(')') => {
                    self.cursor.advance();
                    break;
                }
                Some(c) => text.push(c),
            }
        }
        Ok(Expr::Annotation(Annotation::new(text, open)))
    }

    #[cold]
    fn unexpected(&self, c: char) -> Exception {
        parse_failure(format!("unexpected `{c}`"), self.cursor.offset())
    }
}
