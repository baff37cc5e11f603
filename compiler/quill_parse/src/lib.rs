//! Quill Parse - source text to expression trees.
//!
//! The parser is a single-pass recursive-descent scanner. There is no
//! separate token stream: `Parser::parse_expression` looks at the current
//! character and dispatches straight to whitespace skipping, comments,
//! annotations, bracketed compounds, strings, words or numbers.
//!
//! # Literal syntax
//!
//! | form | meaning |
//! |---|---|
//! | `[ ... ]` | vector |
//! | `#[ ... ]` | hash (paired by the interpreter, not here) |
//! | `{ ... }` | function body |
//! | `" ... "` | text, escapes `\a \b \f \n \r \t \v \' \" \\ \? \%` |
//! | `(* ... *)` | comment, nests with balanced parentheses |
//! | `(% ... %)` | annotation, raw text kept verbatim |
//! | `12.5`, `1_000`, `50%` | number (`%` divides by 100) |
//!
//! Anything else that does not start with a digit is a word.

mod cursor;
mod parser;

pub use cursor::Cursor;
pub use parser::Parser;

use quill_ir::{EvalResult, Expr};

/// Parse a complete source string into top-level expressions.
pub fn parse(source: &str) -> EvalResult<Vec<Expr>> {
    Parser::new(source).parse()
}
