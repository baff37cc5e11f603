//! Quill IR - tree and error types shared by the parser and the evaluator.
//!
//! This crate contains:
//! - `Offset` for line/column source positions
//! - `Word` and `Annotation`, the two token forms that carry an offset
//! - `Expr`, the parser's output tree
//! - `Exception`, the single error vehicle of the runtime
//!
//! Nothing in here holds runtime state. Compound children live behind
//! `Arc<[Expr]>` so a function value can own its body without deep copies.

mod exception;
mod expr;
mod offset;
mod word;

pub use exception::{
    call_depth_exceeded, detached_frame, frozen_frame_mutation, import_disabled, import_failed,
    import_not_found, malformed_hash_literal, non_hash_dot_lookup, parse_failure,
    stack_underflow, type_mismatch, unbound_word, user_throw, Backtrace, BacktraceFrame,
    EvalResult, Exception, ExceptionKind,
};
pub use expr::{escape_text, format_number, Compound, CompoundKind, Expr};
pub use offset::Offset;
pub use word::{Annotation, Word};
