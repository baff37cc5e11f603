//! The word-resolution pipeline.
//!
//! Each handler either consumes a word (returns `Ok(true)`) or passes it
//! on. The interpreter tries handlers in order; the first that consumes the
//! word wins. Hosts extend the language by prepending handlers, for example
//! one that turns `#ff0000` into a color value before the default lookup
//! sees it.
//!
//! Default order:
//! 1. `QuoteHandler`: `'name` pushes the word `name` unevaluated
//! 2. `AssignHandler`: `=>name` pops a value and binds it locally
//! 3. `DotPathHandler`: `a.b.c` walks hashes by text key
//! 4. `LookupHandler`: pushes the bound value

use std::fmt;
use std::sync::Arc;

use quill_ir::{non_hash_dot_lookup, EvalResult, Word};
use tracing::trace;

use crate::{StackFrame, Value};

/// One stage of the word pipeline.
pub trait WordHandler: Send + Sync {
    /// Try to consume `word`. `Ok(false)` passes it to the next handler.
    fn handle(&self, frame: &StackFrame, word: &Word) -> EvalResult<bool>;

    /// Name used in logs and for removal.
    fn name(&self) -> &str;
}

pub type SharedWordHandler = Arc<dyn WordHandler>;

/// A handler backed by a closure.
pub struct FnWordHandler<F> {
    name: String,
    handle: F,
}

/// Wrap a closure as a named word handler.
pub fn word_handler<F>(name: impl Into<String>, handle: F) -> FnWordHandler<F>
where
    F: Fn(&StackFrame, &Word) -> EvalResult<bool> + Send + Sync,
{
    FnWordHandler {
        name: name.into(),
        handle,
    }
}

impl<F> WordHandler for FnWordHandler<F>
where
    F: Fn(&StackFrame, &Word) -> EvalResult<bool> + Send + Sync,
{
    fn handle(&self, frame: &StackFrame, word: &Word) -> EvalResult<bool> {
        (self.handle)(frame, word)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl<F> fmt::Debug for FnWordHandler<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnWordHandler")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Default)]
pub struct QuoteHandler;

impl WordHandler for QuoteHandler {
    fn handle(&self, frame: &StackFrame, word: &Word) -> EvalResult<bool> {
        let Some(rest) = word.text().strip_prefix('\'') else {
            return Ok(false);
        };
        frame.push(Value::Word(word.with_text(rest)))?;
        Ok(true)
    }

    fn name(&self) -> &str {
        "quote"
    }
}

#[derive(Debug, Default)]
pub struct AssignHandler;

impl WordHandler for AssignHandler {
    fn handle(&self, frame: &StackFrame, word: &Word) -> EvalResult<bool> {
        let Some(name) = word.text().strip_prefix("=>").filter(|n| !n.is_empty()) else {
            return Ok(false);
        };
        let value = frame.pop()?;
        frame.bind(name, value, false)?;
        Ok(true)
    }

    fn name(&self) -> &str {
        "assign"
    }
}

/// Resolves `a.b.c`: `a` is looked up, then each later segment indexes a
/// hash by text key. A missing binding or key yields `Null`, and lookup
/// stops at the first `Null`.
///
/// Words without two non-empty segments (`.`, `..`, `a.`) pass through, so
/// hosts can still bind punctuation words.
#[derive(Debug, Default)]
pub struct DotPathHandler;

impl WordHandler for DotPathHandler {
    fn handle(&self, frame: &StackFrame, word: &Word) -> EvalResult<bool> {
        let text = word.text();
        let Some((head, tail)) = text.split_once('.') else {
            return Ok(false);
        };
        if head.is_empty() || tail.is_empty() {
            return Ok(false);
        }

        let mut current = frame.lookup(head).unwrap_or(Value::Null);
        for segment in tail.split('.') {
            current = match current {
                Value::Hash(hash) => hash.get_or_null(&Value::text(segment)),
                Value::Null => break,
                other => {
                    return Err(non_hash_dot_lookup(
                        segment,
                        other.type_name(),
                        word.offset(),
                    ))
                }
            };
        }
        frame.push(current)?;
        Ok(true)
    }

    fn name(&self) -> &str {
        "dot-path"
    }
}

#[derive(Debug, Default)]
pub struct LookupHandler;

impl WordHandler for LookupHandler {
    fn handle(&self, frame: &StackFrame, word: &Word) -> EvalResult<bool> {
        match frame.lookup(word.text()) {
            Some(value) => {
                trace!(word = word.text(), "resolved binding");
                frame.push(value)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn name(&self) -> &str {
        "lookup"
    }
}

/// The built-in pipeline, in resolution order.
pub fn default_word_handlers() -> Vec<SharedWordHandler> {
    vec![
        Arc::new(QuoteHandler),
        Arc::new(AssignHandler),
        Arc::new(DotPathHandler),
        Arc::new(LookupHandler),
    ]
}
