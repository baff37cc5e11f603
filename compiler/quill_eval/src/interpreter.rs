//! The interpreter: expression evaluation and the word pipeline.
//!
//! An `Interpreter` is a cheap, cloneable handle. It owns the frozen root
//! frame (built-ins), the ordered word-handler list, annotation observers,
//! and import settings. All of them sit behind locks, so one interpreter
//! can serve several threads; each thread gets its own call stack.
//!
//! # Evaluation contexts
//!
//! | Context    | Used for                      | Auto-apply | Annotations |
//! |------------|-------------------------------|------------|-------------|
//! | `Normal`   | scripts, subexpressions       | yes        | notified    |
//! | `Vector`   | `[ ]` and `#[ ]` elements     | no         | ignored     |
//! | `Function` | bodies of applied functions   | yes        | ignored     |

mod builder;

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use quill_ir::{
    malformed_hash_literal, unbound_word, Annotation, Backtrace, Compound, CompoundKind,
    EvalResult, Expr, Word,
};
use quill_stack::ensure_sufficient_stack;
use tracing::{debug, trace};

pub use builder::InterpreterBuilder;

use crate::diagnostics::{self, EvalScope};
use crate::word_handlers::SharedWordHandler;
use crate::{Function, HashValue, StackFrame, Value, WordHandler};

/// How the expressions being evaluated should treat words and annotations.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum EvalContext {
    #[default]
    Normal,
    /// Collecting elements of a vector or hash literal.
    Vector,
    /// Running the body of an applied function.
    Function,
}

/// Receives every annotation met in `Normal` context.
pub trait AnnotationObserver: Send + Sync {
    fn annotation_found(&self, annotation: &Annotation, frame: &StackFrame);
}

impl<F> AnnotationObserver for F
where
    F: Fn(&Annotation, &StackFrame) + Send + Sync,
{
    fn annotation_found(&self, annotation: &Annotation, frame: &StackFrame) {
        self(annotation, frame);
    }
}

static NEXT_INTERPRETER_ID: AtomicU64 = AtomicU64::new(1);

fn next_interpreter_id() -> u64 {
    NEXT_INTERPRETER_ID.fetch_add(1, Ordering::Relaxed)
}

pub(crate) struct InterpreterShared {
    id: u64,
    root: StackFrame,
    word_handlers: RwLock<Vec<SharedWordHandler>>,
    annotation_observers: RwLock<Vec<Arc<dyn AnnotationObserver>>>,
    search_paths: RwLock<Vec<PathBuf>>,
    import_enabled: AtomicBool,
    default_extension: String,
    max_call_depth: Option<usize>,
}

/// Shared handle to an interpreter.
#[derive(Clone)]
pub struct Interpreter {
    shared: Arc<InterpreterShared>,
}

impl Interpreter {
    /// An interpreter with the default configuration and the prelude.
    pub fn new() -> Self {
        InterpreterBuilder::new().build()
    }

    pub fn builder() -> InterpreterBuilder {
        InterpreterBuilder::new()
    }

    pub(crate) fn from_shared(shared: Arc<InterpreterShared>) -> Self {
        Interpreter { shared }
    }

    pub(crate) fn downgrade(&self) -> Weak<InterpreterShared> {
        Arc::downgrade(&self.shared)
    }

    #[inline]
    pub(crate) fn id(&self) -> u64 {
        self.shared.id
    }

    #[inline]
    pub(crate) fn max_call_depth(&self) -> Option<usize> {
        self.shared.max_call_depth
    }

    /// The frozen frame holding the built-ins.
    pub fn root(&self) -> StackFrame {
        self.shared.root.clone()
    }

    /// A fresh, unfrozen frame under the root, for running a script.
    pub fn new_frame(&self) -> StackFrame {
        StackFrame::new(Some(&self.shared.root), self)
    }

    // Word handlers

    /// Run `handler` before every existing handler.
    pub fn prepend_word_handler(&self, handler: impl WordHandler + 'static) {
        debug!(handler = handler.name(), "prepending word handler");
        self.shared.word_handlers.write().insert(0, Arc::new(handler));
    }

    pub fn append_word_handler(&self, handler: impl WordHandler + 'static) {
        debug!(handler = handler.name(), "appending word handler");
        self.shared.word_handlers.write().push(Arc::new(handler));
    }

    /// Remove every handler called `name`. Returns whether any was removed.
    pub fn remove_word_handler(&self, name: &str) -> bool {
        let mut handlers = self.shared.word_handlers.write();
        let before = handlers.len();
        handlers.retain(|handler| handler.name() != name);
        let removed = handlers.len() != before;
        debug!(handler = name, removed, "removing word handler");
        removed
    }

    pub fn word_handler_names(&self) -> Vec<String> {
        self.shared
            .word_handlers
            .read()
            .iter()
            .map(|handler| handler.name().to_string())
            .collect()
    }

    pub fn add_annotation_observer(&self, observer: impl AnnotationObserver + 'static) {
        self.shared
            .annotation_observers
            .write()
            .push(Arc::new(observer));
    }

    // Imports

    pub fn import_enabled(&self) -> bool {
        self.shared.import_enabled.load(Ordering::Acquire)
    }

    pub fn set_import_enabled(&self, enabled: bool) {
        self.shared.import_enabled.store(enabled, Ordering::Release);
    }

    pub fn search_paths(&self) -> Vec<PathBuf> {
        self.shared.search_paths.read().clone()
    }

    pub fn add_search_path(&self, path: impl Into<PathBuf>) {
        self.shared.search_paths.write().push(path.into());
    }

    pub fn set_search_paths(&self, paths: Vec<PathBuf>) {
        *self.shared.search_paths.write() = paths;
    }

    pub fn default_extension(&self) -> &str {
        &self.shared.default_extension
    }

    // Diagnostics

    /// In-flight function calls on this thread, most recent first.
    pub fn backtrace(&self) -> Backtrace {
        diagnostics::capture(self.id())
    }

    /// Number of in-flight function calls on this thread.
    pub fn call_depth(&self) -> usize {
        diagnostics::call_depth(self.id())
    }

    // Evaluation

    /// Parse and evaluate `source` in `frame`.
    pub fn eval_source(&self, frame: &StackFrame, source: &str) -> EvalResult {
        let exprs = quill_parse::parse(source)?;
        self.eval(frame, &exprs, EvalContext::Normal)
    }

    /// Evaluate `exprs` in order against `frame`.
    ///
    /// The outermost `eval` on a thread unwinds the call stack to where it
    /// started when it returns an error, attaching the backtrace first if
    /// none was recorded. Calls already in flight around it are kept.
    pub fn eval(&self, frame: &StackFrame, exprs: &[Expr], context: EvalContext) -> EvalResult {
        let scope = EvalScope::enter(self.id());
        let result = self.eval_sequence(frame, exprs, context);
        match result {
            Err(err) if scope.is_outermost() => {
                let err = diagnostics::attach_backtrace(self.id(), err);
                scope.unwind();
                debug!(%err, "evaluation failed");
                Err(err)
            }
            other => other,
        }
    }

    pub(crate) fn eval_sequence(
        &self,
        frame: &StackFrame,
        exprs: &[Expr],
        context: EvalContext,
    ) -> EvalResult {
        for expr in exprs {
            self.eval_expression(frame, expr, context)?;
        }
        Ok(())
    }

    /// Evaluate a single expression.
    pub fn eval_expression(
        &self,
        frame: &StackFrame,
        expr: &Expr,
        context: EvalContext,
    ) -> EvalResult {
        match expr {
            Expr::Word(word) => self.eval_word(frame, word, context),
            Expr::Number { value, .. } => frame.push(Value::Number(*value)),
            Expr::Text { value, .. } => frame.push(Value::Text(Arc::clone(value))),
            Expr::Annotation(annotation) => {
                if context == EvalContext::Normal {
                    self.notify_annotation(annotation, frame);
                }
                Ok(())
            }
            Expr::Compound(compound) => self.eval_compound(frame, compound, context),
        }
    }

    fn eval_compound(
        &self,
        frame: &StackFrame,
        compound: &Compound,
        context: EvalContext,
    ) -> EvalResult {
        match compound.kind() {
            CompoundKind::Vector => {
                let values = self.eval_elements(frame, compound)?;
                frame.push(Value::vector(values))
            }
            CompoundKind::Hash => {
                let hash = self.eval_hash(frame, compound)?;
                frame.push(Value::from_hash(hash))
            }
            CompoundKind::FunctionBody => {
                frame.push(Value::Function(Function::interpreted(compound.clone())))
            }
            CompoundKind::Subexpression => {
                trace!(?context, "subexpression");
                self.eval_sequence(frame, compound.children(), EvalContext::Normal)
            }
        }
    }

    /// Evaluate literal elements in a scratch frame and collect its values.
    fn eval_elements(&self, frame: &StackFrame, compound: &Compound) -> EvalResult<Vec<Value>> {
        let scratch = StackFrame::new(Some(frame), self);
        for child in compound.children() {
            ensure_sufficient_stack(|| self.eval_expression(&scratch, child, EvalContext::Vector))?;
        }
        Ok(scratch.drain())
    }

    fn eval_hash(&self, frame: &StackFrame, compound: &Compound) -> EvalResult<HashValue> {
        if compound.len() % 2 != 0 {
            return Err(malformed_hash_literal(compound.len(), compound.offset()));
        }
        let values = self.eval_elements(frame, compound)?;
        if values.len() % 2 != 0 {
            return Err(malformed_hash_literal(values.len(), compound.offset()));
        }
        let mut hash = HashValue::new();
        let mut values = values.into_iter();
        while let (Some(key), Some(value)) = (values.next(), values.next()) {
            hash.insert(key, value);
        }
        Ok(hash)
    }

    /// Resolve a word, then auto-apply a function it produced.
    ///
    /// Auto-apply happens only when the handler grew this frame's stack and
    /// left a function on top; inside vector literals functions stay data.
    fn eval_word(&self, frame: &StackFrame, word: &Word, context: EvalContext) -> EvalResult {
        let before = frame.depth();
        self.handle_word(frame, word)
            .map_err(|err| err.with_offset_if_missing(word.offset()))?;

        if context == EvalContext::Vector || frame.depth() <= before {
            return Ok(());
        }
        if let Some(Value::Function(function)) = frame.peek_local() {
            frame.take_local()?;
            function
                .apply_as(frame, Some(word))
                .map_err(|err| err.with_offset_if_missing(word.offset()))?;
        }
        Ok(())
    }

    /// Run `word` through the handler pipeline.
    pub fn handle_word(&self, frame: &StackFrame, word: &Word) -> EvalResult {
        let handlers = self.shared.word_handlers.read().clone();
        for handler in &handlers {
            if handler.handle(frame, word)? {
                trace!(word = word.text(), handler = handler.name(), "word handled");
                return Ok(());
            }
        }
        Err(unbound_word(word.text(), word.offset()))
    }

    fn notify_annotation(&self, annotation: &Annotation, frame: &StackFrame) {
        let observers = self.shared.annotation_observers.read().clone();
        trace!(observers = observers.len(), "annotation");
        for observer in &observers {
            observer.annotation_found(annotation, frame);
        }
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Interpreter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interpreter")
            .field("id", &self.shared.id)
            .field("word_handlers", &self.word_handler_names())
            .field("import_enabled", &self.import_enabled())
            .finish_non_exhaustive()
    }
}
