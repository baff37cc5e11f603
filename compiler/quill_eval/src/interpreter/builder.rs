//! Builder for `Interpreter`.

use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, error};

use super::{next_interpreter_id, Interpreter, InterpreterShared};
use crate::config::EvalConfig;
use crate::word_handlers::{default_word_handlers, SharedWordHandler};
use crate::{prelude, StackFrame, WordHandler};

/// Configures and builds an `Interpreter`.
///
/// ```ignore
/// let interpreter = Interpreter::builder()
///     .search_path("scripts")
///     .max_call_depth(Some(512))
///     .build();
/// ```
#[derive(Clone)]
pub struct InterpreterBuilder {
    config: EvalConfig,
    prelude: bool,
    word_handlers: Vec<SharedWordHandler>,
}

impl InterpreterBuilder {
    pub fn new() -> Self {
        InterpreterBuilder {
            config: EvalConfig::default(),
            prelude: true,
            word_handlers: Vec::new(),
        }
    }

    /// Replace the whole configuration.
    #[must_use]
    pub fn config(mut self, config: EvalConfig) -> Self {
        self.config = config;
        self
    }

    /// Install the core words (`apply`, `throw`, `rescue`, ...). On by default.
    #[must_use]
    pub fn prelude(mut self, enabled: bool) -> Self {
        self.prelude = enabled;
        self
    }

    #[must_use]
    pub fn import_enabled(mut self, enabled: bool) -> Self {
        self.config.import_enabled = enabled;
        self
    }

    #[must_use]
    pub fn search_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.search_paths.push(path.into());
        self
    }

    #[must_use]
    pub fn default_extension(mut self, extension: impl Into<String>) -> Self {
        self.config.default_extension = extension.into();
        self
    }

    #[must_use]
    pub fn max_call_depth(mut self, limit: Option<usize>) -> Self {
        self.config.max_call_depth = limit;
        self
    }

    /// Add a handler ahead of the defaults. Later calls run first, as if
    /// each were prepended after building.
    #[must_use]
    pub fn word_handler(mut self, handler: impl WordHandler + 'static) -> Self {
        self.word_handlers.push(Arc::new(handler));
        self
    }

    /// Build the interpreter. The root frame is frozen before this returns.
    pub fn build(self) -> Interpreter {
        let InterpreterBuilder {
            config,
            prelude: with_prelude,
            word_handlers,
        } = self;
        let handlers: Vec<SharedWordHandler> = word_handlers
            .into_iter()
            .rev()
            .chain(default_word_handlers())
            .collect();

        let shared = Arc::new_cyclic(|weak| InterpreterShared {
            id: next_interpreter_id(),
            root: StackFrame::root(weak.clone()),
            word_handlers: RwLock::new(handlers),
            annotation_observers: RwLock::new(Vec::new()),
            search_paths: RwLock::new(config.search_paths),
            import_enabled: AtomicBool::new(config.import_enabled),
            default_extension: config.default_extension,
            max_call_depth: config.max_call_depth,
        });
        let interpreter = Interpreter::from_shared(shared);

        let root = interpreter.root();
        if with_prelude {
            if let Err(err) = prelude::install(&root) {
                error!(%err, "failed to install prelude");
            }
        }
        root.freeze();
        debug!(id = interpreter.id(), prelude = with_prelude, "interpreter built");
        interpreter
    }
}

impl Default for InterpreterBuilder {
    fn default() -> Self {
        Self::new()
    }
}
