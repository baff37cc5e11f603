//! Quill evaluator: values, frames, functions and the interpreter.
//!
//! A host embeds Quill by building an [`Interpreter`], registering native
//! functions on a frame with [`StackFrame::bind_function`], optionally
//! prepending [`WordHandler`]s for custom literal syntax, and evaluating
//! parsed source against a script frame:
//!
//! ```ignore
//! let interpreter = Interpreter::new();
//! let frame = interpreter.new_frame();
//! interpreter.eval_source(&frame, "5 { 2 * } apply")?;
//! assert_eq!(frame.pop_number()?, 10.0);
//! ```
//!
//! Values are `Send + Sync`; one interpreter may be shared between threads.

mod config;
mod diagnostics;
mod frame;
mod function;
mod import;
mod interpreter;
mod prelude;
mod value;
mod word_handlers;

use std::sync::Once;

pub use config::{EvalConfig, DEFAULT_EXTENSION, MAX_CALL_DEPTH_ENV, PATH_ENV};
pub use diagnostics::{CallFrame, CallStack};
pub use frame::StackFrame;
pub use function::{Function, InterpretedFunction, NativeFn, NativeFunction};
pub use interpreter::{AnnotationObserver, EvalContext, Interpreter, InterpreterBuilder};
pub use prelude::RESCUE_BINDING;
pub use value::{HashValue, HostAny, HostObject, Value, ValueType};
pub use word_handlers::{
    default_word_handlers, word_handler, AssignHandler, DotPathHandler, FnWordHandler,
    LookupHandler, QuoteHandler, SharedWordHandler, WordHandler,
};

pub use quill_ir::{
    Annotation, Backtrace, BacktraceFrame, EvalResult, Exception, ExceptionKind, Offset, Word,
};

static TRACING_INIT: Once = Once::new();

/// Install a `tracing` subscriber for the runtime's diagnostics.
///
/// Does nothing unless `QUILL_LOG` or `RUST_LOG` is set; the filter is read
/// from whichever is present (`QUILL_LOG` first). Safe to call repeatedly.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        let Ok(directives) = std::env::var("QUILL_LOG").or_else(|_| std::env::var("RUST_LOG"))
        else {
            return;
        };
        let filter = EnvFilter::try_new(&directives).unwrap_or_else(|_| EnvFilter::new("warn"));
        let _ = tracing_subscriber::registry()
            .with(fmt::layer().with_target(true).with_level(true).with_writer(std::io::stderr))
            .with(filter)
            .try_init();
    });
}
