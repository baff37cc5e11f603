//! Function values.
//!
//! A function is either a native closure registered by the host, or the
//! body of a `{ ... }` literal. Applying an interpreted function runs its
//! body in a fresh child frame and then moves the child's top value (if
//! any) back to the caller. That transfer happens on every exit, including
//! when the body fails.

use std::fmt;
use std::sync::Arc;

use quill_ir::{Compound, EvalResult, Offset, Word};
use quill_stack::ensure_sufficient_stack;
use tracing::{debug, warn};

use crate::diagnostics::{self, CallFrame, CallGuard};
use crate::{EvalContext, Interpreter, StackFrame};

/// Signature of a host-provided function body.
pub type NativeFn = dyn Fn(&StackFrame) -> EvalResult + Send + Sync;

pub struct NativeFunction {
    name: Arc<str>,
    body: Box<NativeFn>,
}

impl NativeFunction {
    pub fn name(&self) -> &str {
        &self.name
    }
}

pub struct InterpretedFunction {
    body: Compound,
}

impl InterpretedFunction {
    pub fn body(&self) -> &Compound {
        &self.body
    }
}

#[derive(Clone)]
pub enum Function {
    Native(Arc<NativeFunction>),
    Interpreted(Arc<InterpretedFunction>),
}

impl Function {
    pub fn native<F>(name: &str, body: F) -> Self
    where
        F: Fn(&StackFrame) -> EvalResult + Send + Sync + 'static,
    {
        Function::Native(Arc::new(NativeFunction {
            name: Arc::from(name),
            body: Box::new(body),
        }))
    }

    pub fn interpreted(body: Compound) -> Self {
        Function::Interpreted(Arc::new(InterpretedFunction { body }))
    }

    /// Native name, or `<anonymous>` for a function literal.
    pub fn name(&self) -> &str {
        match self {
            Function::Native(native) => native.name(),
            Function::Interpreted(_) => "<anonymous>",
        }
    }

    pub fn ptr_eq(&self, other: &Function) -> bool {
        match (self, other) {
            (Function::Native(a), Function::Native(b)) => Arc::ptr_eq(a, b),
            (Function::Interpreted(a), Function::Interpreted(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    pub(crate) fn addr(&self) -> usize {
        match self {
            Function::Native(native) => Arc::as_ptr(native) as usize,
            Function::Interpreted(interpreted) => Arc::as_ptr(interpreted) as usize,
        }
    }

    /// Apply this function against `frame`.
    pub fn apply(&self, frame: &StackFrame) -> EvalResult {
        self.apply_as(frame, None)
    }

    /// Apply, recording `word` as the call site in backtraces.
    pub(crate) fn apply_as(&self, frame: &StackFrame, word: Option<&Word>) -> EvalResult {
        let interpreter = frame.interpreter()?;
        let call = match word {
            Some(word) => CallFrame::new(word.shared_text(), word.offset()),
            None => CallFrame::new(self.name(), self.body_offset()),
        };
        let name = Arc::clone(&call.name);
        debug!(%name, "enter function");
        let _call = CallGuard::enter(interpreter.id(), call, interpreter.max_call_depth())?;
        let result = match self {
            Function::Native(native) => (native.body)(frame),
            Function::Interpreted(interpreted) => interpreted.run(&interpreter, frame),
        };
        debug!(%name, ok = result.is_ok(), "exit function");
        result.map_err(|err| diagnostics::attach_backtrace(interpreter.id(), err))
    }

    fn body_offset(&self) -> Offset {
        match self {
            Function::Native(_) => Offset::INVALID,
            Function::Interpreted(interpreted) => interpreted.body.offset(),
        }
    }
}

impl InterpretedFunction {
    fn run(&self, interpreter: &Interpreter, caller: &StackFrame) -> EvalResult {
        let child = StackFrame::new(Some(caller), interpreter);
        let _transfer = ReturnTransfer {
            child: &child,
            caller,
        };
        ensure_sufficient_stack(|| {
            interpreter.eval_sequence(&child, self.body.children(), EvalContext::Function)
        })
    }
}

/// Moves the child's top value to the caller when dropped.
struct ReturnTransfer<'a> {
    child: &'a StackFrame,
    caller: &'a StackFrame,
}

impl Drop for ReturnTransfer<'_> {
    fn drop(&mut self) {
        let moved = self
            .child
            .take_local()
            .and_then(|top| top.map_or(Ok(()), |value| self.caller.push(value)));
        if let Err(err) = moved {
            warn!(%err, "could not return value to caller frame");
        }
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Function::Native(native) => f.debug_tuple("Native").field(&native.name).finish(),
            Function::Interpreted(interpreted) => f
                .debug_tuple("Interpreted")
                .field(&interpreted.body.offset())
                .finish(),
        }
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Function::Native(native) => write!(f, "<native {}>", native.name),
            Function::Interpreted(interpreted) => write!(f, "{}", interpreted.body),
        }
    }
}

#[cfg(test)]
mod tests;
