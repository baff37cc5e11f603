//! Call tracking for backtraces.
//!
//! This module provides:
//! - `CallStack`: the in-flight function applications of one interpreter
//! - `CallFrame`: per-call metadata (name, offset)
//! - `CallGuard` / `EvalScope`: RAII handles that keep the per-thread
//!   state balanced on every exit path, errors included
//!
//! Call stacks live in a thread-local map keyed by interpreter id. Two
//! threads sharing one interpreter therefore never see each other's calls,
//! and two interpreters on one thread never mix.

use std::cell::RefCell;
use std::sync::Arc;

use quill_ir::{call_depth_exceeded, Backtrace, BacktraceFrame, EvalResult, Exception, Offset};
use rustc_hash::FxHashMap;

/// A single in-flight function application.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallFrame {
    /// The word that triggered the call, or the function's own name.
    pub name: Arc<str>,
    /// Where the call was made, or where the body starts.
    pub offset: Offset,
}

impl CallFrame {
    pub fn new(name: impl Into<Arc<str>>, offset: Offset) -> Self {
        CallFrame {
            name: name.into(),
            offset,
        }
    }
}

/// Live call stack of one interpreter on one thread.
///
/// The depth check is integrated into `push()`: the frame is not pushed
/// when the limit is reached.
#[derive(Clone, Debug, Default)]
pub struct CallStack {
    frames: Vec<CallFrame>,
    max_depth: Option<usize>,
}

impl CallStack {
    /// `None` means unlimited.
    pub fn new(max_depth: Option<usize>) -> Self {
        Self {
            frames: Vec::new(),
            max_depth,
        }
    }

    pub fn push(&mut self, frame: CallFrame) -> EvalResult {
        if let Some(max) = self.max_depth {
            if self.frames.len() >= max {
                return Err(call_depth_exceeded(max));
            }
        }
        self.frames.push(frame);
        Ok(())
    }

    /// Pop the most recent call frame. A no-op on an empty stack.
    pub fn pop(&mut self) {
        debug_assert!(
            !self.frames.is_empty(),
            "CallStack::pop() called on empty stack"
        );
        self.frames.pop();
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Drop every frame above `depth`.
    pub fn truncate(&mut self, depth: usize) {
        self.frames.truncate(depth);
    }

    /// Snapshot the stack, most recent call first.
    pub fn capture(&self) -> Backtrace {
        let frames = self
            .frames
            .iter()
            .rev()
            .map(|f| BacktraceFrame {
                name: f.name.to_string(),
                offset: f.offset,
            })
            .collect();
        Backtrace::new(frames)
    }

    /// Attach a backtrace unless the error already carries one.
    ///
    /// The innermost application sees the deepest stack, so the first
    /// capture wins.
    pub fn attach_backtrace(&self, err: Exception) -> Exception {
        if self.frames.is_empty() || err.backtrace.is_some() {
            return err;
        }
        err.with_backtrace(self.capture())
    }
}

#[derive(Default)]
struct ThreadState {
    calls: CallStack,
    eval_depth: usize,
}

thread_local! {
    static CALL_STATE: RefCell<FxHashMap<u64, ThreadState>> = RefCell::new(FxHashMap::default());
}

fn with_state<R>(interpreter_id: u64, f: impl FnOnce(&mut ThreadState) -> R) -> R {
    CALL_STATE.with(|cell| {
        let mut map = cell.borrow_mut();
        let state = map.entry(interpreter_id).or_default();
        let result = f(state);
        if state.eval_depth == 0 && state.calls.is_empty() {
            map.remove(&interpreter_id);
        }
        result
    })
}

/// Pops its call frame when dropped.
#[must_use = "the call frame is popped when the guard drops"]
pub(crate) struct CallGuard {
    interpreter_id: u64,
}

impl CallGuard {
    pub(crate) fn enter(
        interpreter_id: u64,
        frame: CallFrame,
        max_depth: Option<usize>,
    ) -> EvalResult<Self> {
        with_state(interpreter_id, |state| {
            state.calls.max_depth = max_depth;
            state.calls.push(frame)
        })?;
        Ok(CallGuard { interpreter_id })
    }
}

impl Drop for CallGuard {
    fn drop(&mut self) {
        with_state(self.interpreter_id, |state| {
            if !state.calls.is_empty() {
                state.calls.pop();
            }
        });
    }
}

/// Tracks nesting of `Interpreter::eval` on this thread.
#[must_use = "the eval nesting level is restored when the scope drops"]
pub(crate) struct EvalScope {
    interpreter_id: u64,
    outermost: bool,
    /// Calls already in flight when this eval started.
    base_depth: usize,
}

impl EvalScope {
    pub(crate) fn enter(interpreter_id: u64) -> Self {
        let (outermost, base_depth) = with_state(interpreter_id, |state| {
            state.eval_depth += 1;
            (state.eval_depth == 1, state.calls.depth())
        });
        EvalScope {
            interpreter_id,
            outermost,
            base_depth,
        }
    }

    #[inline]
    pub(crate) fn is_outermost(&self) -> bool {
        self.outermost
    }

    /// Discard calls made inside this eval, keeping the ones it was
    /// started from.
    pub(crate) fn unwind(&self) {
        with_state(self.interpreter_id, |state| {
            state.calls.truncate(self.base_depth);
        });
    }
}

impl Drop for EvalScope {
    fn drop(&mut self) {
        with_state(self.interpreter_id, |state| {
            state.eval_depth = state.eval_depth.saturating_sub(1);
        });
    }
}

pub(crate) fn capture(interpreter_id: u64) -> Backtrace {
    with_state(interpreter_id, |state| state.calls.capture())
}

pub(crate) fn attach_backtrace(interpreter_id: u64, err: Exception) -> Exception {
    with_state(interpreter_id, |state| state.calls.attach_backtrace(err))
}

pub(crate) fn call_depth(interpreter_id: u64) -> usize {
    with_state(interpreter_id, |state| state.calls.depth())
}
