//! Stack frames: an operand stack plus a name-binding table.
//!
//! Frames form a parent chain. A child reads through to its parents for
//! both bindings and operands: popping an empty, unfrozen frame pops its
//! parent instead. A frozen frame rejects every mutation, which is how the
//! root's built-ins stay read-only.
//!
//! # Locking
//!
//! Each frame owns a re-entrant mutex around a `RefCell`. The mutex makes a
//! frame safe to share between threads; the `RefCell` borrow is only ever
//! held for a single local read or write, never across a call into a
//! parent, a function, or a visitor. Locks are taken child-first, so parent
//! chains cannot deadlock.

use std::cell::RefCell;
use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::ReentrantMutex;
use quill_ir::{detached_frame, frozen_frame_mutation, stack_underflow, type_mismatch, EvalResult};
use rustc_hash::FxHashMap;
use tracing::trace;

use crate::interpreter::InterpreterShared;
use crate::value::{HashValue, HostObject};
use crate::{Function, Interpreter, Value, ValueType};

#[derive(Default)]
struct FrameState {
    stack: Vec<Value>,
    bindings: FxHashMap<Arc<str>, Value>,
    frozen: bool,
}

struct FrameInner {
    state: ReentrantMutex<RefCell<FrameState>>,
    parent: Option<Weak<FrameInner>>,
    interpreter: Weak<InterpreterShared>,
}

/// A shared handle to one frame. Cloning the handle does not copy the frame.
#[derive(Clone)]
pub struct StackFrame {
    inner: Arc<FrameInner>,
}

impl StackFrame {
    /// A frame whose lookups and underflowing pops fall through to `parent`.
    ///
    /// The new frame holds only weak references: it neither keeps its
    /// parent nor its interpreter alive.
    pub fn new(parent: Option<&StackFrame>, interpreter: &Interpreter) -> Self {
        Self::with_links(
            parent.map(|p| Arc::downgrade(&p.inner)),
            interpreter.downgrade(),
        )
    }

    pub(crate) fn root(interpreter: Weak<InterpreterShared>) -> Self {
        Self::with_links(None, interpreter)
    }

    fn with_links(
        parent: Option<Weak<FrameInner>>,
        interpreter: Weak<InterpreterShared>,
    ) -> Self {
        StackFrame {
            inner: Arc::new(FrameInner {
                state: ReentrantMutex::new(RefCell::new(FrameState::default())),
                parent,
                interpreter,
            }),
        }
    }

    /// Run `f` against the local state. Must not call back into any frame.
    fn with_state<R>(&self, f: impl FnOnce(&mut FrameState) -> R) -> R {
        let guard = self.inner.state.lock();
        let mut state = guard.borrow_mut();
        f(&mut state)
    }

    fn with_unfrozen<R>(&self, f: impl FnOnce(&mut FrameState) -> R) -> EvalResult<R> {
        self.with_state(|state| {
            if state.frozen {
                Err(frozen_frame_mutation())
            } else {
                Ok(f(state))
            }
        })
    }

    /// The parent frame, if one was given and is still alive.
    pub fn parent(&self) -> Option<StackFrame> {
        let inner = self.inner.parent.as_ref()?.upgrade()?;
        Some(StackFrame { inner })
    }

    /// The parent that an empty frame may pop from.
    fn delegate(&self) -> Option<StackFrame> {
        self.parent().filter(|parent| !parent.is_frozen())
    }

    /// The owning interpreter.
    ///
    /// Fails with a detached-frame error once the interpreter is dropped.
    pub fn interpreter(&self) -> EvalResult<Interpreter> {
        self.inner
            .interpreter
            .upgrade()
            .map(Interpreter::from_shared)
            .ok_or_else(detached_frame)
    }

    /// Whether both handles refer to the same frame.
    pub fn ptr_eq(&self, other: &StackFrame) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    // Operand stack

    pub fn push(&self, value: Value) -> EvalResult {
        self.with_unfrozen(|state| state.stack.push(value))
    }

    /// Push `value`, or `Null` when absent.
    pub fn push_option(&self, value: Option<Value>) -> EvalResult {
        self.push(value.unwrap_or(Value::Null))
    }

    pub fn pop(&self) -> EvalResult<Value> {
        let _guard = self.inner.state.lock();
        let local = self.with_unfrozen(|state| state.stack.pop())?;
        if let Some(value) = local {
            return Ok(value);
        }
        match self.delegate() {
            Some(parent) => {
                trace!("pop delegated to parent frame");
                parent.pop()
            }
            None => Err(stack_underflow()),
        }
    }

    /// The top value without removing it. Reads through like `pop`.
    pub fn peek(&self) -> EvalResult<Value> {
        let _guard = self.inner.state.lock();
        let (local, frozen) = self.with_state(|state| (state.stack.last().cloned(), state.frozen));
        if let Some(value) = local {
            return Ok(value);
        }
        match self.delegate() {
            Some(parent) if !frozen => parent.peek(),
            _ => Err(stack_underflow()),
        }
    }

    /// Number of values held by this frame alone.
    pub fn depth(&self) -> usize {
        self.with_state(|state| state.stack.len())
    }

    pub fn is_empty(&self) -> bool {
        self.depth() == 0
    }

    /// Visit local values bottom to top. The visitor runs on a snapshot.
    pub fn iterate(&self, mut visitor: impl FnMut(&Value)) {
        for value in &self.values() {
            visitor(value);
        }
    }

    /// Snapshot of the local values, bottom first.
    pub fn values(&self) -> Vec<Value> {
        self.with_state(|state| state.stack.clone())
    }

    pub(crate) fn peek_local(&self) -> Option<Value> {
        self.with_state(|state| state.stack.last().cloned())
    }

    /// Remove the local top value. Never reads through to the parent.
    pub(crate) fn take_local(&self) -> EvalResult<Option<Value>> {
        self.with_unfrozen(|state| state.stack.pop())
    }

    /// Remove every local value, bottom first.
    pub(crate) fn drain(&self) -> Vec<Value> {
        self.with_state(|state| std::mem::take(&mut state.stack))
    }

    // Typed pops. The value is consumed even when the type check fails.

    pub fn pop_number(&self) -> EvalResult<f64> {
        match self.pop()? {
            Value::Number(n) => Ok(n),
            other => Err(type_mismatch("Number", other.type_name())),
        }
    }

    pub fn pop_text(&self) -> EvalResult<Arc<str>> {
        match self.pop()? {
            Value::Text(text) => Ok(text),
            other => Err(type_mismatch("Text", other.type_name())),
        }
    }

    pub fn pop_function(&self) -> EvalResult<Function> {
        match self.pop()? {
            Value::Function(function) => Ok(function),
            other => Err(type_mismatch("Function", other.type_name())),
        }
    }

    pub fn pop_vector(&self) -> EvalResult<Arc<[Value]>> {
        match self.pop()? {
            Value::Vector(values) => Ok(values),
            other => Err(type_mismatch("Vector", other.type_name())),
        }
    }

    pub fn pop_hash(&self) -> EvalResult<Arc<HashValue>> {
        match self.pop()? {
            Value::Hash(hash) => Ok(hash),
            other => Err(type_mismatch("Hash", other.type_name())),
        }
    }

    /// Pop a value whose tag is `expected`.
    pub fn pop_type(&self, expected: ValueType) -> EvalResult<Value> {
        let value = self.pop()?;
        if value.value_type() == expected {
            Ok(value)
        } else {
            Err(type_mismatch(expected.name(), value.type_name()))
        }
    }

    /// Pop a host object of concrete type `T`.
    pub fn pop_host<T: HostObject + 'static>(&self) -> EvalResult<Arc<T>> {
        let expected = short_type_name::<T>();
        match self.pop()? {
            Value::Host(object) => {
                let got = object.type_name().to_string();
                <dyn HostObject as crate::value::HostAny>::into_any_arc(object)
                    .downcast::<T>()
                    .map_err(|_| type_mismatch(expected, &got))
            }
            other => Err(type_mismatch(expected, other.type_name())),
        }
    }

    // Bindings

    /// Bind `name` to `value`.
    ///
    /// With `search_parents`, the nearest frame in the chain that already
    /// defines `name` is updated; when no frame does, the binding is local.
    pub fn bind(&self, name: &str, value: Value, search_parents: bool) -> EvalResult {
        if search_parents {
            let mut current = Some(self.clone());
            while let Some(frame) = current {
                if frame.defines(name) {
                    return frame.bind_local(name, value);
                }
                current = frame.parent();
            }
        }
        self.bind_local(name, value)
    }

    fn bind_local(&self, name: &str, value: Value) -> EvalResult {
        trace!(name, "bind");
        self.with_unfrozen(|state| {
            state.bindings.insert(Arc::from(name), value);
        })
    }

    pub fn bind_variable(&self, name: &str, value: Value) -> EvalResult {
        self.bind(name, value, false)
    }

    /// Bind a native function under `name` in this frame.
    pub fn bind_function<F>(&self, name: &str, body: F) -> EvalResult
    where
        F: Fn(&StackFrame) -> EvalResult + Send + Sync + 'static,
    {
        self.bind_local(name, Value::Function(Function::native(name, body)))
    }

    /// Whether this frame itself binds `name`.
    pub fn defines(&self, name: &str) -> bool {
        self.with_state(|state| state.bindings.contains_key(name))
    }

    /// Resolve `name` here, then up the parent chain.
    pub fn lookup(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.lookup_local(name) {
            return Some(value);
        }
        self.parent()?.lookup(name)
    }

    /// Resolve `name` in this frame only.
    pub fn lookup_local(&self, name: &str) -> Option<Value> {
        self.with_state(|state| state.bindings.get(name).cloned())
    }

    // Freezing

    pub fn freeze(&self) {
        self.with_state(|state| state.frozen = true);
    }

    pub fn unfreeze(&self) {
        self.with_state(|state| state.frozen = false);
    }

    pub fn is_frozen(&self) -> bool {
        self.with_state(|state| state.frozen)
    }
}

fn short_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}

impl fmt::Debug for StackFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (depth, bindings, frozen) =
            self.with_state(|state| (state.stack.len(), state.bindings.len(), state.frozen));
        f.debug_struct("StackFrame")
            .field("depth", &depth)
            .field("bindings", &bindings)
            .field("frozen", &frozen)
            .field("has_parent", &self.inner.parent.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests;
