//! Stack growth guard for recursive descent.
//!
//! Both the parser (nested `[ { #[ ... ] } ]` literals) and the evaluator
//! (nested literals, functions applying functions) recurse on the native
//! stack. Scripts are untrusted input, so every recursive entry point goes
//! through [`ensure_sufficient_stack`].
//!
//! On native targets the `stacker` crate allocates a fresh segment when
//! less than [`RED_ZONE`] bytes remain. WASM manages its own stack and gets
//! a passthrough.

/// Grow once less than this much stack remains (128 KiB).
pub const RED_ZONE: usize = 128 * 1024;

/// Size of each newly allocated stack segment (2 MiB).
pub const SEGMENT_SIZE: usize = 2 * 1024 * 1024;

/// Run `f`, growing the stack first if the red zone has been reached.
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, SEGMENT_SIZE, f)
}

#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}
