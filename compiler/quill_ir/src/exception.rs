//! The runtime's single error type.
//!
//! Every failure (parse errors, resolution failures, type mismatches,
//! stack underflow, frozen-frame writes, script-level `throw`) travels as an
//! `Exception` inside a `Result`. There is no fatal/recoverable split in the
//! type; recoverability is decided where the error is caught.
//!
//! Factory functions (`unbound_word()`, `stack_underflow()`, ...) are the
//! public constructors. They fill in both `kind` and the human-readable
//! `reason`.

use std::fmt;

use crate::Offset;

/// Result of a runtime operation.
pub type EvalResult<T = ()> = Result<T, Exception>;

/// Typed failure category.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExceptionKind {
    /// Malformed source text.
    ParseFailure { detail: String },
    /// No word handler consumed the word.
    UnboundWord { word: String },
    /// A popped value had the wrong type.
    TypeMismatch { expected: String, got: String },
    /// Pop or peek on an empty frame with no usable parent.
    StackUnderflow,
    /// Mutation of a frozen frame.
    FrozenFrameMutation,
    /// A hash literal with an odd number of elements.
    MalformedHashLiteral { elements: usize },
    /// A dot path stepped through something that is not a hash.
    NonHashLookup { segment: String, type_name: String },
    /// Script-level `throw`.
    UserThrow { reason: String },
    ImportDisabled { name: String },
    ImportNotFound { name: String },
    /// An import candidate exists but could not be read.
    ImportFailed { path: String, detail: String },
    CallDepthExceeded { limit: usize },
    /// The frame's interpreter has already been dropped.
    DetachedFrame,
}

impl fmt::Display for ExceptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ParseFailure { detail } => write!(f, "parse error: {detail}"),
            Self::UnboundWord { word } => write!(f, "unbound word: {word}"),
            Self::TypeMismatch { expected, got } => {
                write!(f, "type mismatch: expected {expected}, got {got}")
            }
            Self::StackUnderflow => f.write_str("stack underflow"),
            Self::FrozenFrameMutation => f.write_str("access violation: frame is frozen"),
            Self::MalformedHashLiteral { elements } => write!(
                f,
                "malformed hash literal: expected an even number of elements, got {elements}"
            ),
            Self::NonHashLookup {
                segment,
                type_name,
            } => write!(
                f,
                "non-hash object used in dot-lookup: cannot look up `{segment}` in {type_name}"
            ),
            Self::UserThrow { reason } => f.write_str(reason),
            Self::ImportDisabled { name } => {
                write!(f, "importing is disabled (cannot import `{name}`)")
            }
            Self::ImportNotFound { name } => write!(f, "no importable file found for `{name}`"),
            Self::ImportFailed { path, detail } => write!(f, "failed to import `{path}`: {detail}"),
            Self::CallDepthExceeded { limit } => {
                write!(f, "maximum call depth exceeded (limit: {limit})")
            }
            Self::DetachedFrame => f.write_str("frame is detached from its interpreter"),
        }
    }
}

/// One entry of a rendered backtrace.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BacktraceFrame {
    /// Function name, or `<anonymous>` for an unnamed closure.
    pub name: String,
    /// Where the function's body starts.
    pub offset: Offset,
}

/// Snapshot of the in-flight function calls, most recent first.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Backtrace {
    frames: Vec<BacktraceFrame>,
}

impl Backtrace {
    pub fn new(frames: Vec<BacktraceFrame>) -> Self {
        Self { frames }
    }

    pub fn frames(&self) -> &[BacktraceFrame] {
        &self.frames
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }
}

impl fmt::Display for Backtrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, frame) in self.frames.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "  {i}: {}", frame.name)?;
            if frame.offset.is_valid() {
                write!(f, " at {}", frame.offset)?;
            }
        }
        Ok(())
    }
}

/// A raised failure: reason text plus ordered metadata.
#[derive(Clone, Debug, PartialEq)]
pub struct Exception {
    pub kind: ExceptionKind,
    /// Human-readable reason. Equals `kind.to_string()` for factory errors.
    pub reason: String,
    /// Origin of the failure, when known.
    pub offset: Option<Offset>,
    /// Call stack captured while the failure unwound through functions.
    pub backtrace: Option<Backtrace>,
    /// Host-added metadata, in insertion order.
    pub extra: Vec<(String, String)>,
}

impl Exception {
    pub fn new(kind: ExceptionKind) -> Self {
        let reason = kind.to_string();
        Exception {
            kind,
            reason,
            offset: None,
            backtrace: None,
            extra: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_offset(mut self, offset: Offset) -> Self {
        if offset.is_valid() {
            self.offset = Some(offset);
        }
        self
    }

    /// Attach `offset` unless an earlier, more precise origin is recorded.
    #[must_use]
    pub fn with_offset_if_missing(self, offset: Offset) -> Self {
        if self.offset.is_some() {
            self
        } else {
            self.with_offset(offset)
        }
    }

    #[must_use]
    pub fn with_backtrace(mut self, backtrace: Backtrace) -> Self {
        if !backtrace.is_empty() {
            self.backtrace = Some(backtrace);
        }
        self
    }

    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.push((key.into(), value.into()));
        self
    }

    /// Whether this came from a script-level `throw`.
    #[inline]
    pub fn is_user_throw(&self) -> bool {
        matches!(self.kind, ExceptionKind::UserThrow { .. })
    }

    /// The ordered metadata map: `line`, `column`, `backtrace`, then extras.
    pub fn metadata(&self) -> Vec<(String, String)> {
        let mut entries = Vec::with_capacity(self.extra.len() + 3);
        if let Some(offset) = self.offset {
            entries.push(("line".to_string(), offset.line.to_string()));
            entries.push(("column".to_string(), offset.column.to_string()));
        }
        if let Some(backtrace) = &self.backtrace {
            entries.push(("backtrace".to_string(), backtrace.to_string()));
        }
        entries.extend(self.extra.iter().cloned());
        entries
    }
}

impl fmt::Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.reason)?;
        if let Some(offset) = self.offset {
            write!(f, " (at {offset})")?;
        }
        if let Some(backtrace) = &self.backtrace {
            write!(f, "\nbacktrace:\n{backtrace}")?;
        }
        Ok(())
    }
}

impl std::error::Error for Exception {}

#[cold]
pub fn parse_failure(detail: impl Into<String>, offset: Offset) -> Exception {
    Exception::new(ExceptionKind::ParseFailure {
        detail: detail.into(),
    })
    .with_offset(offset)
}

#[cold]
pub fn unbound_word(word: &str, offset: Offset) -> Exception {
    Exception::new(ExceptionKind::UnboundWord {
        word: word.to_string(),
    })
    .with_offset(offset)
}

#[cold]
pub fn type_mismatch(expected: &str, got: &str) -> Exception {
    Exception::new(ExceptionKind::TypeMismatch {
        expected: expected.to_string(),
        got: got.to_string(),
    })
}

#[cold]
pub fn stack_underflow() -> Exception {
    Exception::new(ExceptionKind::StackUnderflow)
}

#[cold]
pub fn frozen_frame_mutation() -> Exception {
    Exception::new(ExceptionKind::FrozenFrameMutation)
}

#[cold]
pub fn malformed_hash_literal(elements: usize, offset: Offset) -> Exception {
    Exception::new(ExceptionKind::MalformedHashLiteral { elements }).with_offset(offset)
}

#[cold]
pub fn non_hash_dot_lookup(segment: &str, type_name: &str, offset: Offset) -> Exception {
    Exception::new(ExceptionKind::NonHashLookup {
        segment: segment.to_string(),
        type_name: type_name.to_string(),
    })
    .with_offset(offset)
}

/// Script-level `throw`. The reason is the thrown text, verbatim.
#[cold]
pub fn user_throw(reason: impl Into<String>) -> Exception {
    Exception::new(ExceptionKind::UserThrow {
        reason: reason.into(),
    })
}

#[cold]
pub fn import_disabled(name: &str) -> Exception {
    Exception::new(ExceptionKind::ImportDisabled {
        name: name.to_string(),
    })
}

#[cold]
pub fn import_not_found(name: &str) -> Exception {
    Exception::new(ExceptionKind::ImportNotFound {
        name: name.to_string(),
    })
}

#[cold]
pub fn import_failed(path: &str, detail: impl Into<String>) -> Exception {
    Exception::new(ExceptionKind::ImportFailed {
        path: path.to_string(),
        detail: detail.into(),
    })
}

#[cold]
pub fn call_depth_exceeded(limit: usize) -> Exception {
    Exception::new(ExceptionKind::CallDepthExceeded { limit })
}

#[cold]
pub fn detached_frame() -> Exception {
    Exception::new(ExceptionKind::DetachedFrame)
}

#[cfg(test)]
mod tests;
