//! Core words bound in the root frame.
//!
//! | Word      | Stack effect                | Notes                              |
//! |-----------|-----------------------------|------------------------------------|
//! | `apply`   | `( f -- ... )`              | applies `f` in the current frame   |
//! | `throw`   | `( reason -- )`             | raises a user exception            |
//! | `rescue`  | `( try catch -- ... )`      | runs `catch` if `try` fails        |
//! | `import`  | `( name -- ... )`           | fails if nothing was found         |
//! | `set`     | `( value name -- )`         | rebinds where `name` is defined    |
//! | `hash_get`| `( hash key -- value )`     | `Null` for a missing key           |
//! | `+ - * /` | `( a b -- c )`              | number arithmetic                  |
//! | `dup`     | `( a -- a a )`              |                                    |
//! | `drop`    | `( a -- )`                  |                                    |
//! | `swap`    | `( a b -- b a )`            |                                    |

use std::sync::Arc;

use quill_ir::{import_not_found, type_mismatch, user_throw, EvalResult};
use tracing::debug;

use crate::{StackFrame, Value};

/// Name bound to the exception reason while a `rescue` handler runs.
pub const RESCUE_BINDING: &str = "exception";

pub(crate) fn install(root: &StackFrame) -> EvalResult {
    root.bind_function("apply", |frame| {
        let function = frame.pop_function()?;
        function.apply(frame)
    })?;
    root.bind_function("throw", |frame| {
        let reason = frame.pop()?;
        Err(user_throw(reason.to_string()))
    })?;
    root.bind_function("rescue", rescue)?;
    root.bind_function("import", |frame| {
        let name = frame.pop_text()?;
        if frame.interpreter()?.import(frame, &name)? {
            Ok(())
        } else {
            Err(import_not_found(&name))
        }
    })?;
    root.bind_function("set", |frame| {
        let name = pop_name(frame)?;
        let value = frame.pop()?;
        frame.bind(&name, value, true)
    })?;
    root.bind_function("hash_get", |frame| {
        let key = frame.pop()?;
        let hash = frame.pop_hash()?;
        frame.push(hash.get_or_null(&key))
    })?;

    install_arithmetic(root)?;

    root.bind_function("dup", |frame| {
        let top = frame.peek()?;
        frame.push(top)
    })?;
    root.bind_function("drop", |frame| frame.pop().map(|_| ()))?;
    root.bind_function("swap", |frame| {
        let b = frame.pop()?;
        let a = frame.pop()?;
        frame.push(b)?;
        frame.push(a)
    })?;
    Ok(())
}

fn rescue(frame: &StackFrame) -> EvalResult {
    let catch = frame.pop_function()?;
    let attempt = frame.pop_function()?;
    match attempt.apply(frame) {
        Ok(()) => Ok(()),
        Err(err) => {
            debug!(reason = %err.reason, "rescued");
            frame.bind(RESCUE_BINDING, Value::text(err.reason.as_str()), false)?;
            catch.apply(frame)
        }
    }
}

fn install_arithmetic(root: &StackFrame) -> EvalResult {
    let ops: [(&str, fn(f64, f64) -> f64); 4] = [
        ("+", |a, b| a + b),
        ("-", |a, b| a - b),
        ("*", |a, b| a * b),
        ("/", |a, b| a / b),
    ];
    for (name, op) in ops {
        root.bind_function(name, move |frame| {
            let b = frame.pop_number()?;
            let a = frame.pop_number()?;
            frame.push(Value::Number(op(a, b)))
        })?;
    }
    Ok(())
}

/// A binding name given either as text or as a quoted word.
fn pop_name(frame: &StackFrame) -> EvalResult<Arc<str>> {
    match frame.pop()? {
        Value::Text(name) => Ok(name),
        Value::Word(word) => Ok(word.shared_text()),
        other => Err(type_mismatch("Text", other.type_name())),
    }
}

#[cfg(test)]
mod tests;
