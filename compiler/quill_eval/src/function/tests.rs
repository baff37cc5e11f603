#![expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use pretty_assertions::assert_eq;
use quill_ir::{Expr, ExceptionKind};

use crate::{Function, Interpreter, Value};

/// Parse a single `{ ... }` literal into a function value.
fn function(source: &str) -> Function {
    let exprs = quill_parse::parse(source).unwrap();
    match exprs.as_slice() {
        [Expr::Compound(body)] => Function::interpreted(body.clone()),
        other => panic!("expected one function literal, got {other:?}"),
    }
}

#[test]
fn native_function_runs_against_frame() {
    let interpreter = Interpreter::new();
    let frame = interpreter.new_frame();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let double = Function::native("double", move |frame| {
        counter.fetch_add(1, Ordering::SeqCst);
        let n = frame.pop_number()?;
        frame.push(Value::Number(n * 2.0))
    });

    frame.push(Value::Number(21.0)).unwrap();
    double.apply(&frame).unwrap();
    assert_eq!(frame.values(), vec![Value::Number(42.0)]);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn only_the_top_value_is_returned() {
    let interpreter = Interpreter::new();
    let frame = interpreter.new_frame();
    function("{ 1 2 3 }").apply(&frame).unwrap();
    assert_eq!(frame.values(), vec![Value::Number(3.0)]);
}

#[test]
fn empty_body_returns_nothing() {
    let interpreter = Interpreter::new();
    let frame = interpreter.new_frame();
    function("{ }").apply(&frame).unwrap();
    assert!(frame.is_empty());
}

#[test]
fn body_consumes_caller_operands() {
    let interpreter = Interpreter::new();
    let frame = interpreter.new_frame();
    frame.push(Value::Number(5.0)).unwrap();
    function("{ 2 * }").apply(&frame).unwrap();
    assert_eq!(frame.values(), vec![Value::Number(10.0)]);
}

#[test]
fn return_transfer_happens_on_failure() {
    let interpreter = Interpreter::new();
    let frame = interpreter.new_frame();
    let err = function(r#"{ 7 8 "boom" throw }"#)
        .apply(&frame)
        .unwrap_err();

    assert_eq!(err.reason, "boom");
    assert_eq!(frame.values(), vec![Value::Number(8.0)]);
}

#[test]
fn body_bindings_stay_local() {
    let interpreter = Interpreter::new();
    let frame = interpreter.new_frame();
    function("{ 4 =>inner inner }").apply(&frame).unwrap();
    assert_eq!(frame.values(), vec![Value::Number(4.0)]);
    assert_eq!(frame.lookup("inner"), None);
}

#[test]
fn call_depth_limit_stops_runaway_recursion() {
    let interpreter = Interpreter::builder().max_call_depth(Some(32)).build();
    let frame = interpreter.new_frame();
    frame
        .bind_variable("recurse", Value::Function(function("{ recurse }")))
        .unwrap();

    let err = interpreter
        .eval_source(&frame, "recurse")
        .unwrap_err();
    assert_eq!(err.kind, ExceptionKind::CallDepthExceeded { limit: 32 });
    assert_eq!(interpreter.call_depth(), 0);
    assert_eq!(err.backtrace.map(|b| b.len()), Some(32));
}

#[test]
fn apply_on_detached_frame_fails() {
    let interpreter = Interpreter::new();
    let frame = interpreter.new_frame();
    drop(interpreter);
    let err = function("{ 1 }").apply(&frame).unwrap_err();
    assert_eq!(err.kind, ExceptionKind::DetachedFrame);
}

#[test]
fn names_and_rendering() {
    let native = Function::native("swap", |_| Ok(()));
    assert_eq!(native.name(), "swap");
    assert_eq!(native.to_string(), "<native swap>");

    let literal = function("{ 2 * }");
    assert_eq!(literal.name(), "<anonymous>");
    assert_eq!(literal.to_string(), "{ 2 * }");
    assert!(literal.ptr_eq(&literal.clone()));
    assert!(!literal.ptr_eq(&function("{ 2 * }")));
}
