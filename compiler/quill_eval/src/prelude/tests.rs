#![expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]

use pretty_assertions::assert_eq;
use quill_ir::ExceptionKind;

use crate::{Interpreter, Value, RESCUE_BINDING};

fn run(source: &str) -> Vec<Value> {
    let interpreter = Interpreter::new();
    let frame = interpreter.new_frame();
    interpreter.eval_source(&frame, source).unwrap();
    frame.values()
}

fn run_err(source: &str) -> quill_ir::Exception {
    let interpreter = Interpreter::new();
    let frame = interpreter.new_frame();
    interpreter.eval_source(&frame, source).unwrap_err()
}

fn numbers(values: &[f64]) -> Vec<Value> {
    values.iter().copied().map(Value::Number).collect()
}

#[test]
fn arithmetic() {
    assert_eq!(run("7 2 -"), numbers(&[5.0]));
    assert_eq!(run("7 2 /"), numbers(&[3.5]));
    assert_eq!(run("1 2 + 3 *"), numbers(&[9.0]));
}

#[test]
fn arithmetic_requires_numbers() {
    let err = run_err(r#"1 "x" +"#);
    assert_eq!(
        err.kind,
        ExceptionKind::TypeMismatch {
            expected: "Number".to_string(),
            got: "Text".to_string()
        }
    );
}

#[test]
fn stack_words() {
    assert_eq!(run("1 dup"), numbers(&[1.0, 1.0]));
    assert_eq!(run("1 2 drop"), numbers(&[1.0]));
    assert_eq!(run("1 2 swap"), numbers(&[2.0, 1.0]));
    assert_eq!(run_err("drop").kind, ExceptionKind::StackUnderflow);
}

#[test]
fn throw_uses_value_as_reason() {
    let err = run_err(r#""disk full" throw"#);
    assert!(err.is_user_throw());
    assert_eq!(err.reason, "disk full");
    assert_eq!(err.offset.map(|o| o.column), Some(13));
}

#[test]
fn rescue_runs_catch_with_reason() {
    let values = run(r#"{ "bad input" throw } { exception } rescue"#);
    assert_eq!(values, vec![Value::text("bad input")]);
    assert_eq!(RESCUE_BINDING, "exception");
}

#[test]
fn rescue_catches_runtime_errors() {
    let values = run(r"{ 1 nope } { exception } rescue");
    assert_eq!(values, vec![Value::Number(1.0), Value::text("unbound word: nope")]);
}

#[test]
fn rescue_skips_catch_on_success() {
    assert_eq!(run(r#"{ 42 } { "caught" } rescue"#), numbers(&[42.0]));
}

#[test]
fn rescue_catch_may_rethrow() {
    let err = run_err(r#"{ "first" throw } { "second" throw } rescue"#);
    assert_eq!(err.reason, "second");
}

#[test]
fn rescue_leaves_call_stack_balanced() {
    let interpreter = Interpreter::new();
    let frame = interpreter.new_frame();
    interpreter
        .eval_source(&frame, r#"{ { "x" throw } apply } { 0 } rescue"#)
        .unwrap();
    assert_eq!(interpreter.call_depth(), 0);
    assert!(interpreter.backtrace().is_empty());
}

#[test]
fn set_updates_outer_binding() {
    let values = run("1 =>count { 2 'count set } apply count");
    assert_eq!(values, numbers(&[2.0]));
}

#[test]
fn set_accepts_text_names() {
    assert_eq!(run(r#"5 "n" set n"#), numbers(&[5.0]));
}

#[test]
fn set_cannot_overwrite_builtins() {
    let err = run_err("0 'apply set");
    assert_eq!(err.kind, ExceptionKind::FrozenFrameMutation);
}

#[test]
fn hash_get_matches_dot_lookup() {
    assert_eq!(run(r#"#[ 'k 1 ] "k" hash_get"#), numbers(&[1.0]));
    assert_eq!(run(r#"#[ 'k 1 ] 'k hash_get"#), numbers(&[1.0]));
    assert_eq!(run(r#"#[ 'k 1 ] "z" hash_get"#), vec![Value::Null]);
}

#[test]
fn import_raises_when_not_found() {
    let err = run_err(r#""no_such_module" import"#);
    assert_eq!(
        err.kind,
        ExceptionKind::ImportNotFound {
            name: "no_such_module".to_string()
        }
    );
}

#[test]
fn import_disabled_is_reported() {
    let interpreter = Interpreter::builder().import_enabled(false).build();
    let frame = interpreter.new_frame();
    let err = interpreter
        .eval_source(&frame, r#""lib" import"#)
        .unwrap_err();
    assert!(matches!(err.kind, ExceptionKind::ImportDisabled { .. }));
}

#[test]
fn prelude_can_be_left_out() {
    let interpreter = Interpreter::builder().prelude(false).build();
    assert!(interpreter.root().lookup("apply").is_none());
    let frame = interpreter.new_frame();
    let err = interpreter.eval_source(&frame, "1 dup").unwrap_err();
    assert!(matches!(err.kind, ExceptionKind::UnboundWord { .. }));
}
