#![expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]

use std::sync::Arc;

use pretty_assertions::assert_eq;
use quill_ir::ExceptionKind;

use crate::{HostObject, Interpreter, StackFrame, Value, ValueType};

fn bare() -> Interpreter {
    Interpreter::builder().prelude(false).build()
}

fn kind(result: quill_ir::EvalResult<impl std::fmt::Debug>) -> ExceptionKind {
    result.unwrap_err().kind
}

#[derive(Debug)]
struct Path(String);

impl HostObject for Path {
    fn type_name(&self) -> &str {
        "Path"
    }
}

#[derive(Debug)]
struct Image;

impl HostObject for Image {
    fn type_name(&self) -> &str {
        "Image"
    }
}

#[test]
fn push_and_pop_are_lifo() {
    let interpreter = bare();
    let frame = StackFrame::new(None, &interpreter);
    frame.push(Value::Number(1.0)).unwrap();
    frame.push(Value::Number(2.0)).unwrap();

    assert_eq!(frame.depth(), 2);
    assert_eq!(frame.pop().unwrap(), Value::Number(2.0));
    assert_eq!(frame.pop().unwrap(), Value::Number(1.0));
    assert!(frame.is_empty());
}

#[test]
fn empty_root_underflows() {
    let interpreter = bare();
    let frame = StackFrame::new(None, &interpreter);
    assert_eq!(kind(frame.pop()), ExceptionKind::StackUnderflow);
    assert_eq!(kind(frame.peek()), ExceptionKind::StackUnderflow);
}

#[test]
fn pop_reads_through_to_unfrozen_parent() {
    let interpreter = bare();
    let parent = StackFrame::new(None, &interpreter);
    let child = StackFrame::new(Some(&parent), &interpreter);
    parent.push(Value::Number(5.0)).unwrap();

    assert_eq!(child.peek().unwrap(), Value::Number(5.0));
    assert_eq!(parent.depth(), 1);
    assert_eq!(child.pop().unwrap(), Value::Number(5.0));
    assert!(parent.is_empty());
}

#[test]
fn frozen_parent_stops_delegation() {
    let interpreter = bare();
    let parent = StackFrame::new(None, &interpreter);
    parent.push(Value::Number(5.0)).unwrap();
    parent.freeze();
    let child = StackFrame::new(Some(&parent), &interpreter);

    assert_eq!(kind(child.pop()), ExceptionKind::StackUnderflow);
    assert_eq!(kind(child.peek()), ExceptionKind::StackUnderflow);
    assert_eq!(parent.values(), vec![Value::Number(5.0)]);
}

#[test]
fn script_frames_cannot_drain_the_root() {
    let interpreter = Interpreter::new();
    let frame = interpreter.new_frame();
    assert!(interpreter.root().is_frozen());
    assert_eq!(kind(frame.pop()), ExceptionKind::StackUnderflow);
}

#[test]
fn frozen_frame_rejects_mutation() {
    let interpreter = bare();
    let frame = StackFrame::new(None, &interpreter);
    frame.push(Value::Number(1.0)).unwrap();
    frame.bind_variable("x", Value::Number(2.0)).unwrap();
    frame.freeze();

    assert_eq!(
        kind(frame.push(Value::Null)),
        ExceptionKind::FrozenFrameMutation
    );
    assert_eq!(kind(frame.pop()), ExceptionKind::FrozenFrameMutation);
    assert_eq!(
        kind(frame.bind_variable("x", Value::Null)),
        ExceptionKind::FrozenFrameMutation
    );
    assert_eq!(
        kind(frame.bind_function("f", |_| Ok(()))),
        ExceptionKind::FrozenFrameMutation
    );

    // Reads still work.
    assert_eq!(frame.peek().unwrap(), Value::Number(1.0));
    assert_eq!(frame.lookup("x"), Some(Value::Number(2.0)));

    frame.unfreeze();
    assert!(!frame.is_frozen());
    assert_eq!(frame.pop().unwrap(), Value::Number(1.0));
}

#[test]
fn push_option_pushes_null_for_none() {
    let interpreter = bare();
    let frame = StackFrame::new(None, &interpreter);
    frame.push_option(None).unwrap();
    frame.push_option(Some(Value::Number(3.0))).unwrap();
    assert_eq!(frame.values(), vec![Value::Null, Value::Number(3.0)]);
}

#[test]
fn typed_pops_consume_on_mismatch() {
    let interpreter = bare();
    let frame = StackFrame::new(None, &interpreter);
    frame.push(Value::Number(1.0)).unwrap();
    frame.push(Value::text("not a number")).unwrap();

    assert_eq!(
        kind(frame.pop_number()),
        ExceptionKind::TypeMismatch {
            expected: "Number".to_string(),
            got: "Text".to_string()
        }
    );
    assert_eq!(frame.pop_number().unwrap(), 1.0);
}

#[test]
fn typed_pops_return_payloads() {
    let interpreter = bare();
    let frame = StackFrame::new(None, &interpreter);
    frame.push(Value::text("hi")).unwrap();
    frame
        .push(Value::vector(vec![Value::Number(1.0)]))
        .unwrap();
    frame.push(Value::Type(ValueType::Number)).unwrap();

    assert_eq!(
        frame.pop_type(ValueType::Type).unwrap(),
        Value::Type(ValueType::Number)
    );
    assert_eq!(frame.pop_vector().unwrap().len(), 1);
    assert_eq!(&*frame.pop_text().unwrap(), "hi");

    frame.push(Value::Null).unwrap();
    assert_eq!(
        kind(frame.pop_hash()),
        ExceptionKind::TypeMismatch {
            expected: "Hash".to_string(),
            got: "Null".to_string()
        }
    );
}

#[test]
fn pop_host_downcasts() {
    let interpreter = bare();
    let frame = StackFrame::new(None, &interpreter);
    frame
        .push(Value::host(Path("/tmp/a.png".to_string())))
        .unwrap();
    let path: Arc<Path> = frame.pop_host::<Path>().unwrap();
    assert_eq!(path.0, "/tmp/a.png");

    frame.push(Value::host(Image)).unwrap();
    assert_eq!(
        kind(frame.pop_host::<Path>()),
        ExceptionKind::TypeMismatch {
            expected: "Path".to_string(),
            got: "Image".to_string()
        }
    );
}

#[test]
fn bind_searching_parents_updates_defining_frame() {
    let interpreter = bare();
    let outer = StackFrame::new(None, &interpreter);
    let inner = StackFrame::new(Some(&outer), &interpreter);
    outer.bind_variable("count", Value::Number(1.0)).unwrap();

    inner.bind("count", Value::Number(2.0), true).unwrap();
    assert!(!inner.defines("count"));
    assert_eq!(outer.lookup("count"), Some(Value::Number(2.0)));

    inner.bind("fresh", Value::Number(3.0), true).unwrap();
    assert!(inner.defines("fresh"));
    assert_eq!(outer.lookup("fresh"), None);
}

#[test]
fn bind_without_search_shadows() {
    let interpreter = bare();
    let outer = StackFrame::new(None, &interpreter);
    let inner = StackFrame::new(Some(&outer), &interpreter);
    outer.bind_variable("x", Value::Number(1.0)).unwrap();
    inner.bind("x", Value::Number(9.0), false).unwrap();

    assert_eq!(inner.lookup("x"), Some(Value::Number(9.0)));
    assert_eq!(outer.lookup("x"), Some(Value::Number(1.0)));
}

#[test]
fn local_lookup_ignores_parents() {
    let interpreter = bare();
    let outer = StackFrame::new(None, &interpreter);
    let inner = StackFrame::new(Some(&outer), &interpreter);
    outer.bind_variable("x", Value::Number(1.0)).unwrap();

    assert_eq!(inner.lookup_local("x"), None);
    assert_eq!(inner.lookup("x"), Some(Value::Number(1.0)));
}

#[test]
fn bind_into_frozen_defining_frame_fails() {
    let interpreter = Interpreter::new();
    let frame = interpreter.new_frame();
    assert_eq!(
        kind(frame.bind("apply", Value::Null, true)),
        ExceptionKind::FrozenFrameMutation
    );
    // A local binding may still shadow a built-in.
    frame.bind("apply", Value::Null, false).unwrap();
    assert_eq!(frame.lookup("apply"), Some(Value::Null));
}

#[test]
fn iterate_visits_bottom_to_top() {
    let interpreter = bare();
    let frame = StackFrame::new(None, &interpreter);
    for n in 1..=3 {
        frame.push(Value::Number(f64::from(n))).unwrap();
    }
    let mut seen = Vec::new();
    frame.iterate(|value| seen.push(value.to_string()));
    assert_eq!(seen, vec!["1", "2", "3"]);
}

#[test]
fn iterate_visitor_may_touch_the_frame() {
    let interpreter = bare();
    let frame = StackFrame::new(None, &interpreter);
    frame.push(Value::Number(1.0)).unwrap();
    frame.iterate(|value| frame.push(value.clone()).unwrap());
    assert_eq!(frame.depth(), 2);
}

#[test]
fn dropped_parent_is_gone() {
    let interpreter = bare();
    let parent = StackFrame::new(None, &interpreter);
    parent.push(Value::Number(1.0)).unwrap();
    let child = StackFrame::new(Some(&parent), &interpreter);
    drop(parent);

    assert!(child.parent().is_none());
    assert_eq!(kind(child.pop()), ExceptionKind::StackUnderflow);
}

#[test]
fn frame_outliving_interpreter_is_detached() {
    let interpreter = bare();
    let frame = StackFrame::new(None, &interpreter);
    assert!(frame.interpreter().is_ok());
    drop(interpreter);
    assert_eq!(kind(frame.interpreter()), ExceptionKind::DetachedFrame);
}

#[test]
fn frames_are_shared_across_threads() {
    let interpreter = bare();
    let frame = StackFrame::new(None, &interpreter);
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let frame = frame.clone();
            std::thread::spawn(move || {
                for _ in 0..100 {
                    frame.push(Value::Number(1.0)).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(frame.depth(), 400);
}
