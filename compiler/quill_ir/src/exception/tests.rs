use super::*;
use pretty_assertions::assert_eq;

#[test]
fn factory_sets_kind_and_reason() {
    let err = unbound_word("frobnicate", Offset::new(2, 5));
    assert_eq!(
        err.kind,
        ExceptionKind::UnboundWord {
            word: "frobnicate".to_string()
        }
    );
    assert_eq!(err.reason, "unbound word: frobnicate");
    assert_eq!(err.offset, Some(Offset::new(2, 5)));
}

#[test]
fn user_throw_reason_is_verbatim() {
    let err = user_throw("out of ink");
    assert_eq!(err.reason, "out of ink");
    assert!(err.is_user_throw());
    assert!(!stack_underflow().is_user_throw());
}

#[test]
fn invalid_offset_is_not_recorded() {
    let err = stack_underflow().with_offset(Offset::INVALID);
    assert_eq!(err.offset, None);
}

#[test]
fn with_offset_if_missing_keeps_first_origin() {
    let err = type_mismatch("Number", "Text")
        .with_offset_if_missing(Offset::new(1, 3))
        .with_offset_if_missing(Offset::new(9, 9));
    assert_eq!(err.offset, Some(Offset::new(1, 3)));
}

#[test]
fn metadata_is_ordered() {
    let backtrace = Backtrace::new(vec![BacktraceFrame {
        name: "double".to_string(),
        offset: Offset::new(1, 10),
    }]);
    let err = user_throw("boom")
        .with_offset(Offset::new(3, 4))
        .with_backtrace(backtrace)
        .with_metadata("source", "main.quill");

    let keys: Vec<String> = err.metadata().into_iter().map(|(k, _)| k).collect();
    assert_eq!(keys, vec!["line", "column", "backtrace", "source"]);
    assert_eq!(err.metadata()[2].1, "  0: double at 1:10");
}

#[test]
fn empty_backtrace_is_not_attached() {
    let err = stack_underflow().with_backtrace(Backtrace::default());
    assert!(err.backtrace.is_none());
    assert!(err.metadata().is_empty());
}

#[test]
fn display_includes_offset_and_backtrace() {
    let err = unbound_word("x", Offset::new(1, 1)).with_backtrace(Backtrace::new(vec![
        BacktraceFrame {
            name: "outer".to_string(),
            offset: Offset::INVALID,
        },
    ]));
    assert_eq!(
        err.to_string(),
        "unbound word: x (at 1:1)\nbacktrace:\n  0: outer"
    );
}

#[test]
fn hash_literal_reason_mentions_count() {
    let err = malformed_hash_literal(3, Offset::new(1, 1));
    assert_eq!(
        err.reason,
        "malformed hash literal: expected an even number of elements, got 3"
    );
}
