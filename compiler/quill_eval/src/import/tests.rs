#![expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]

use std::fs;
use std::path::Path;

use pretty_assertions::assert_eq;
use quill_ir::ExceptionKind;

use super::with_default_extension;
use crate::{Interpreter, Value};

fn write(dir: &Path, name: &str, source: &str) {
    fs::write(dir.join(name), source).unwrap();
}

#[test]
fn extension_is_appended_only_when_missing() {
    assert_eq!(
        with_default_extension(Path::new("util"), "quill"),
        Path::new("util.quill")
    );
    assert_eq!(
        with_default_extension(Path::new("util.txt"), "quill"),
        Path::new("util.txt")
    );
    assert_eq!(
        with_default_extension(Path::new("lib/util"), "quill"),
        Path::new("lib/util.quill")
    );
}

#[test]
fn first_search_path_wins() {
    let first = tempfile::tempdir().unwrap();
    let second = tempfile::tempdir().unwrap();
    write(first.path(), "lib.quill", "1");
    write(second.path(), "lib.quill", "2");

    let interpreter = Interpreter::builder()
        .search_path(first.path())
        .search_path(second.path())
        .build();
    assert_eq!(
        interpreter.resolve_import("lib"),
        Some(first.path().join("lib.quill"))
    );
}

#[test]
fn directories_are_not_imported() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("lib.quill")).unwrap();
    let interpreter = Interpreter::builder().search_path(dir.path()).build();
    assert_eq!(interpreter.resolve_import("lib"), None);
}

#[test]
fn import_evaluates_into_frame() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "defs.quill", "42 =>answer 7");

    let interpreter = Interpreter::builder().search_path(dir.path()).build();
    let frame = interpreter.new_frame();
    assert!(interpreter.import(&frame, "defs").unwrap());
    assert_eq!(frame.lookup("answer"), Some(Value::Number(42.0)));
    assert_eq!(frame.values(), vec![Value::Number(7.0)]);
}

#[test]
fn missing_import_returns_false() {
    let dir = tempfile::tempdir().unwrap();
    let interpreter = Interpreter::builder().search_path(dir.path()).build();
    let frame = interpreter.new_frame();
    assert!(!interpreter.import(&frame, "nowhere").unwrap());
}

#[test]
fn disabled_import_fails() {
    let interpreter = Interpreter::builder().import_enabled(false).build();
    let frame = interpreter.new_frame();
    let err = interpreter.import(&frame, "anything").unwrap_err();
    assert_eq!(
        err.kind,
        ExceptionKind::ImportDisabled {
            name: "anything".to_string()
        }
    );
}

#[test]
fn parse_errors_name_the_file() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "broken.quill", "[ 1 2");
    let interpreter = Interpreter::builder().search_path(dir.path()).build();
    let frame = interpreter.new_frame();

    let err = interpreter.import(&frame, "broken").unwrap_err();
    assert!(matches!(err.kind, ExceptionKind::ParseFailure { .. }));
    let path = dir.path().join("broken.quill").display().to_string();
    assert!(err.extra.contains(&("file".to_string(), path)));
}
