//! Unit tests for ScriptError and ErrorKind.

use core_types::{ErrorKind, ScriptError, SourcePosition, SourceSpan, StackFrame};

#[test]
fn test_error_kind_names() {
    assert_eq!(ErrorKind::SyntaxError.name(), "SyntaxError");
    assert_eq!(ErrorKind::TypeError.name(), "TypeError");
    assert_eq!(ErrorKind::ReferenceError.name(), "ReferenceError");
    assert_eq!(ErrorKind::RangeError.name(), "RangeError");
    assert_eq!(ErrorKind::InternalError.name(), "InternalError");
}

#[test]
fn test_error_builder() {
    let span = SourceSpan::point(SourcePosition {
        line: 0,
        column: 3,
        offset: 3,
    });
    let error = ScriptError::new(ErrorKind::SyntaxError, "Invalid or unexpected token")
        .with_span(span);
    assert_eq!(error.kind, ErrorKind::SyntaxError);
    assert_eq!(error.span, Some(span));
    assert!(error.stack.is_empty());
}

#[test]
fn test_display_renders_one_based_positions() {
    let span = SourceSpan::point(SourcePosition {
        line: 4,
        column: 9,
        offset: 80,
    });
    let error = ScriptError::new(ErrorKind::TypeError, "boom").with_span(span);
    assert_eq!(error.to_string(), "TypeError: boom (5:10)");
}

#[test]
fn test_display_renders_call_chain() {
    let mut error = ScriptError::new(ErrorKind::ReferenceError, "x is not defined");
    error.stack.push(StackFrame {
        function_name: Some("update".to_string()),
        filename: Some("scene.vs".to_string()),
        line: 3,
        column: 1,
    });
    error.stack.push(StackFrame {
        function_name: None,
        filename: None,
        line: 0,
        column: 0,
    });
    let rendered = error.to_string();
    assert!(rendered.contains("at update (scene.vs:3:1)"));
    assert!(rendered.contains("at <anonymous> (<unknown>:0:0)"));
}

#[test]
fn test_error_is_std_error() {
    fn assert_error<E: std::error::Error>(_: &E) {}
    let error = ScriptError::new(ErrorKind::InternalError, "x");
    assert_error(&error);
}
