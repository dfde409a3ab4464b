//! Unit tests for SourcePosition, SourceSpan and StackFrame.

use core_types::{SourcePosition, SourceSpan, StackFrame};

fn at(offset: usize, line: u32, column: u32) -> SourcePosition {
    SourcePosition {
        line,
        column,
        offset,
    }
}

#[test]
fn test_position_defaults_to_origin() {
    let position = SourcePosition::default();
    assert_eq!(position.line, 0);
    assert_eq!(position.column, 0);
    assert_eq!(position.offset, 0);
}

#[test]
fn test_span_covers_half_open_range() {
    let source = "update(delta);";
    let span = SourceSpan::new(at(0, 0, 0), at(6, 0, 6));
    assert_eq!(span.slice(source), "update");
    assert_eq!(span.len(), 6);
}

#[test]
fn test_span_matches_exact_text_only() {
    let source = "node.visible";
    let span = SourceSpan::new(at(5, 0, 5), at(12, 0, 12));
    assert!(span.matches(source, "visible"));
    assert!(!span.matches(source, "visibl"));
    assert!(!span.matches(source, "visible_"));
}

#[test]
fn test_point_span() {
    let span = SourceSpan::point(at(4, 1, 2));
    assert!(span.is_empty());
    assert_eq!(span.start, span.end);
}

#[test]
fn test_spans_survive_multibyte_text() {
    let source = "let name = \"héllo\";";
    let start = source.find('"').unwrap();
    let end = source.rfind('"').unwrap() + 1;
    let span = SourceSpan::new(at(start, 0, start as u32), at(end, 0, end as u32));
    assert_eq!(span.slice(source), "\"héllo\"");
}

#[test]
fn test_stack_frame_fields() {
    let frame = StackFrame {
        function_name: Some("render".to_string()),
        filename: Some("scene/root.vs".to_string()),
        line: 12,
        column: 4,
    };
    assert_eq!(frame.function_name.as_deref(), Some("render"));
    assert_eq!(frame.filename.as_deref(), Some("scene/root.vs"));
}

#[test]
fn test_anonymous_frame() {
    let frame = StackFrame::default();
    assert!(frame.function_name.is_none());
    assert!(frame.filename.is_none());
}
