//! Syntax error helpers.

use core_types::{ErrorKind, ScriptError, SourceSpan};

/// Create a syntax error covering a span.
pub fn syntax_error(message: impl Into<String>, span: SourceSpan) -> ScriptError {
    ScriptError::new(ErrorKind::SyntaxError, message).with_span(span)
}

/// The message used for generic token-level failures.
pub const UNEXPECTED_TOKEN: &str = "Invalid or unexpected token";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_syntax_error_kind() {
        let err = syntax_error("test", SourceSpan::default());
        assert!(matches!(err.kind, ErrorKind::SyntaxError));
        assert!(err.span.is_some());
    }
}
