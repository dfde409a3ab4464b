//! Engine error types and error handling.
//!
//! This module provides error types that correspond to the scripting
//! language's built-in error categories, along with stack trace
//! information.

use crate::{SourceSpan, StackFrame};
use std::fmt;

/// The kind of engine error.
///
/// These correspond to the scripting language's built-in error
/// constructors, plus an internal category for engine faults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Syntax error in script source
    SyntaxError,
    /// Type error (e.g., calling a non-function)
    TypeError,
    /// Reference to an undefined variable
    ReferenceError,
    /// Value out of allowed range
    RangeError,
    /// Internal engine error
    InternalError,
}

impl ErrorKind {
    /// The constructor name used when rendering the error.
    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::SyntaxError => "SyntaxError",
            ErrorKind::TypeError => "TypeError",
            ErrorKind::ReferenceError => "ReferenceError",
            ErrorKind::RangeError => "RangeError",
            ErrorKind::InternalError => "InternalError",
        }
    }
}

/// An engine error with message, source span and stack trace.
///
/// Represents a failure surfaced by `parse`, `compile` or `eval`. Parse
/// failures carry a zero-width or point span at the offending input;
/// runtime failures carry the call stack collected from diagnostic
/// frames.
///
/// # Examples
///
/// ```
/// use core_types::{ErrorKind, ScriptError};
///
/// let error = ScriptError {
///     kind: ErrorKind::TypeError,
///     message: "variable is not a function".to_string(),
///     stack: vec![],
///     span: None,
/// };
///
/// assert_eq!(error.to_string(), "TypeError: variable is not a function");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptError {
    /// The category of error
    pub kind: ErrorKind,
    /// Human-readable error message
    pub message: String,
    /// Call stack at the time of the error, innermost frame first
    pub stack: Vec<StackFrame>,
    /// Source region where the error occurred
    pub span: Option<SourceSpan>,
}

impl ScriptError {
    /// Create an error with a kind and message and nothing else.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            stack: vec![],
            span: None,
        }
    }

    /// Attach a source span to the error.
    pub fn with_span(mut self, span: SourceSpan) -> Self {
        self.span = Some(span);
        self
    }
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind.name(), self.message)?;
        if let Some(span) = &self.span {
            write!(f, " ({}:{})", span.start.line + 1, span.start.column + 1)?;
        }
        for frame in &self.stack {
            let name = frame.function_name.as_deref().unwrap_or("<anonymous>");
            let file = frame.filename.as_deref().unwrap_or("<unknown>");
            write!(f, "\n    at {} ({}:{}:{})", name, file, frame.line, frame.column)?;
        }
        Ok(())
    }
}

impl std::error::Error for ScriptError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{SourcePosition, SourceSpan};

    #[test]
    fn test_error_display_without_span() {
        let error = ScriptError::new(ErrorKind::ReferenceError, "x is not defined");
        assert_eq!(error.to_string(), "ReferenceError: x is not defined");
    }

    #[test]
    fn test_error_display_with_span() {
        let span = SourceSpan::point(SourcePosition {
            line: 2,
            column: 4,
            offset: 20,
        });
        let error = ScriptError::new(ErrorKind::SyntaxError, "Invalid or unexpected token")
            .with_span(span);
        assert_eq!(
            error.to_string(),
            "SyntaxError: Invalid or unexpected token (3:5)"
        );
    }

    #[test]
    fn test_error_display_with_stack() {
        let mut error = ScriptError::new(ErrorKind::TypeError, "boom");
        error.stack.push(StackFrame {
            function_name: Some("inner".to_string()),
            filename: Some("main.vs".to_string()),
            line: 3,
            column: 7,
        });
        let rendered = error.to_string();
        assert!(rendered.contains("at inner (main.vs:3:7)"));
    }
}
