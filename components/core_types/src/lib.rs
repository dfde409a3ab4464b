//! Core types shared by the script engine components.
//!
//! This crate provides the foundational types for the embedded scripting
//! engine: source location tracking, diagnostic stack frames, and the
//! engine error type.
//!
//! # Overview
//!
//! - [`SourcePosition`] - A line/column/offset triple into a source buffer
//! - [`SourceSpan`] - A start/end position pair used to re-slice source text
//! - [`StackFrame`] - Diagnostic call stack frame information
//! - [`ScriptError`] - Engine errors with kind, message, span and stack
//! - [`ErrorKind`] - Categories of engine errors
//!
//! # Examples
//!
//! ```
//! use core_types::{ErrorKind, ScriptError, SourceSpan};
//!
//! let error = ScriptError {
//!     kind: ErrorKind::SyntaxError,
//!     message: "Invalid or unexpected token".to_string(),
//!     stack: vec![],
//!     span: Some(SourceSpan::default()),
//! };
//!
//! assert_eq!(error.message, "Invalid or unexpected token");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

mod error;
mod source;

pub use error::{ErrorKind, ScriptError};
pub use source::{SourcePosition, SourceSpan, StackFrame};
