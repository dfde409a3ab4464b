//! Error types for the CLI.

use core_types::ScriptError;
use thiserror::Error;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Compilation error from the engine
    #[error("compile error: {0}")]
    Compile(ScriptError),

    /// File I/O error
    #[error("file error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;
