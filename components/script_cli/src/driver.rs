//! Compilation driver for the CLI.

use crate::error::{CliError, CliResult};
use bytecode_system::disassemble;
use parser::{parse, EvalMode};
use script_runtime::ScriptRuntime;

/// What the driver renders for a compiled file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rendering {
    /// Just diagnostics; silence on success
    Check,
    /// The AST as JSON
    Ast,
    /// The textual bytecode dump
    Disassembly,
}

/// The CLI driver: compiles paths through a [`ScriptRuntime`].
#[derive(Debug, Default)]
pub struct Driver {
    runtime: ScriptRuntime,
}

impl Driver {
    /// Create a driver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile a file and render it per `rendering`.
    ///
    /// # Errors
    ///
    /// Returns `CliError::Io` when the file cannot be read and
    /// `CliError::Compile` when the program carries a terminal error.
    pub fn run_file(&mut self, path: &str, rendering: Rendering) -> CliResult<String> {
        let source = std::fs::read_to_string(path)?;
        self.run_source(path, &source, rendering)
    }

    /// Compile an in-memory source and render it per `rendering`.
    pub fn run_source(
        &mut self,
        path: &str,
        source: &str,
        rendering: Rendering,
    ) -> CliResult<String> {
        if rendering == Rendering::Ast {
            let ast = parse(source, EvalMode::Program);
            if let Some(error) = ast.error() {
                return Err(CliError::Compile(error));
            }
            let json = ast.to_json(source);
            return Ok(serde_json::to_string_pretty(&json).unwrap_or_default());
        }
        let program = self.runtime.compile(path, source, EvalMode::Program);
        if let Some(error) = &program.error {
            return Err(CliError::Compile(error.clone()));
        }
        match rendering {
            Rendering::Check => Ok(String::new()),
            Rendering::Disassembly => Ok(disassemble(program)),
            Rendering::Ast => unreachable!("handled above"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_is_silent_on_success() {
        let mut driver = Driver::new();
        let output = driver
            .run_source("ok.vs", "let a = 1;", Rendering::Check)
            .unwrap();
        assert!(output.is_empty());
    }

    #[test]
    fn test_disassembly_renders_sections() {
        let mut driver = Driver::new();
        let output = driver
            .run_source("ok.vs", "1 + 2;", Rendering::Disassembly)
            .unwrap();
        assert!(output.contains("[.section code]"));
        assert!(output.contains("ADD"));
    }

    #[test]
    fn test_ast_renders_json() {
        let mut driver = Driver::new();
        let output = driver
            .run_source("ok.vs", "let a = 1;", Rendering::Ast)
            .unwrap();
        assert!(output.contains("\"PROGRAM\""));
    }

    #[test]
    fn test_compile_errors_surface() {
        let mut driver = Driver::new();
        let error = driver
            .run_source("bad.vs", "let = ;", Rendering::Check)
            .unwrap_err();
        assert!(matches!(error, CliError::Compile(_)));
    }
}
