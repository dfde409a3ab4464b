//! Compilation cache and orchestrator.
//!
//! [`ScriptRuntime`] owns the path-keyed program cache and the single
//! `compile` entry point: parse, closure resolution and code generation in
//! one pass. A failed compilation is recorded as a terminal error on the
//! cached program; such a program is not executable.
//!
//! # Example
//!
//! ```
//! use script_runtime::ScriptRuntime;
//! use parser::EvalMode;
//!
//! let mut runtime = ScriptRuntime::new();
//! let program = runtime.compile("scene/main.vs", "let fps = 60;", EvalMode::Program);
//! assert!(program.error.is_none());
//! assert!(runtime.has_program("scene/main.vs"));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

use bytecode_system::Program;
use parser::{parse, CodeGenerator, EvalMode};
use std::collections::HashMap;

/// The engine front door: compiles sources and caches the programs.
#[derive(Debug, Default)]
pub struct ScriptRuntime {
    programs: HashMap<String, Program>,
}

impl ScriptRuntime {
    /// Create an empty runtime.
    pub fn new() -> Self {
        Self::default()
    }

    /// True when a program is cached for `path`.
    pub fn has_program(&self, path: &str) -> bool {
        self.programs.contains_key(path)
    }

    /// Borrow the cached program for `path`.
    pub fn get_program(&self, path: &str) -> Option<&Program> {
        self.programs.get(path)
    }

    /// Compile `source` for `path`, replacing any cached program.
    ///
    /// The returned program carries a terminal error instead of
    /// instructions when parsing or generation failed; callers must treat
    /// such a program as non-executable.
    pub fn compile(&mut self, path: &str, source: &str, mode: EvalMode) -> &Program {
        self.programs.remove(path);
        let mut program = Program::new(path);
        let ast = parse(source, mode);
        match ast.error() {
            Some(error) => {
                program.error = Some(error);
            }
            None => {
                if let Err(error) = CodeGenerator::new().resolve(source, &ast, &mut program) {
                    program.error = Some(error);
                }
            }
        }
        self.programs.entry(path.to_string()).or_insert(program)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_caches_program() {
        let mut runtime = ScriptRuntime::new();
        let program = runtime.compile("a.vs", "1 + 1;", EvalMode::Program);
        assert!(program.error.is_none());
        assert!(!program.is_empty());
        assert!(runtime.has_program("a.vs"));
        assert!(runtime.get_program("a.vs").is_some());
        assert!(runtime.get_program("b.vs").is_none());
    }

    #[test]
    fn test_parse_error_is_terminal() {
        let mut runtime = ScriptRuntime::new();
        let program = runtime.compile("bad.vs", "let = ;", EvalMode::Program);
        let error = program.error.as_ref().expect("terminal error");
        assert!(error.message.contains("Invalid or unexpected token"));
        assert!(program.is_empty());
    }

    #[test]
    fn test_generation_error_is_terminal() {
        let mut runtime = ScriptRuntime::new();
        let program = runtime.compile("bad.vs", "function f() { yield 1; }", EvalMode::Program);
        assert!(program.error.is_some());
    }

    #[test]
    fn test_recompilation_replaces_cached_program() {
        let mut runtime = ScriptRuntime::new();
        runtime.compile("a.vs", "1;", EvalMode::Program);
        let first_len = runtime.get_program("a.vs").unwrap().len();
        runtime.compile("a.vs", "1; 2; 3;", EvalMode::Program);
        let second_len = runtime.get_program("a.vs").unwrap().len();
        assert!(second_len > first_len);
    }

    #[test]
    fn test_failed_recompilation_replaces_good_program() {
        let mut runtime = ScriptRuntime::new();
        runtime.compile("a.vs", "1;", EvalMode::Program);
        assert!(runtime.get_program("a.vs").unwrap().error.is_none());
        runtime.compile("a.vs", "let = ;", EvalMode::Program);
        assert!(runtime.get_program("a.vs").unwrap().error.is_some());
    }
}
