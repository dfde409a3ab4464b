//! The compiled program container.
//!
//! A [`Program`] is the artifact produced by one compilation: the constant
//! string pool, the instruction stream, the diagnostic frame-site table for
//! call instructions, and the terminal error when compilation failed.

use crate::instruction::{Instruction, Operand};
use core_types::{ScriptError, SourcePosition};
use std::collections::BTreeMap;

/// Diagnostic descriptor recorded at a call-site instruction.
///
/// The VM resolves the callee's display name lazily at call time; the site
/// only pins the source position and file so nested failures can report a
/// readable call chain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameSite {
    /// Position of the call in the source buffer
    pub position: SourcePosition,
    /// Path the program was compiled from
    pub filename: String,
}

/// A compiled program.
///
/// Invariant: once code generation for a construct completes, every address
/// operand in `instructions` is a valid instruction index (backpatches never
/// escape the generator unresolved).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    /// Source path the program was compiled from
    pub path: String,
    /// Deduplicated constant string pool
    pub constants: Vec<String>,
    /// The instruction stream; jump operands are instruction indices
    pub instructions: Vec<Instruction>,
    /// Frame sites keyed by the instruction index of the call opcode
    pub frames: BTreeMap<usize, FrameSite>,
    /// Terminal error; a program carrying one is not executable
    pub error: Option<ScriptError>,
}

impl Program {
    /// Create an empty program for a source path.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    /// Number of instructions in the stream.
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// True when no instructions have been emitted.
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Append an instruction, returning its index.
    pub fn emit(&mut self, instruction: Instruction) -> usize {
        let index = self.instructions.len();
        self.instructions.push(instruction);
        index
    }

    /// Intern a string into the constant pool, returning its index.
    ///
    /// The pool is scanned for an existing entry first, so equal strings
    /// share one slot.
    pub fn resolve_constant(&mut self, constant: &str) -> u32 {
        for (index, existing) in self.constants.iter().enumerate() {
            if existing == constant {
                return index as u32;
            }
        }
        self.constants.push(constant.to_string());
        (self.constants.len() - 1) as u32
    }

    /// Overwrite the address operand of the instruction at `at`.
    ///
    /// # Panics
    ///
    /// Panics if the instruction does not carry an address operand; a
    /// misdirected patch is a code generator bug.
    pub fn patch_address(&mut self, at: usize, target: usize) {
        match &mut self.instructions[at].operand {
            Operand::Address(slot) => *slot = target,
            other => panic!(
                "patch target {:?} at {} is not an address operand",
                other, at
            ),
        }
    }

    /// Record a diagnostic frame site for the call instruction at `at`.
    pub fn record_frame(&mut self, at: usize, position: SourcePosition) {
        self.frames.insert(
            at,
            FrameSite {
                position,
                filename: self.path.clone(),
            },
        );
    }

    /// Serialize the instruction stream to little-endian u16 words.
    ///
    /// This is the final flattening pass; the in-memory stream stays
    /// index-addressed until a caller needs the flat form.
    pub fn to_words(&self) -> Vec<u16> {
        let mut words = Vec::new();
        for instruction in &self.instructions {
            instruction.encode_into(&mut words);
        }
        words
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opcode::Opcode;

    #[test]
    fn test_constant_dedup() {
        let mut program = Program::new("test.vs");
        let a = program.resolve_constant("x");
        let b = program.resolve_constant("y");
        let c = program.resolve_constant("x");
        assert_eq!(a, c);
        assert_ne!(a, b);
        assert_eq!(program.constants.len(), 2);
    }

    #[test]
    fn test_emit_returns_indices() {
        let mut program = Program::new("test.vs");
        assert_eq!(program.emit(Instruction::plain(Opcode::True)), 0);
        assert_eq!(program.emit(Instruction::plain(Opcode::Pop)), 1);
        assert_eq!(program.len(), 2);
    }

    #[test]
    fn test_patch_address() {
        let mut program = Program::new("test.vs");
        let jump = program.emit(Instruction::with_operand(Opcode::Jump, Operand::Address(0)));
        program.emit(Instruction::plain(Opcode::Halt));
        program.patch_address(jump, 2);
        assert_eq!(
            program.instructions[jump].operand,
            Operand::Address(2)
        );
    }

    #[test]
    #[should_panic]
    fn test_patch_non_address_panics() {
        let mut program = Program::new("test.vs");
        program.emit(Instruction::plain(Opcode::Pop));
        program.patch_address(0, 1);
    }

    #[test]
    fn test_to_words_concatenates_encodings() {
        let mut program = Program::new("test.vs");
        program.emit(Instruction::plain(Opcode::True));
        program.emit(Instruction::with_operand(Opcode::Jump, Operand::Address(0)));
        assert_eq!(program.to_words().len(), 1 + 5);
    }

    #[test]
    fn test_record_frame_uses_program_path() {
        let mut program = Program::new("scene/update.vs");
        let call = program.emit(Instruction::plain(Opcode::Call));
        program.record_frame(call, SourcePosition::default());
        assert_eq!(program.frames[&call].filename, "scene/update.vs");
    }
}
