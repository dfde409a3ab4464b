//! Tests for instruction stream construction and serialization.

use bytecode_system::{Instruction, Opcode, Operand, Program};

#[test]
fn test_program_creation() {
    let program = Program::new("empty.vs");
    assert_eq!(program.path, "empty.vs");
    assert!(program.is_empty());
    assert!(program.constants.is_empty());
    assert!(program.error.is_none());
}

#[test]
fn test_every_opcode_encodes_and_decodes() {
    let mut program = Program::new("all.vs");
    program.resolve_constant("name");
    for opcode in Opcode::ALL {
        let operand = match opcode.operand_kind() {
            bytecode_system::OperandKind::None => Operand::None,
            bytecode_system::OperandKind::Number => Operand::Number(3.5),
            bytecode_system::OperandKind::Index => Operand::Index(2),
            bytecode_system::OperandKind::Constant => Operand::Constant(0),
            bytecode_system::OperandKind::Address => Operand::Address(11),
        };
        program.emit(Instruction::with_operand(opcode, operand));
    }
    let words = program.to_words();
    let mut cursor = 0;
    let mut decoded = Vec::new();
    while cursor < words.len() {
        let (instruction, consumed) = Instruction::decode(&words[cursor..]).unwrap();
        decoded.push(instruction);
        cursor += consumed;
    }
    assert_eq!(decoded, program.instructions);
}

#[test]
fn test_word_stream_is_stable() {
    let mut program = Program::new("stable.vs");
    let idx = program.resolve_constant("x");
    program.emit(Instruction::with_operand(Opcode::Push, Operand::Number(1.0)));
    program.emit(Instruction::with_operand(Opcode::Store, Operand::Constant(idx)));
    program.emit(Instruction::plain(Opcode::Halt));
    assert_eq!(program.to_words(), program.clone().to_words());
}

#[test]
fn test_backpatched_addresses_stay_in_bounds() {
    let mut program = Program::new("jumps.vs");
    let jump = program.emit(Instruction::with_operand(Opcode::Jump, Operand::Address(0)));
    program.emit(Instruction::plain(Opcode::True));
    program.emit(Instruction::plain(Opcode::Pop));
    let end = program.emit(Instruction::plain(Opcode::Halt));
    program.patch_address(jump, end);

    for instruction in &program.instructions {
        if let Operand::Address(target) = instruction.operand {
            assert!(target <= program.len());
        }
    }
}
