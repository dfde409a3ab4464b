//! Golden round-trip tests for the textual dump format.

use bytecode_system::{assemble, disassemble, Instruction, Opcode, Operand, Program};
use core_types::SourcePosition;

fn corpus() -> Vec<Program> {
    let mut simple = Program::new("simple.vs");
    simple.emit(Instruction::with_operand(Opcode::Push, Operand::Number(1.0)));
    simple.emit(Instruction::with_operand(Opcode::Push, Operand::Number(2.0)));
    simple.emit(Instruction::plain(Opcode::Add));
    simple.emit(Instruction::plain(Opcode::Halt));

    let mut named = Program::new("named.vs");
    let var = named.resolve_constant("counter");
    named.emit(Instruction::with_operand(Opcode::Var, Operand::Constant(var)));
    named.emit(Instruction::with_operand(Opcode::Push, Operand::Number(0.0)));
    named.emit(Instruction::with_operand(Opcode::Store, Operand::Constant(var)));
    named.emit(Instruction::plain(Opcode::Pop));
    named.emit(Instruction::plain(Opcode::Halt));

    let mut branchy = Program::new("branchy.vs");
    branchy.emit(Instruction::plain(Opcode::True));
    let jump = branchy.emit(Instruction::with_operand(
        Opcode::JumpIfFalse,
        Operand::Address(0),
    ));
    branchy.emit(Instruction::plain(Opcode::Pop));
    let call = branchy.emit(Instruction::plain(Opcode::Call));
    branchy.record_frame(
        call,
        SourcePosition {
            line: 2,
            column: 8,
            offset: 31,
        },
    );
    let end = branchy.emit(Instruction::plain(Opcode::Halt));
    branchy.patch_address(jump, end);

    vec![simple, named, branchy]
}

#[test]
fn test_corpus_round_trips_word_identical() {
    for program in corpus() {
        let dump = disassemble(&program);
        let reassembled = assemble(&dump).unwrap();
        assert_eq!(
            reassembled.to_words(),
            program.to_words(),
            "word stream drifted for {}",
            program.path
        );
        assert_eq!(reassembled.constants, program.constants);
        assert_eq!(reassembled.frames, program.frames);
    }
}

#[test]
fn test_dump_is_deterministic() {
    for program in corpus() {
        assert_eq!(disassemble(&program), disassemble(&program));
    }
}

#[test]
fn test_dump_lists_one_instruction_per_line() {
    let program = &corpus()[0];
    let dump = disassemble(program);
    let code_lines = dump
        .lines()
        .skip_while(|line| *line != "[.section code]")
        .skip(1)
        .take_while(|line| !line.starts_with("[.section"))
        .count();
    assert_eq!(code_lines, program.len());
}
