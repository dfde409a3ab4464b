//! Deterministic textual bytecode dump and its parser.
//!
//! The dump renders a program as three sections: the constant pool
//! (`[.section text]`), the instruction stream (`[.section code]`, one
//! instruction per line), and the diagnostic frame-site table
//! (`[.section frames]`). [`assemble`] parses the exact same format back,
//! so a fixed corpus of programs can be golden-tested for byte-identical
//! round trips.

use crate::instruction::{Instruction, Operand, OperandKind};
use crate::opcode::Opcode;
use crate::program::{FrameSite, Program};
use core_types::{ErrorKind, ScriptError, SourcePosition};
use std::fmt::Write as _;

/// Render a program to its textual dump.
pub fn disassemble(program: &Program) -> String {
    let mut out = String::new();
    out.push_str("[.section text]\n");
    for (index, constant) in program.constants.iter().enumerate() {
        let _ = writeln!(out, ".{}: \"{}\"", index, escape(constant));
    }
    out.push_str("[.section code]\n");
    for (index, instruction) in program.instructions.iter().enumerate() {
        let _ = write!(out, "{}: {}", index, instruction.opcode.mnemonic());
        match instruction.operand {
            Operand::None => {}
            Operand::Number(value) => {
                let mut buffer = ryu::Buffer::new();
                let _ = write!(out, " {}", buffer.format(value));
            }
            Operand::Index(value) => {
                let _ = write!(out, " {}", value);
            }
            Operand::Constant(value) => {
                let text = program
                    .constants
                    .get(value as usize)
                    .map(|s| escape(s))
                    .unwrap_or_default();
                let _ = write!(out, " \"{}\"", text);
            }
            Operand::Address(value) => {
                let _ = write!(out, " {}", value);
            }
        }
        out.push('\n');
    }
    out.push_str("[.section frames]\n");
    for (index, site) in &program.frames {
        let _ = writeln!(
            out,
            ".{}: \"{}\" {}:{}:{}",
            index,
            escape(&site.filename),
            site.position.line,
            site.position.column,
            site.position.offset
        );
    }
    out
}

/// Parse a textual dump back into a program.
///
/// The path of the returned program is empty; the dump does not carry it.
pub fn assemble(text: &str) -> Result<Program, ScriptError> {
    let mut program = Program::default();
    let mut section = "";
    for (number, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(name) = line.strip_prefix("[.section ").and_then(|s| s.strip_suffix(']')) {
            section = match name {
                "text" | "code" | "frames" => name,
                other => {
                    return Err(syntax(number, format!("unknown section '{}'", other)));
                }
            };
            continue;
        }
        match section {
            "text" => {
                let (index, rest) = split_label(line, number)?;
                if index != program.constants.len() {
                    return Err(syntax(number, "constant indices must be sequential"));
                }
                program.constants.push(parse_string(rest, number)?);
            }
            "code" => {
                let (index, rest) = split_label(line, number)?;
                if index != program.instructions.len() {
                    return Err(syntax(number, "instruction indices must be sequential"));
                }
                program.instructions.push(parse_instruction(
                    rest,
                    &program.constants,
                    number,
                )?);
            }
            "frames" => {
                let (index, rest) = split_label(line, number)?;
                let site = parse_frame(rest, number)?;
                program.frames.insert(index, site);
            }
            _ => {
                return Err(syntax(number, "content before any section header"));
            }
        }
    }
    Ok(program)
}

fn syntax(line: usize, message: impl Into<String>) -> ScriptError {
    ScriptError::new(
        ErrorKind::SyntaxError,
        format!("line {}: {}", line + 1, message.into()),
    )
}

fn split_label(line: &str, number: usize) -> Result<(usize, &str), ScriptError> {
    let Some((label, rest)) = line.split_once(':') else {
        return Err(syntax(number, "missing ':' label"));
    };
    let digits = label.strip_prefix('.').unwrap_or(label);
    let index = digits
        .trim()
        .parse::<usize>()
        .map_err(|_| syntax(number, "label is not a number"))?;
    Ok((index, rest.trim()))
}

fn parse_instruction(
    text: &str,
    constants: &[String],
    number: usize,
) -> Result<Instruction, ScriptError> {
    let (mnemonic, rest) = match text.split_once(' ') {
        Some((m, r)) => (m, r.trim()),
        None => (text, ""),
    };
    let Some(opcode) = Opcode::from_mnemonic(mnemonic) else {
        return Err(syntax(number, format!("unknown mnemonic '{}'", mnemonic)));
    };
    let operand = match opcode.operand_kind() {
        OperandKind::None => Operand::None,
        OperandKind::Number => Operand::Number(
            rest.parse::<f64>()
                .map_err(|_| syntax(number, "bad number operand"))?,
        ),
        OperandKind::Index => Operand::Index(
            rest.parse::<u32>()
                .map_err(|_| syntax(number, "bad index operand"))?,
        ),
        OperandKind::Address => Operand::Address(
            rest.parse::<usize>()
                .map_err(|_| syntax(number, "bad address operand"))?,
        ),
        OperandKind::Constant => {
            let value = parse_string(rest, number)?;
            let index = constants
                .iter()
                .position(|c| *c == value)
                .ok_or_else(|| syntax(number, "operand string missing from text section"))?;
            Operand::Constant(index as u32)
        }
    };
    Ok(Instruction { opcode, operand })
}

fn parse_frame(text: &str, number: usize) -> Result<FrameSite, ScriptError> {
    let Some(quote_end) = text.rfind('"') else {
        return Err(syntax(number, "missing frame filename"));
    };
    let filename = parse_string(&text[..quote_end + 1], number)?;
    let mut parts = text[quote_end + 1..].trim().split(':');
    let mut read = |what: &str| -> Result<usize, ScriptError> {
        parts
            .next()
            .and_then(|p| p.trim().parse::<usize>().ok())
            .ok_or_else(|| syntax(number, format!("bad frame {}", what)))
    };
    let line = read("line")?;
    let column = read("column")?;
    let offset = read("offset")?;
    Ok(FrameSite {
        position: SourcePosition {
            line: line as u32,
            column: column as u32,
            offset,
        },
        filename,
    })
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            other => out.push(other),
        }
    }
    out
}

fn parse_string(text: &str, number: usize) -> Result<String, ScriptError> {
    let trimmed = text.trim();
    let inner = trimmed
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .ok_or_else(|| syntax(number, "expected a quoted string"))?;
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            _ => return Err(syntax(number, "bad escape sequence")),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_program() -> Program {
        let mut program = Program::new("demo.vs");
        let name = program.resolve_constant("total");
        program.emit(Instruction::with_operand(
            Opcode::Push,
            Operand::Number(2.0),
        ));
        program.emit(Instruction::with_operand(Opcode::Load, Operand::Constant(name)));
        program.emit(Instruction::plain(Opcode::Add));
        let call = program.emit(Instruction::plain(Opcode::Call));
        program.record_frame(
            call,
            SourcePosition {
                line: 1,
                column: 4,
                offset: 20,
            },
        );
        program.emit(Instruction::with_operand(Opcode::Jump, Operand::Address(5)));
        program.emit(Instruction::plain(Opcode::Halt));
        program
    }

    #[test]
    fn test_disassemble_format() {
        let dump = disassemble(&sample_program());
        assert!(dump.starts_with("[.section text]\n.0: \"total\"\n[.section code]\n"));
        assert!(dump.contains("0: PUSH 2.0\n"));
        assert!(dump.contains("1: LOAD \"total\"\n"));
        assert!(dump.contains("4: JMP 5\n"));
        assert!(dump.contains("[.section frames]\n.3: \"demo.vs\" 1:4:20\n"));
    }

    #[test]
    fn test_round_trip_is_word_identical() {
        let program = sample_program();
        let reassembled = assemble(&disassemble(&program)).unwrap();
        assert_eq!(reassembled.to_words(), program.to_words());
        assert_eq!(reassembled.constants, program.constants);
        assert_eq!(reassembled.frames, program.frames);
    }

    #[test]
    fn test_escaped_strings_round_trip() {
        let mut program = Program::new("demo.vs");
        let tricky = program.resolve_constant("a\"b\\c\nd\te");
        program.emit(Instruction::with_operand(Opcode::Str, Operand::Constant(tricky)));
        let reassembled = assemble(&disassemble(&program)).unwrap();
        assert_eq!(reassembled.constants, program.constants);
        assert_eq!(reassembled.to_words(), program.to_words());
    }

    #[test]
    fn test_assemble_rejects_unknown_mnemonic() {
        let err = assemble("[.section code]\n0: FROB\n").unwrap_err();
        assert!(err.message.contains("unknown mnemonic"));
    }

    #[test]
    fn test_assemble_rejects_missing_constant() {
        let err = assemble("[.section code]\n0: LOAD \"ghost\"\n").unwrap_err();
        assert!(err.message.contains("missing from text section"));
    }
}
