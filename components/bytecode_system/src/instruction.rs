//! Instructions and their word-level encoding.
//!
//! During code generation the instruction stream is an in-memory
//! `Vec<Instruction>`; jump operands hold instruction indices, so a patched
//! target always lands on an instruction boundary. Serialization to a flat
//! little-endian u16 word stream is a final pass: one word for the opcode,
//! two words for a u32 operand, four words for a u64 address or an f64
//! number.

use crate::opcode::Opcode;

/// The operand shape an opcode carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandKind {
    /// No operand
    None,
    /// An f64 immediate (number literals, 4 words)
    Number,
    /// A u32 immediate (stack depths, argument counts, 2 words)
    Index,
    /// A u32 constant pool index (2 words)
    Constant,
    /// A u64 instruction index (jump targets and entry points, 4 words)
    Address,
}

/// A decoded operand value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Operand {
    /// No operand
    None,
    /// f64 immediate
    Number(f64),
    /// u32 immediate
    Index(u32),
    /// Constant pool index
    Constant(u32),
    /// Instruction index
    Address(usize),
}

impl Operand {
    /// The shape of this operand.
    pub fn kind(&self) -> OperandKind {
        match self {
            Operand::None => OperandKind::None,
            Operand::Number(_) => OperandKind::Number,
            Operand::Index(_) => OperandKind::Index,
            Operand::Constant(_) => OperandKind::Constant,
            Operand::Address(_) => OperandKind::Address,
        }
    }
}

/// One instruction: an opcode paired with its operand.
///
/// The pairing is validated at construction; an instruction whose operand
/// shape disagrees with [`Opcode::operand_kind`] cannot be built through
/// the public constructors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Instruction {
    /// The operator
    pub opcode: Opcode,
    /// The operand, matching `opcode.operand_kind()`
    pub operand: Operand,
}

impl Instruction {
    /// Build an operand-less instruction.
    ///
    /// # Panics
    ///
    /// Panics if `opcode` requires an operand; that is a code generator
    /// bug, not an input error.
    pub fn plain(opcode: Opcode) -> Self {
        assert_eq!(opcode.operand_kind(), OperandKind::None);
        Self {
            opcode,
            operand: Operand::None,
        }
    }

    /// Build an instruction with its operand.
    ///
    /// # Panics
    ///
    /// Panics if the operand shape disagrees with the opcode.
    pub fn with_operand(opcode: Opcode, operand: Operand) -> Self {
        assert_eq!(opcode.operand_kind(), operand.kind());
        Self { opcode, operand }
    }

    /// Number of u16 words this instruction serializes to.
    pub fn word_len(&self) -> usize {
        match self.operand.kind() {
            OperandKind::None => 1,
            OperandKind::Index | OperandKind::Constant => 3,
            OperandKind::Number | OperandKind::Address => 5,
        }
    }

    /// Append the serialized form to a word stream.
    pub fn encode_into(&self, words: &mut Vec<u16>) {
        words.push(self.opcode as u16);
        match self.operand {
            Operand::None => {}
            Operand::Index(value) | Operand::Constant(value) => {
                words.push((value & 0xffff) as u16);
                words.push((value >> 16) as u16);
            }
            Operand::Address(value) => {
                let raw = value as u64;
                for shift in [0u32, 16, 32, 48] {
                    words.push(((raw >> shift) & 0xffff) as u16);
                }
            }
            Operand::Number(value) => {
                let raw = value.to_bits();
                for shift in [0u32, 16, 32, 48] {
                    words.push(((raw >> shift) & 0xffff) as u16);
                }
            }
        }
    }

    /// Decode one instruction from the front of a word stream, returning
    /// it together with the number of words consumed.
    pub fn decode(words: &[u16]) -> Result<(Instruction, usize), String> {
        let Some(&tag) = words.first() else {
            return Err("empty word stream".to_string());
        };
        let Some(opcode) = Opcode::from_u16(tag) else {
            return Err(format!("unknown opcode word: {}", tag));
        };
        let read_u32 = |at: usize| -> Result<u32, String> {
            if words.len() < at + 2 {
                return Err(format!("truncated operand for {}", opcode.mnemonic()));
            }
            Ok(words[at] as u32 | (words[at + 1] as u32) << 16)
        };
        let read_u64 = |at: usize| -> Result<u64, String> {
            if words.len() < at + 4 {
                return Err(format!("truncated operand for {}", opcode.mnemonic()));
            }
            let mut raw = 0u64;
            for (slot, word) in words[at..at + 4].iter().enumerate() {
                raw |= (*word as u64) << (16 * slot);
            }
            Ok(raw)
        };
        let operand = match opcode.operand_kind() {
            OperandKind::None => Operand::None,
            OperandKind::Index => Operand::Index(read_u32(1)?),
            OperandKind::Constant => Operand::Constant(read_u32(1)?),
            OperandKind::Address => Operand::Address(read_u64(1)? as usize),
            OperandKind::Number => Operand::Number(f64::from_bits(read_u64(1)?)),
        };
        let instruction = Instruction { opcode, operand };
        let consumed = instruction.word_len();
        Ok((instruction, consumed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_len() {
        assert_eq!(Instruction::plain(Opcode::Pop).word_len(), 1);
        assert_eq!(
            Instruction::with_operand(Opcode::Load, Operand::Constant(1)).word_len(),
            3
        );
        assert_eq!(
            Instruction::with_operand(Opcode::Jump, Operand::Address(9)).word_len(),
            5
        );
        assert_eq!(
            Instruction::with_operand(Opcode::Push, Operand::Number(1.5)).word_len(),
            5
        );
    }

    #[test]
    fn test_encode_decode_round_trip() {
        let samples = [
            Instruction::plain(Opcode::Begin),
            Instruction::with_operand(Opcode::Push, Operand::Number(-0.5)),
            Instruction::with_operand(Opcode::PushValue, Operand::Index(3)),
            Instruction::with_operand(Opcode::Str, Operand::Constant(0x0001_0002)),
            Instruction::with_operand(Opcode::Jump, Operand::Address(0x1_0000_0001)),
        ];
        for sample in samples {
            let mut words = Vec::new();
            sample.encode_into(&mut words);
            let (decoded, consumed) = Instruction::decode(&words).unwrap();
            assert_eq!(decoded, sample);
            assert_eq!(consumed, words.len());
        }
    }

    #[test]
    fn test_decode_rejects_unknown_opcode() {
        assert!(Instruction::decode(&[0xffff]).is_err());
    }

    #[test]
    fn test_decode_rejects_truncated_operand() {
        let mut words = Vec::new();
        Instruction::with_operand(Opcode::Jump, Operand::Address(7)).encode_into(&mut words);
        words.pop();
        assert!(Instruction::decode(&words).is_err());
    }

    #[test]
    #[should_panic]
    fn test_operand_shape_mismatch_panics() {
        Instruction::with_operand(Opcode::Pop, Operand::Index(1));
    }
}
