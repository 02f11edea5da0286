//! Instruction decoder for the ZEV machine.
//!
//! A word is a list of bit-string tokens. The first token is the opcode,
//! the rest are operands whose meaning depends on the opcode:
//!
//! | opcode | mnemonic | operands                    |
//! |--------|----------|-----------------------------|
//! | 0      | MOV      | dst, addr [, imm]           |
//! | 1      | ADD      | src1, src2, dst             |
//! | 2      | SUB      | src1, src2, dst             |
//! | 3      | MUL      | src1, src2, dst             |
//! | 4      | DIV      | src1, src2, dst             |
//! | 5      | OUT      | src                         |
//! | 15     | EXIT     | code                        |

use std::fmt;
use serde::{Serialize, Deserialize};
use thiserror::Error;
use crate::binary::{decode_unsigned, encode_unsigned, Bits, CodecError};
use crate::cpu::memory::{Address, Word};

/// Opcode values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Opcode {
    Mov = 0,
    Add = 1,
    Sub = 2,
    Mul = 3,
    Div = 4,
    Out = 5,
    Exit = 15,
}

impl Opcode {
    pub const ALL: [Opcode; 7] = [
        Opcode::Mov,
        Opcode::Add,
        Opcode::Sub,
        Opcode::Mul,
        Opcode::Div,
        Opcode::Out,
        Opcode::Exit,
    ];

    pub fn from_u64(value: u64) -> Option<Self> {
        Self::ALL.into_iter().find(|op| *op as u64 == value)
    }

    #[inline]
    pub fn value(self) -> u64 {
        self as u64
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Mov => "MOV",
            Opcode::Add => "ADD",
            Opcode::Sub => "SUB",
            Opcode::Mul => "MUL",
            Opcode::Div => "DIV",
            Opcode::Out => "OUT",
            Opcode::Exit => "EXIT",
        }
    }

    /// Accepted operand counts, lowest first.
    pub fn arity(self) -> &'static [usize] {
        match self {
            Opcode::Mov => &[2, 3],
            Opcode::Add | Opcode::Sub | Opcode::Mul | Opcode::Div => &[3],
            Opcode::Out | Opcode::Exit => &[1],
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// Where MOV takes its value from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MovSource {
    /// Store the bit-string itself.
    Immediate(Bits),
    /// Store the first token of the word at this address.
    Address(Address),
}

/// Decoded ZEV instruction.
///
/// Register operands stay as raw indices; the CPU checks them against its
/// own register count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Instruction {
    /// dst := imm, or dst := first token of [addr]
    Mov { dst: u64, src: MovSource },

    /// dst := src1 + src2
    Add { lhs: u64, rhs: u64, dst: u64 },

    /// dst := src1 - src2 (may be negative)
    Sub { lhs: u64, rhs: u64, dst: u64 },

    /// dst := src1 * src2
    Mul { lhs: u64, rhs: u64, dst: u64 },

    /// dst := src1 / src2, truncated
    Div { lhs: u64, rhs: u64, dst: u64 },

    /// Emit src on the serial port
    Out { src: u64 },

    /// Halt with an exit status
    Exit { code: u64 },
}

impl Instruction {
    pub fn opcode(&self) -> Opcode {
        match self {
            Instruction::Mov { .. } => Opcode::Mov,
            Instruction::Add { .. } => Opcode::Add,
            Instruction::Sub { .. } => Opcode::Sub,
            Instruction::Mul { .. } => Opcode::Mul,
            Instruction::Div { .. } => Opcode::Div,
            Instruction::Out { .. } => Opcode::Out,
            Instruction::Exit { .. } => Opcode::Exit,
        }
    }
}

/// Decode just the opcode token of a word.
pub fn decode_opcode(word: &Word) -> Result<Opcode, DecodeError> {
    let first = word.first().ok_or(DecodeError::EmptyWord)?;
    let value = decode_unsigned(first.as_str())?;
    Opcode::from_u64(value).ok_or(DecodeError::InvalidOpcode(value))
}

/// Decode a word into an instruction.
pub fn decode(word: &Word) -> Result<Instruction, DecodeError> {
    let opcode = decode_opcode(word)?;
    let ops = word.operands();

    if !opcode.arity().contains(&ops.len()) {
        return Err(DecodeError::ArityMismatch {
            opcode,
            expected: opcode.arity(),
            found: ops.len(),
        });
    }

    let field = |i: usize| decode_unsigned(ops[i].as_str());

    let instruction = match opcode {
        Opcode::Mov => {
            let dst = field(0)?;
            let src = match ops.get(2) {
                Some(imm) => MovSource::Immediate(imm.clone()),
                None => MovSource::Address(Address(field(1)?)),
            };
            Instruction::Mov { dst, src }
        }
        Opcode::Add => Instruction::Add { lhs: field(0)?, rhs: field(1)?, dst: field(2)? },
        Opcode::Sub => Instruction::Sub { lhs: field(0)?, rhs: field(1)?, dst: field(2)? },
        Opcode::Mul => Instruction::Mul { lhs: field(0)?, rhs: field(1)?, dst: field(2)? },
        Opcode::Div => Instruction::Div { lhs: field(0)?, rhs: field(1)?, dst: field(2)? },
        Opcode::Out => Instruction::Out { src: field(0)? },
        Opcode::Exit => Instruction::Exit { code: field(0)? },
    };

    Ok(instruction)
}

/// Encode an instruction into a word, padding numeric fields to `width`.
pub fn encode(instr: &Instruction, width: usize) -> Word {
    let num = |v: u64| encode_unsigned(v, width);
    let mut tokens = vec![num(instr.opcode().value())];

    match instr {
        Instruction::Mov { dst, src } => {
            tokens.push(num(*dst));
            match src {
                MovSource::Immediate(imm) => {
                    tokens.push(num(0));
                    tokens.push(imm.clone());
                }
                MovSource::Address(addr) => tokens.push(num(addr.slot())),
            }
        }
        Instruction::Add { lhs, rhs, dst }
        | Instruction::Sub { lhs, rhs, dst }
        | Instruction::Mul { lhs, rhs, dst }
        | Instruction::Div { lhs, rhs, dst } => {
            tokens.extend([num(*lhs), num(*rhs), num(*dst)]);
        }
        Instruction::Out { src } => tokens.push(num(*src)),
        Instruction::Exit { code } => tokens.push(num(*code)),
    }

    Word::new(tokens)
}

/// Errors that can occur during instruction decoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("empty word")]
    EmptyWord,

    #[error("invalid opcode: {0}")]
    InvalidOpcode(u64),

    #[error("{opcode} takes {expected:?} operands, found {found}")]
    ArityMismatch {
        opcode: Opcode,
        expected: &'static [usize],
        found: usize,
    },

    #[error("malformed operand: {0}")]
    Operand(#[from] CodecError),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(s: &str) -> Word {
        Word::parse(s).unwrap()
    }

    #[test]
    fn test_decode_mov_immediate() {
        let instr = decode(&word("0000 0001 0000 0111")).unwrap();
        assert_eq!(instr, Instruction::Mov {
            dst: 1,
            src: MovSource::Immediate(Bits::parse("0111").unwrap()),
        });
    }

    #[test]
    fn test_decode_mov_address() {
        let instr = decode(&word("0000 0010 1001")).unwrap();
        assert_eq!(instr, Instruction::Mov { dst: 2, src: MovSource::Address(Address(9)) });
    }

    #[test]
    fn test_decode_arith() {
        let instr = decode(&word("0001 0000 0001 0010")).unwrap();
        assert_eq!(instr, Instruction::Add { lhs: 0, rhs: 1, dst: 2 });
        let instr = decode(&word("0100 0000 0001 0010")).unwrap();
        assert_eq!(instr, Instruction::Div { lhs: 0, rhs: 1, dst: 2 });
    }

    #[test]
    fn test_decode_exit() {
        assert_eq!(decode(&word("1111 0011")).unwrap(), Instruction::Exit { code: 3 });
    }

    #[test]
    fn test_invalid_opcode() {
        assert_eq!(decode(&word("0110 0001")), Err(DecodeError::InvalidOpcode(6)));
    }

    #[test]
    fn test_arity_mismatch() {
        let err = decode(&word("0001 0000 0001")).unwrap_err();
        assert_eq!(err, DecodeError::ArityMismatch {
            opcode: Opcode::Add,
            expected: &[3],
            found: 2,
        });
        assert!(matches!(decode(&word("0101 0001 0001")), Err(DecodeError::ArityMismatch { .. })));
    }

    #[test]
    fn test_encode_layout() {
        let instr = Instruction::Mov {
            dst: 0,
            src: MovSource::Immediate(Bits::parse("0111").unwrap()),
        };
        assert_eq!(encode(&instr, 4), word("0000 0000 0000 0111"));
        assert_eq!(encode(&Instruction::Exit { code: 0 }, 4), word("1111 0000"));
    }

    #[test]
    fn test_encode_decode_roundtrip() {
        let cases = [
            Instruction::Mov { dst: 7, src: MovSource::Address(Address(12)) },
            Instruction::Sub { lhs: 1, rhs: 2, dst: 3 },
            Instruction::Out { src: 5 },
            Instruction::Exit { code: 1 },
        ];
        for instr in cases {
            assert_eq!(decode(&encode(&instr, 4)).unwrap(), instr);
        }
    }
}
