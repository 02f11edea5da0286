//! Assembler for ZEV programs.
//!
//! Syntax:
//! ```text
//! # Comment
//! MOV    reg0    $7      # reg0 := 7
//! MOV    reg1    0x9     # reg1 := first token of the word at 0x9
//! ADD    reg0    reg1    reg2
//! OUT    reg2
//! EXIT   $0
//!
//! ORG    0x9             # place what follows at slot 9
//! DAT    $42             # one-token data word
//! ```
//!
//! Tokens are separated by spaces or by tabs. A single line must not mix
//! the two, but different lines may use different separators.

use std::collections::HashSet;
use thiserror::Error;
use tracing::debug;
use crate::binary::encode_unsigned;
use crate::config::DEFAULT_TOKEN_WIDTH;
use crate::cpu::decode::{encode, Instruction, MovSource, Opcode};
use crate::cpu::memory::{Address, Word, FIRST_SLOT};
use crate::asm::Program;

/// Assemble source code with the canonical 4-bit token width.
pub fn assemble(source: &str) -> Result<Program, AssemblerError> {
    assemble_with_width(source, DEFAULT_TOKEN_WIDTH)
}

/// Assemble source code, padding numeric tokens to `width` bits.
pub fn assemble_with_width(source: &str, width: usize) -> Result<Program, AssemblerError> {
    let mut asm = Assembler::new(width);
    asm.assemble(source)?;
    debug!(words = asm.output.len(), "assembled program");
    Ok(asm.output)
}

/// A parsed operand token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operand {
    /// `regN` / `idxN`
    Register(u64),
    /// `$N`
    Immediate(u64),
    /// `0xN`
    Address(u64),
}

/// The assembler state.
struct Assembler {
    /// Token width in bits.
    width: usize,
    /// Slot the next word is placed at; `None` past the last slot.
    current_slot: Option<u64>,
    /// Slots already written.
    placed: HashSet<Address>,
    output: Program,
}

impl Assembler {
    fn new(width: usize) -> Self {
        Self {
            width,
            current_slot: Some(FIRST_SLOT),
            placed: HashSet::new(),
            output: Program::new(),
        }
    }

    fn assemble(&mut self, source: &str) -> Result<(), AssemblerError> {
        for (line_num, line) in source.lines().enumerate() {
            let tokens = tokenize(line, line_num + 1)?;
            if !tokens.is_empty() {
                self.process_line(&tokens, line_num + 1)?;
            }
        }
        Ok(())
    }

    fn process_line(&mut self, tokens: &[&str], line_num: usize) -> Result<(), AssemblerError> {
        let head = tokens[0];

        // A lone immediate is a data word
        if head.starts_with('$') {
            return match self.parse_operands(tokens, line_num)?.as_slice() {
                [Operand::Immediate(v)] => self.emit(Word::new(vec![encode_unsigned(*v, self.width)]), line_num),
                _ => Err(AssemblerError::OperandMismatch {
                    line: line_num,
                    mnemonic: "DAT".into(),
                    expected: "a single $imm",
                }),
            };
        }

        let mnemonic = head.to_uppercase();
        let operands = self.parse_operands(&tokens[1..], line_num)?;
        let mismatch = |expected: &'static str| AssemblerError::OperandMismatch {
            line: line_num,
            mnemonic: mnemonic.clone(),
            expected,
        };

        match mnemonic.as_str() {
            // Directives
            "ORG" => match operands.as_slice() {
                // Slot 0 is never fetched
                [Operand::Address(slot)] if *slot >= FIRST_SLOT => {
                    self.current_slot = Some(*slot);
                    Ok(())
                }
                _ => Err(mismatch("0xN, N >= 1")),
            },

            "DAT" | "DATA" => match operands.as_slice() {
                [Operand::Immediate(v)] => self.emit(Word::new(vec![encode_unsigned(*v, self.width)]), line_num),
                _ => Err(mismatch("$imm")),
            },

            // Instructions
            _ => {
                let opcode = parse_mnemonic(&mnemonic).ok_or_else(|| AssemblerError::UnknownMnemonic {
                    line: line_num,
                    mnemonic: head.to_string(),
                })?;
                let instr = self.build_instruction(opcode, &operands).ok_or_else(|| mismatch(expected_operands(opcode)))?;
                let word = encode(&instr, self.width);
                self.emit(word, line_num)
            }
        }
    }

    fn build_instruction(&self, opcode: Opcode, operands: &[Operand]) -> Option<Instruction> {
        use Operand::{Address as Addr, Immediate as Imm, Register as Reg};

        let instr = match (opcode, operands) {
            (Opcode::Mov, [Reg(dst), Imm(v)]) => Instruction::Mov {
                dst: *dst,
                src: MovSource::Immediate(encode_unsigned(*v, self.width)),
            },
            (Opcode::Mov, [Reg(dst), Addr(slot)]) => Instruction::Mov {
                dst: *dst,
                src: MovSource::Address(Address(*slot)),
            },
            (Opcode::Add, [Reg(lhs), Reg(rhs), Reg(dst)]) => Instruction::Add { lhs: *lhs, rhs: *rhs, dst: *dst },
            (Opcode::Sub, [Reg(lhs), Reg(rhs), Reg(dst)]) => Instruction::Sub { lhs: *lhs, rhs: *rhs, dst: *dst },
            (Opcode::Mul, [Reg(lhs), Reg(rhs), Reg(dst)]) => Instruction::Mul { lhs: *lhs, rhs: *rhs, dst: *dst },
            (Opcode::Div, [Reg(lhs), Reg(rhs), Reg(dst)]) => Instruction::Div { lhs: *lhs, rhs: *rhs, dst: *dst },
            (Opcode::Out, [Reg(src)]) => Instruction::Out { src: *src },
            (Opcode::Exit, [Imm(code)]) => Instruction::Exit { code: *code },
            _ => return None,
        };
        Some(instr)
    }

    fn parse_operands(&self, tokens: &[&str], line_num: usize) -> Result<Vec<Operand>, AssemblerError> {
        tokens.iter().map(|t| parse_operand(t, line_num)).collect()
    }

    fn emit(&mut self, word: Word, line_num: usize) -> Result<(), AssemblerError> {
        let addr = self.current_slot
            .map(Address)
            .ok_or(AssemblerError::AddressOutOfRange { line: line_num })?;
        if !self.placed.insert(addr) {
            return Err(AssemblerError::DuplicateAddress { line: line_num, addr: addr.to_string() });
        }
        self.output.push(addr, word);
        self.current_slot = addr.0.checked_add(1);
        Ok(())
    }
}

/// Split a source line into tokens, dropping comments.
///
/// Returns an empty list for blank and comment-only lines.
fn tokenize(line: &str, line_num: usize) -> Result<Vec<&str>, AssemblerError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(Vec::new());
    }

    // A token beginning with '#' starts a trailing comment
    let code_end = line
        .char_indices()
        .find(|&(i, c)| c == '#' && line[..i].ends_with(|p: char| p == ' ' || p == '\t'))
        .map(|(i, _)| i)
        .unwrap_or(line.len());
    let code = line[..code_end].trim_end();

    if code.contains(' ') && code.contains('\t') {
        return Err(AssemblerError::MixedSeparators { line: line_num });
    }

    let separator = if code.contains('\t') { '\t' } else { ' ' };
    Ok(code.split(separator).filter(|t| !t.is_empty()).collect())
}

fn parse_mnemonic(mnemonic: &str) -> Option<Opcode> {
    let opcode = match mnemonic {
        "MOV" => Opcode::Mov,
        "ADD" => Opcode::Add,
        "SUB" => Opcode::Sub,
        "MUL" => Opcode::Mul,
        "DIV" => Opcode::Div,
        "OUT" => Opcode::Out,
        "EXIT" | "EXT" => Opcode::Exit,
        _ => return None,
    };
    Some(opcode)
}

fn expected_operands(opcode: Opcode) -> &'static str {
    match opcode {
        Opcode::Mov => "regN, $imm | 0xN",
        Opcode::Add | Opcode::Sub | Opcode::Mul | Opcode::Div => "regN, regN, regN",
        Opcode::Out => "regN",
        Opcode::Exit => "$imm",
    }
}

fn parse_operand(token: &str, line_num: usize) -> Result<Operand, AssemblerError> {
    let lower = token.to_ascii_lowercase();

    let (digits, kind): (&str, fn(u64) -> Operand) = if let Some(rest) = lower.strip_prefix("reg") {
        (rest, Operand::Register)
    } else if let Some(rest) = lower.strip_prefix("idx") {
        (rest, Operand::Register)
    } else if let Some(rest) = lower.strip_prefix('$') {
        (rest, Operand::Immediate)
    } else if let Some(rest) = lower.strip_prefix("0x") {
        (rest, Operand::Address)
    } else {
        return Err(AssemblerError::UnknownOperand { line: line_num, token: token.to_string() });
    };

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AssemblerError::UnknownOperand { line: line_num, token: token.to_string() });
    }

    digits
        .parse::<u64>()
        .map(kind)
        .map_err(|_| AssemblerError::ValueOutOfRange { line: line_num, token: token.to_string() })
}

/// Errors that can occur during assembly.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssemblerError {
    #[error("syntax error on line {line}: tabs and spaces mixed as separators")]
    MixedSeparators { line: usize },

    #[error("unknown mnemonic on line {line}: {mnemonic}")]
    UnknownMnemonic { line: usize, mnemonic: String },

    #[error("unrecognized operand on line {line}: {token}")]
    UnknownOperand { line: usize, token: String },

    #[error("bad operands for {mnemonic} on line {line}: expected {expected}")]
    OperandMismatch { line: usize, mnemonic: String, expected: &'static str },

    #[error("value out of range on line {line}: {token}")]
    ValueOutOfRange { line: usize, token: String },

    #[error("no address left for the word on line {line}")]
    AddressOutOfRange { line: usize },

    #[error("address {addr} written twice (line {line})")]
    DuplicateAddress { line: usize, addr: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(s: &str) -> Word {
        Word::parse(s).unwrap()
    }

    #[test]
    fn test_assemble_simple() {
        let source = "\
# add two numbers
MOV    reg0    $7
MOV    reg1    $3
ADD    reg0    reg1    reg2
OUT    reg2
EXIT   $0
";
        let program = assemble(source).unwrap();
        assert_eq!(program.len(), 5);
        assert_eq!(program.words()[0], (Address(1), word("0000 0000 0000 0111")));
        assert_eq!(program.words()[2], (Address(3), word("0001 0000 0001 0010")));
        assert_eq!(program.words()[3], (Address(4), word("0101 0010")));
        assert_eq!(program.words()[4], (Address(5), word("1111 0000")));
    }

    #[test]
    fn test_tabs_per_line() {
        let source = "MOV\treg0\t$1\nOUT    reg0\n";
        let program = assemble(source).unwrap();
        assert_eq!(program.len(), 2);
    }

    #[test]
    fn test_mixed_separators_rejected() {
        let source = "OUT reg0\nMOV\treg0 $1\n";
        assert_eq!(assemble(source), Err(AssemblerError::MixedSeparators { line: 2 }));
    }

    #[test]
    fn test_trailing_comment_may_contain_spaces() {
        let program = assemble("OUT\treg0\t# print the first register").unwrap();
        assert_eq!(program.words()[0].1, word("0101 0000"));
    }

    #[test]
    fn test_mov_from_address() {
        let program = assemble("MOV reg2 0x9").unwrap();
        assert_eq!(program.words()[0].1, word("0000 0010 1001"));
    }

    #[test]
    fn test_idx_alias_and_ext() {
        let program = assemble("OUT idx3\nEXT $1").unwrap();
        assert_eq!(program.words()[0].1, word("0101 0011"));
        assert_eq!(program.words()[1].1, word("1111 0001"));
    }

    #[test]
    fn test_org_and_data() {
        let source = "\
MOV reg0 0x10
EXIT $0
ORG 0x10
DAT $42
$5
";
        let program = assemble(source).unwrap();
        assert_eq!(program.words()[2], (Address(10), word("101010")));
        assert_eq!(program.words()[3], (Address(11), word("0101")));
    }

    #[test]
    fn test_duplicate_address() {
        let source = "OUT reg0\nORG 0x1\nOUT reg1";
        assert!(matches!(assemble(source), Err(AssemblerError::DuplicateAddress { line: 3, .. })));
    }

    #[test]
    fn test_last_slot() {
        let program = assemble("ORG 0x18446744073709551615\nDAT $1").unwrap();
        assert_eq!(program.words()[0].0, Address(u64::MAX));

        let err = assemble("ORG 0x18446744073709551615\nDAT $1\nDAT $2").unwrap_err();
        assert_eq!(err, AssemblerError::AddressOutOfRange { line: 3 });

        // ORG resets the position after running off the end
        let program = assemble("ORG 0x18446744073709551615\nDAT $1\nORG 0x1\nDAT $2").unwrap();
        assert_eq!(program.words()[1].0, Address(1));
    }

    #[test]
    fn test_org_zero_rejected() {
        assert!(matches!(
            assemble("ORG 0x0\nDAT $1"),
            Err(AssemblerError::OperandMismatch { line: 1, .. })
        ));
    }

    #[test]
    fn test_unknown_mnemonic() {
        let err = assemble("JMP 0x1").unwrap_err();
        assert_eq!(err, AssemblerError::UnknownMnemonic { line: 1, mnemonic: "JMP".into() });
    }

    #[test]
    fn test_operand_shape_checked() {
        assert!(matches!(assemble("ADD reg0 reg1"), Err(AssemblerError::OperandMismatch { .. })));
        assert!(matches!(assemble("OUT $1"), Err(AssemblerError::OperandMismatch { .. })));
        assert!(matches!(assemble("EXIT reg0"), Err(AssemblerError::OperandMismatch { .. })));
    }

    #[test]
    fn test_bad_operand_tokens() {
        assert!(matches!(assemble("OUT reg-1"), Err(AssemblerError::UnknownOperand { .. })));
        assert!(matches!(assemble("OUT r1"), Err(AssemblerError::UnknownOperand { .. })));
        assert!(matches!(
            assemble("EXIT $99999999999999999999999"),
            Err(AssemblerError::ValueOutOfRange { .. })
        ));
    }

    #[test]
    fn test_out_of_range_register_still_assembles() {
        // Range checks belong to the CPU, which knows its register count
        let program = assemble("OUT reg8").unwrap();
        assert_eq!(program.words()[0].1, word("0101 1000"));
    }
}
