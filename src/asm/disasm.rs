//! Disassembler for ZEV programs.
//!
//! Converts memory words back to assembler syntax.

use crate::binary::{decode_signed, Bits};
use crate::config::DEFAULT_MIN_INSTRUCTION_LEN;
use crate::cpu::decode::{decode, Instruction, MovSource};
use crate::cpu::memory::Word;
use crate::asm::Program;

/// Disassemble a single word to text.
///
/// Words too short to be instructions are shown as data.
pub fn disassemble_word(word: &Word) -> String {
    disassemble_word_with(word, DEFAULT_MIN_INSTRUCTION_LEN)
}

/// Disassemble a word for a machine that skips words shorter than
/// `min_instruction_len`.
pub fn disassemble_word_with(word: &Word, min_instruction_len: usize) -> String {
    if word.len() < min_instruction_len {
        return match word.first() {
            Some(bits) => format!("DAT {}", format_immediate(bits)),
            None => "???".to_string(),
        };
    }

    match decode(word) {
        Ok(decoded) => format_instruction(&decoded),
        Err(_) => "???".to_string(),
    }
}

/// Disassemble a whole program as an address-annotated listing.
pub fn disassemble(program: &Program) -> String {
    let mut output = String::new();
    output.push_str("; ZEV Disassembly\n");
    output.push_str("; ---------------\n\n");

    for (addr, word) in program.iter() {
        let line = disassemble_word(word);
        output.push_str(&format!("{:>6}: {:<20} ; {}\n", addr.to_string(), line, word));
    }

    output
}

/// Format a decoded instruction as assembly text.
pub fn format_instruction(instr: &Instruction) -> String {
    match instr {
        Instruction::Mov { dst, src: MovSource::Immediate(imm) } => {
            format!("MOV reg{} {}", dst, format_immediate(imm))
        }
        Instruction::Mov { dst, src: MovSource::Address(addr) } => format!("MOV reg{} {}", dst, addr),

        // Arithmetic
        Instruction::Add { lhs, rhs, dst } => format!("ADD reg{} reg{} reg{}", lhs, rhs, dst),
        Instruction::Sub { lhs, rhs, dst } => format!("SUB reg{} reg{} reg{}", lhs, rhs, dst),
        Instruction::Mul { lhs, rhs, dst } => format!("MUL reg{} reg{} reg{}", lhs, rhs, dst),
        Instruction::Div { lhs, rhs, dst } => format!("DIV reg{} reg{} reg{}", lhs, rhs, dst),

        Instruction::Out { src } => format!("OUT reg{}", src),
        Instruction::Exit { code } => format!("EXIT ${}", code),
    }
}

fn format_immediate(bits: &Bits) -> String {
    match decode_signed(bits.as_str()) {
        Ok(value) => format!("${}", value),
        Err(_) => format!("%{}", bits),
    }
}
