//! Assembler and disassembler for ZEV programs.
//!
//! This module provides:
//! - An assembler (text → placed memory words)
//! - A disassembler (words → readable text)
//! - The `.zimg` image format for assembled programs

pub mod assembler;
pub mod disasm;
pub mod image;
pub mod program;

pub use assembler::{assemble, assemble_with_width, AssemblerError};
pub use disasm::{disassemble, disassemble_word, disassemble_word_with};
pub use image::{load_image, parse_image, render_image, save_image, ImageError};
pub use program::Program;
