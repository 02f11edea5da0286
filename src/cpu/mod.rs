//! CPU emulation for the ZEV machine.
//!
//! This module implements the complete ZEV architecture:
//! - Sparse word memory addressed by slot (`0x1`, `0x2`, ...)
//! - 8 general purpose registers (configurable), initially empty
//! - 7-instruction set: MOV, ADD, SUB, MUL, DIV, OUT, EXIT

pub mod memory;
pub mod registers;
pub mod decode;
pub mod execute;

pub use memory::{Address, Memory, MemoryError, Word};
pub use registers::{Registers, RegisterError};
pub use decode::{Instruction, MovSource, Opcode, DecodeError};
pub use execute::{Cpu, CpuError, CpuState, ExitStatus};
