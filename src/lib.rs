//! # ZEV Virtual Machine
//!
//! An emulator for ZEV, a tiny register machine whose memory holds words
//! of binary-string tokens.
//!
//! Programs are lists of words placed at addresses `0x1`, `0x2`, ... and
//! executed one word per cycle. Arithmetic works directly on the
//! bit-strings, and `OUT` writes decimal values to a serial port.

pub mod binary;
pub mod config;
pub mod cpu;
pub mod io;
pub mod asm;

#[cfg(feature = "tui")]
pub mod tui;

#[cfg(feature = "wasm")]
pub mod wasm;

// Re-export commonly used types
pub use binary::{Bits, CodecError};
pub use config::{MachineConfig, ConfigError};
pub use cpu::{Address, Cpu, CpuState, CpuError, ExitStatus, Memory, Registers, Instruction, Word};
pub use io::{Serial, ConsoleSerial, CaptureSerial};
pub use asm::{assemble, assemble_with_width, disassemble, AssemblerError, Program, load_image, save_image};

#[cfg(feature = "tui")]
pub use tui::run_debugger;
