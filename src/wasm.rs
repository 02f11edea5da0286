//! WebAssembly bindings for the ZEV machine.
//!
//! This module provides JavaScript-friendly wrappers around the core emulator.

use wasm_bindgen::prelude::*;
use serde_json::json;
use crate::{Cpu, MachineConfig, Program, Word};
use crate::asm::assembler::assemble_with_width;
use crate::asm::disasm::{disassemble_word, disassemble_word_with, format_instruction};
use crate::binary::decode_signed;
use crate::io::CaptureSerial;
use crate::io::serial::format_value;

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// WebAssembly-friendly CPU wrapper.
#[wasm_bindgen]
pub struct WasmCpu {
    cpu: Cpu<CaptureSerial>,
    program: Program,
}

#[wasm_bindgen]
impl WasmCpu {
    /// Create a new canonical CPU instance.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            cpu: Cpu::with_serial(MachineConfig::default(), CaptureSerial::new()),
            program: Program::new(),
        }
    }

    /// Load a program from assembly source code. Returns the word count.
    #[wasm_bindgen]
    pub fn load_asm(&mut self, source: &str) -> Result<usize, JsError> {
        let program = assemble_with_width(source, self.cpu.config().token_width)
            .map_err(|e| JsError::new(&format!("{}", e)))?;

        self.program = program;
        self.reload()?;
        Ok(self.program.len())
    }

    fn reload(&mut self) -> Result<(), JsError> {
        self.cpu.reset();
        self.cpu.serial_mut().clear();
        self.cpu.load_program(&self.program)
            .map_err(|e| JsError::new(&format!("{}", e)))
    }

    /// Step one cycle. Returns the executed instruction, or `DAT` for a
    /// skipped data word.
    #[wasm_bindgen]
    pub fn step(&mut self) -> Result<String, JsError> {
        if !self.cpu.is_running() {
            return Err(JsError::new("CPU is not running"));
        }

        let addr = self.cpu.next_address();
        let executed = self.cpu.step()
            .map_err(|e| JsError::new(&format!("{}", e)))?;

        Ok(match executed {
            Some(instr) => format_instruction(&instr),
            None => {
                let min_len = self.cpu.config().min_instruction_len;
                self.cpu.mem.get(addr).map(|w| disassemble_word_with(w, min_len)).unwrap_or_default()
            }
        })
    }

    /// Run until EXIT, a fault or `max_cycles`. Returns the cycle count.
    #[wasm_bindgen]
    pub fn run(&mut self, max_cycles: u32) -> u64 {
        let _ = self.cpu.run_limited(max_cycles as u64);
        self.cpu.cycle
    }

    /// Reset CPU to initial state with loaded program.
    #[wasm_bindgen]
    pub fn reset(&mut self) -> Result<(), JsError> {
        self.reload()
    }

    /// Check if CPU is running.
    #[wasm_bindgen]
    pub fn is_running(&self) -> bool {
        self.cpu.is_running()
    }

    /// Check if CPU has executed EXIT.
    #[wasm_bindgen]
    pub fn is_halted(&self) -> bool {
        self.cpu.is_halted()
    }

    /// Exit status, once halted.
    #[wasm_bindgen]
    pub fn exit_code(&self) -> Option<i32> {
        self.cpu.exit_code()
    }

    /// Fault message, if the CPU stopped on a fault.
    #[wasm_bindgen]
    pub fn fault(&self) -> Option<String> {
        self.cpu.fault().map(|e| e.to_string())
    }

    /// Get cycle count.
    #[wasm_bindgen]
    pub fn cycles(&self) -> u64 {
        self.cpu.cycle
    }

    /// Address the next cycle fetches.
    #[wasm_bindgen]
    pub fn next_address(&self) -> String {
        self.cpu.next_address().to_string()
    }

    /// Get state as string.
    #[wasm_bindgen]
    pub fn state(&self) -> String {
        format!("{:?}", self.cpu.state)
    }

    /// Raw bit-string held by a register, if set.
    #[wasm_bindgen]
    pub fn register(&self, index: u32) -> Option<String> {
        self.cpu.regs.get(index as u64).ok().flatten().map(|b| b.to_string())
    }

    /// Serial output so far, one line per `OUT`.
    #[wasm_bindgen]
    pub fn output(&self) -> Vec<String> {
        self.cpu.serial().lines()
    }

    /// Get registers as a JSON string.
    #[wasm_bindgen]
    pub fn registers_json(&self) -> String {
        let registers: Vec<_> = self.cpu.regs.iter()
            .map(|value| match value {
                Some(bits) => json!({
                    "bits": bits.as_str(),
                    "value": decode_signed(bits.as_str()).ok(),
                }),
                None => serde_json::Value::Null,
            })
            .collect();

        json!({
            "registers": registers,
            "cycle": self.cpu.cycle,
            "next": self.cpu.next_address().to_string(),
            "output": self.cpu.serial().values().iter().map(|v| format_value(*v)).collect::<Vec<_>>(),
        })
        .to_string()
    }

    /// Get occupied memory as a JSON array of `{ addr, word }`.
    #[wasm_bindgen]
    pub fn memory_json(&self) -> String {
        let min_len = self.cpu.config().min_instruction_len;
        let cells: Vec<_> = self.cpu.mem.iter()
            .map(|(addr, word)| json!({
                "addr": addr.to_string(),
                "word": word,
                "text": disassemble_word_with(word, min_len),
            }))
            .collect();
        serde_json::Value::Array(cells).to_string()
    }
}

impl Default for WasmCpu {
    fn default() -> Self {
        Self::new()
    }
}

/// Assemble source code and return the word count.
#[wasm_bindgen]
pub fn wasm_assemble(source: &str) -> Result<usize, JsError> {
    let program = assemble_with_width(source, MachineConfig::default().token_width)
        .map_err(|e| JsError::new(&format!("{}", e)))?;
    Ok(program.len())
}

/// Disassemble one word given as space separated bit-strings.
#[wasm_bindgen]
pub fn wasm_disassemble(word: &str) -> Result<String, JsError> {
    let word = Word::parse(word).map_err(|e| JsError::new(&format!("{}", e)))?;
    Ok(disassemble_word(&word))
}
