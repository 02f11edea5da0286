//! CPU execution engine for the ZEV machine.
//!
//! Implements the fetch-decode-execute cycle and all instruction behaviors.
//! The cycle counter doubles as the program counter: cycle `n` fetches the
//! word stored at address `0xn`.

use tracing::{debug, info, trace, warn};
use thiserror::Error;
use crate::binary::{add_binary, decode_signed, decode_unsigned, sub_binary, Bits, CodecError};
use crate::config::MachineConfig;
use crate::cpu::decode::{self, DecodeError, Instruction, MovSource, Opcode};
use crate::cpu::memory::{Address, Memory, MemoryError, Word};
use crate::cpu::registers::Registers;
use crate::io::{ConsoleSerial, Serial};
use crate::asm::Program;

/// CPU execution state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CpuState {
    /// CPU is running normally.
    Running,
    /// CPU executed EXIT with this status.
    Halted(i32),
    /// CPU stopped on a fault.
    Faulted(CpuError),
}

/// How a program finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitStatus {
    /// Value passed to EXIT.
    pub code: i32,
    /// Cycles elapsed, including the EXIT cycle.
    pub cycles: u64,
}

/// The ZEV CPU.
///
/// Owns its memory, its register file and the serial port `OUT` writes to.
pub struct Cpu<S: Serial = ConsoleSerial> {
    /// General purpose registers.
    pub regs: Registers,
    /// Main memory.
    pub mem: Memory,
    /// Current execution state.
    pub state: CpuState,
    /// Cycle counter; also the slot of the last fetched word.
    pub cycle: u64,
    serial: S,
    config: MachineConfig,
    /// Last executed instruction (for debugging).
    last_instr: Option<Instruction>,
}

impl Cpu<ConsoleSerial> {
    /// Create a canonical 8-register CPU printing to stdout.
    pub fn new() -> Self {
        Self::with_serial(MachineConfig::default(), ConsoleSerial)
    }
}

impl<S: Serial> Cpu<S> {
    /// Create a CPU with empty memory.
    pub fn with_serial(config: MachineConfig, serial: S) -> Self {
        let mem = Memory::with_capacity(config.memory_max_slots);
        Self::with_memory(config, mem, serial)
    }

    /// Create a CPU around an already populated memory.
    pub fn with_memory(config: MachineConfig, mem: Memory, serial: S) -> Self {
        Self {
            regs: Registers::new(config.register_count),
            mem,
            state: CpuState::Running,
            cycle: 0,
            serial,
            config,
            last_instr: None,
        }
    }

    /// Reset registers, memory and the cycle counter.
    pub fn reset(&mut self) {
        self.regs.reset();
        self.mem.clear();
        self.rewind();
    }

    /// Restart execution from cycle 0, keeping memory contents.
    pub fn rewind(&mut self) {
        self.regs.reset();
        self.state = CpuState::Running;
        self.cycle = 0;
        self.last_instr = None;
    }

    /// Link an assembled program into memory.
    pub fn load_program(&mut self, program: &Program) -> Result<(), MemoryError> {
        program.load_into(&mut self.mem)?;
        debug!(words = program.len(), "program loaded");
        Ok(())
    }

    /// Store words at sequential addresses starting after the last used slot.
    pub fn load_words(&mut self, words: &[Word]) -> Result<Vec<Address>, MemoryError> {
        words.iter().map(|w| self.mem.insert(w.clone())).collect()
    }

    /// Execute a single cycle.
    ///
    /// Returns the instruction that was executed, or `None` when the
    /// fetched word was data shorter than an instruction. Any error also
    /// moves the CPU into [`CpuState::Faulted`].
    pub fn step(&mut self) -> Result<Option<Instruction>, CpuError> {
        if self.state != CpuState::Running {
            return Err(CpuError::NotRunning { cycle: self.cycle });
        }

        match self.cycle_once() {
            Ok(executed) => Ok(executed),
            Err(e) => {
                warn!(cycle = self.cycle, "fault: {}", e);
                self.state = CpuState::Faulted(e.clone());
                Err(e)
            }
        }
    }

    fn cycle_once(&mut self) -> Result<Option<Instruction>, CpuError> {
        self.cycle += 1;
        let cycle = self.cycle;
        let addr = Address::for_cycle(cycle);

        // Fetch
        let word = self.mem.get(addr)
            .map_err(|_| CpuError::OutOfInstructions { cycle, addr })?;

        if word.len() < self.config.min_instruction_len {
            debug!(cycle, %addr, "skipping data word {}", word);
            return Ok(None);
        }

        // Decode
        let instr = decode::decode(word).map_err(|e| CpuError::from_decode(e, cycle))?;

        // Execute
        self.execute(&instr)?;
        trace!(cycle, %addr, "{:?}", instr);

        self.last_instr = Some(instr.clone());
        Ok(Some(instr))
    }

    /// Run until EXIT or a fault.
    pub fn run(&mut self) -> Result<ExitStatus, CpuError> {
        loop {
            if let CpuState::Halted(code) = self.state {
                return Ok(ExitStatus { code, cycles: self.cycle });
            }
            self.step()?;
        }
    }

    /// Run for at most `max_cycles` cycles.
    ///
    /// Returns `None` if the budget ran out before EXIT.
    pub fn run_limited(&mut self, max_cycles: u64) -> Result<Option<ExitStatus>, CpuError> {
        let limit = self.cycle.saturating_add(max_cycles);

        while self.state == CpuState::Running && self.cycle < limit {
            self.step()?;
        }

        match self.state {
            CpuState::Halted(code) => Ok(Some(ExitStatus { code, cycles: self.cycle })),
            _ => Ok(None),
        }
    }

    /// Execute a decoded instruction.
    fn execute(&mut self, instr: &Instruction) -> Result<(), CpuError> {
        let cycle = self.cycle;
        let opcode = instr.opcode();

        match instr {
            Instruction::Mov { dst, src } => {
                self.check_register(opcode, *dst)?;
                let value = match src {
                    MovSource::Immediate(imm) => imm.clone(),
                    MovSource::Address(addr) => self.mem.get(*addr)
                        .ok()
                        .and_then(Word::first)
                        .cloned()
                        .ok_or(CpuError::InvalidAddress { cycle, opcode, addr: *addr })?,
                };
                self.store(opcode, *dst, value)?;
            }

            Instruction::Add { lhs, rhs, dst } => {
                let (a, b) = self.read_sources(opcode, *lhs, *rhs, *dst)?;
                let sum = add_binary(a.as_str(), b.as_str()).map_err(|e| self.codec(e))?;
                self.store(opcode, *dst, sum)?;
            }

            Instruction::Sub { lhs, rhs, dst } => {
                let (a, b) = self.read_sources(opcode, *lhs, *rhs, *dst)?;
                let diff = sub_binary(a.as_str(), b.as_str()).map_err(|e| self.codec(e))?;
                self.store(opcode, *dst, diff)?;
            }

            Instruction::Mul { lhs, rhs, dst } => {
                let (a, b) = self.read_sources(opcode, *lhs, *rhs, *dst)?;
                let (a, b) = (self.unsigned(&a)?, self.unsigned(&b)?);
                let product = a.checked_mul(b).ok_or(CpuError::Overflow { cycle, opcode })?;
                self.store(opcode, *dst, Bits::from_u64(product))?;
            }

            Instruction::Div { lhs, rhs, dst } => {
                let (a, b) = self.read_sources(opcode, *lhs, *rhs, *dst)?;
                let (a, b) = (self.unsigned(&a)?, self.unsigned(&b)?);
                if b == 0 {
                    return Err(CpuError::DivisionByZero { cycle });
                }
                // Unsigned division already truncates toward zero
                self.store(opcode, *dst, Bits::from_u64(a / b))?;
            }

            Instruction::Out { src } => {
                self.check_register(opcode, *src)?;
                let value = match self.regs.get(*src).ok().flatten() {
                    Some(bits) => Some(decode_signed(bits.as_str()).map_err(|e| self.codec(e))?),
                    None => None,
                };
                self.serial.emit(value);
            }

            Instruction::Exit { code } => {
                let status = i32::try_from(*code)
                    .map_err(|_| CpuError::ExitCodeOutOfRange { cycle, code: *code })?;
                info!(cycle, status, "program exited");
                self.state = CpuState::Halted(status);
            }
        }

        Ok(())
    }

    fn check_register(&self, opcode: Opcode, index: u64) -> Result<(), CpuError> {
        self.regs.validate(index).map(|_| ()).map_err(|e| CpuError::InvalidRegister {
            cycle: self.cycle,
            opcode,
            index: e.index,
            count: e.count,
        })
    }

    /// Validate all three operands of an arithmetic instruction, then read
    /// both sources.
    fn read_sources(&self, opcode: Opcode, lhs: u64, rhs: u64, dst: u64) -> Result<(Bits, Bits), CpuError> {
        for index in [lhs, rhs, dst] {
            self.check_register(opcode, index)?;
        }
        Ok((self.read_initialized(opcode, lhs)?, self.read_initialized(opcode, rhs)?))
    }

    fn read_initialized(&self, opcode: Opcode, index: u64) -> Result<Bits, CpuError> {
        self.regs.get(index)
            .ok()
            .flatten()
            .cloned()
            .ok_or(CpuError::EmptyRegister { cycle: self.cycle, opcode, index })
    }

    fn store(&mut self, opcode: Opcode, index: u64, value: Bits) -> Result<(), CpuError> {
        let cycle = self.cycle;
        self.regs.set(index, value).map_err(|e| CpuError::InvalidRegister {
            cycle,
            opcode,
            index: e.index,
            count: e.count,
        })
    }

    fn unsigned(&self, bits: &Bits) -> Result<u64, CpuError> {
        decode_unsigned(bits.as_str()).map_err(|e| self.codec(e))
    }

    fn codec(&self, source: CodecError) -> CpuError {
        CpuError::Codec { cycle: self.cycle, source }
    }

    /// The configuration this CPU was built with.
    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    /// The serial port `OUT` writes to.
    pub fn serial(&self) -> &S {
        &self.serial
    }

    pub fn serial_mut(&mut self) -> &mut S {
        &mut self.serial
    }

    /// Address the next cycle will fetch.
    pub fn next_address(&self) -> Address {
        Address::for_cycle(self.cycle + 1)
    }

    /// Get the last executed instruction.
    pub fn last_instruction(&self) -> Option<&Instruction> {
        self.last_instr.as_ref()
    }

    /// Exit status, once the CPU has halted.
    pub fn exit_code(&self) -> Option<i32> {
        match self.state {
            CpuState::Halted(code) => Some(code),
            _ => None,
        }
    }

    /// The fault that stopped the CPU, if any.
    pub fn fault(&self) -> Option<&CpuError> {
        match &self.state {
            CpuState::Faulted(e) => Some(e),
            _ => None,
        }
    }

    /// Check if the CPU is halted.
    pub fn is_halted(&self) -> bool {
        matches!(self.state, CpuState::Halted(_))
    }

    /// Check if the CPU is running.
    pub fn is_running(&self) -> bool {
        self.state == CpuState::Running
    }
}

impl Default for Cpu<ConsoleSerial> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Serial> std::fmt::Debug for Cpu<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cpu")
            .field("state", &self.state)
            .field("cycle", &self.cycle)
            .field("regs", &self.regs)
            .field("mem", &self.mem)
            .finish()
    }
}

/// Errors that can occur during CPU execution.
///
/// Every execution fault records the cycle it happened on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CpuError {
    #[error("CPU not running (stopped at cycle {cycle})")]
    NotRunning { cycle: u64 },

    #[error("cycle {cycle}: ran out of instructions, nothing stored at {addr}")]
    OutOfInstructions { cycle: u64, addr: Address },

    #[error("cycle {cycle}: invalid instruction, opcode {opcode} is not defined")]
    InvalidInstruction { cycle: u64, opcode: u64 },

    #[error("cycle {cycle}: {opcode} takes {expected:?} operands, found {found}")]
    ArityMismatch {
        cycle: u64,
        opcode: Opcode,
        expected: &'static [usize],
        found: usize,
    },

    #[error("cycle {cycle}: {opcode} uses register {index}, but the machine has {count} registers")]
    InvalidRegister { cycle: u64, opcode: Opcode, index: u64, count: usize },

    #[error("cycle {cycle}: {opcode} reads uninitialized register {index}")]
    EmptyRegister { cycle: u64, opcode: Opcode, index: u64 },

    #[error("cycle {cycle}: {opcode} references {addr}, which holds nothing")]
    InvalidAddress { cycle: u64, opcode: Opcode, addr: Address },

    #[error("cycle {cycle}: division by zero")]
    DivisionByZero { cycle: u64 },

    #[error("cycle {cycle}: {opcode} result does not fit in 64 bits")]
    Overflow { cycle: u64, opcode: Opcode },

    #[error("cycle {cycle}: exit code {code} out of range")]
    ExitCodeOutOfRange { cycle: u64, code: u64 },

    #[error("cycle {cycle}: malformed operand: {source}")]
    Codec { cycle: u64, source: CodecError },

    #[error("memory error: {0}")]
    Memory(#[from] MemoryError),
}

impl CpuError {
    fn from_decode(err: DecodeError, cycle: u64) -> Self {
        match err {
            DecodeError::InvalidOpcode(opcode) => CpuError::InvalidInstruction { cycle, opcode },
            DecodeError::ArityMismatch { opcode, expected, found } => {
                CpuError::ArityMismatch { cycle, opcode, expected, found }
            }
            DecodeError::EmptyWord => CpuError::Codec { cycle, source: CodecError::Empty },
            DecodeError::Operand(source) => CpuError::Codec { cycle, source },
        }
    }

    /// Cycle the fault happened on, when it came from execution.
    pub fn cycle(&self) -> Option<u64> {
        match self {
            CpuError::NotRunning { cycle }
            | CpuError::OutOfInstructions { cycle, .. }
            | CpuError::InvalidInstruction { cycle, .. }
            | CpuError::ArityMismatch { cycle, .. }
            | CpuError::InvalidRegister { cycle, .. }
            | CpuError::EmptyRegister { cycle, .. }
            | CpuError::InvalidAddress { cycle, .. }
            | CpuError::DivisionByZero { cycle }
            | CpuError::Overflow { cycle, .. }
            | CpuError::ExitCodeOutOfRange { cycle, .. }
            | CpuError::Codec { cycle, .. } => Some(*cycle),
            CpuError::Memory(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::decode::encode;
    use crate::io::CaptureSerial;

    fn imm(value: u64) -> MovSource {
        MovSource::Immediate(crate::binary::encode_unsigned(value, 4))
    }

    fn make_cpu(instructions: &[Instruction]) -> Cpu<CaptureSerial> {
        let mut cpu = Cpu::with_serial(MachineConfig::default(), CaptureSerial::new());
        let words: Vec<Word> = instructions.iter().map(|i| encode(i, 4)).collect();
        cpu.load_words(&words).unwrap();
        cpu
    }

    #[test]
    fn test_cpu_exit() {
        let mut cpu = make_cpu(&[Instruction::Exit { code: 3 }]);
        let status = cpu.run().unwrap();

        assert_eq!(status, ExitStatus { code: 3, cycles: 1 });
        assert!(cpu.is_halted());
        assert_eq!(cpu.exit_code(), Some(3));
    }

    #[test]
    fn test_add_program() {
        let mut cpu = make_cpu(&[
            Instruction::Mov { dst: 0, src: imm(7) },
            Instruction::Mov { dst: 1, src: imm(3) },
            Instruction::Add { lhs: 0, rhs: 1, dst: 2 },
            Instruction::Out { src: 2 },
            Instruction::Exit { code: 0 },
        ]);

        let status = cpu.run().unwrap();

        assert_eq!(status, ExitStatus { code: 0, cycles: 5 });
        assert_eq!(cpu.serial().values(), &[Some(10)]);
    }

    #[test]
    fn test_sub_negative_result() {
        let mut cpu = make_cpu(&[
            Instruction::Mov { dst: 0, src: imm(3) },
            Instruction::Mov { dst: 1, src: imm(7) },
            Instruction::Sub { lhs: 0, rhs: 1, dst: 2 },
            Instruction::Out { src: 2 },
            Instruction::Exit { code: 0 },
        ]);

        cpu.run().unwrap();
        assert_eq!(cpu.serial().values(), &[Some(-4)]);
        assert_eq!(cpu.regs.get(2).unwrap().unwrap().as_str(), "-100");
    }

    #[test]
    fn test_mul_div() {
        let mut cpu = make_cpu(&[
            Instruction::Mov { dst: 0, src: imm(7) },
            Instruction::Mov { dst: 1, src: imm(2) },
            Instruction::Mul { lhs: 0, rhs: 1, dst: 2 },
            Instruction::Div { lhs: 0, rhs: 1, dst: 3 },
            Instruction::Out { src: 2 },
            Instruction::Out { src: 3 },
            Instruction::Exit { code: 0 },
        ]);

        cpu.run().unwrap();
        assert_eq!(cpu.serial().values(), &[Some(14), Some(3)]);
    }

    #[test]
    fn test_division_by_zero() {
        let mut cpu = make_cpu(&[
            Instruction::Mov { dst: 0, src: imm(7) },
            Instruction::Mov { dst: 1, src: imm(0) },
            Instruction::Div { lhs: 0, rhs: 1, dst: 2 },
        ]);

        assert_eq!(cpu.run(), Err(CpuError::DivisionByZero { cycle: 3 }));
        assert_eq!(cpu.fault(), Some(&CpuError::DivisionByZero { cycle: 3 }));
    }

    #[test]
    fn test_mul_of_negative_is_codec_fault() {
        let mut cpu = make_cpu(&[
            Instruction::Mov { dst: 0, src: imm(1) },
            Instruction::Mov { dst: 1, src: imm(2) },
            Instruction::Sub { lhs: 0, rhs: 1, dst: 2 },
            Instruction::Mul { lhs: 2, rhs: 1, dst: 3 },
        ]);

        let err = cpu.run().unwrap_err();
        assert!(matches!(err, CpuError::Codec { cycle: 4, source: CodecError::Signed(_) }));
    }

    #[test]
    fn test_out_uninitialized_emits_none() {
        let mut cpu = make_cpu(&[
            Instruction::Out { src: 5 },
            Instruction::Exit { code: 0 },
        ]);

        cpu.run().unwrap();
        assert_eq!(cpu.serial().values(), &[None]);
    }

    #[test]
    fn test_invalid_register_strict_bound() {
        let mut cpu = make_cpu(&[Instruction::Out { src: 8 }]);
        let err = cpu.run().unwrap_err();
        assert_eq!(err, CpuError::InvalidRegister { cycle: 1, opcode: Opcode::Out, index: 8, count: 8 });

        // The last register is valid
        let mut cpu = make_cpu(&[
            Instruction::Mov { dst: 7, src: imm(1) },
            Instruction::Out { src: 7 },
            Instruction::Exit { code: 0 },
        ]);
        cpu.run().unwrap();
        assert_eq!(cpu.serial().values(), &[Some(1)]);
    }

    #[test]
    fn test_every_register_operand_is_bounds_checked() {
        let bad = MachineConfig::default().register_count as u64;
        let arith: [fn(u64, u64, u64) -> Instruction; 4] = [
            |lhs, rhs, dst| Instruction::Add { lhs, rhs, dst },
            |lhs, rhs, dst| Instruction::Sub { lhs, rhs, dst },
            |lhs, rhs, dst| Instruction::Mul { lhs, rhs, dst },
            |lhs, rhs, dst| Instruction::Div { lhs, rhs, dst },
        ];

        let mut cases = vec![
            Instruction::Mov { dst: bad, src: imm(1) },
            Instruction::Mov { dst: bad, src: MovSource::Address(Address(1)) },
            Instruction::Out { src: bad },
        ];
        for make in arith {
            cases.push(make(bad, 1, 2));
            cases.push(make(0, bad, 2));
            cases.push(make(0, 1, bad));
        }

        for instr in cases {
            let mut cpu = make_cpu(&[
                Instruction::Mov { dst: 0, src: imm(6) },
                Instruction::Mov { dst: 1, src: imm(3) },
                instr.clone(),
            ]);
            let err = cpu.run().unwrap_err();
            assert_eq!(
                err,
                CpuError::InvalidRegister { cycle: 3, opcode: instr.opcode(), index: bad, count: 8 },
                "{:?}",
                instr
            );
        }
    }

    #[test]
    fn test_invalid_destination_checked_before_sources() {
        // Sources are uninitialized, but the bad destination is reported
        let mut cpu = make_cpu(&[Instruction::Add { lhs: 0, rhs: 1, dst: 9 }]);
        let err = cpu.run().unwrap_err();
        assert!(matches!(err, CpuError::InvalidRegister { index: 9, .. }));
    }

    #[test]
    fn test_empty_source_register() {
        let mut cpu = make_cpu(&[
            Instruction::Mov { dst: 0, src: imm(1) },
            Instruction::Add { lhs: 0, rhs: 1, dst: 2 },
        ]);
        let err = cpu.run().unwrap_err();
        assert_eq!(err, CpuError::EmptyRegister { cycle: 2, opcode: Opcode::Add, index: 1 });
    }

    #[test]
    fn test_out_of_instructions() {
        let mut cpu = make_cpu(&[Instruction::Mov { dst: 0, src: imm(1) }]);
        let err = cpu.run().unwrap_err();
        assert_eq!(err, CpuError::OutOfInstructions { cycle: 2, addr: Address(2) });
        assert!(!cpu.is_running());
    }

    #[test]
    fn test_invalid_opcode() {
        let mut cpu = Cpu::with_serial(MachineConfig::default(), CaptureSerial::new());
        cpu.load_words(&[Word::parse("0111 0000").unwrap()]).unwrap();
        assert_eq!(cpu.run(), Err(CpuError::InvalidInstruction { cycle: 1, opcode: 7 }));
    }

    #[test]
    fn test_mov_from_address() {
        let mut cpu = make_cpu(&[
            Instruction::Mov { dst: 0, src: MovSource::Address(Address(4)) },
            Instruction::Out { src: 0 },
            Instruction::Exit { code: 0 },
        ]);
        // One-token data word, skipped when fetched as code
        cpu.mem.insert_at(Address(4), Word::parse("101010").unwrap()).unwrap();

        cpu.run().unwrap();
        assert_eq!(cpu.serial().values(), &[Some(42)]);
    }

    #[test]
    fn test_mov_from_missing_address() {
        let mut cpu = make_cpu(&[Instruction::Mov { dst: 0, src: MovSource::Address(Address(30)) }]);
        let err = cpu.run().unwrap_err();
        assert_eq!(err, CpuError::InvalidAddress { cycle: 1, opcode: Opcode::Mov, addr: Address(30) });
    }

    #[test]
    fn test_data_words_are_skipped() {
        let mut cpu = Cpu::with_serial(MachineConfig::default(), CaptureSerial::new());
        cpu.load_words(&[
            Word::parse("1").unwrap(),
            encode(&Instruction::Exit { code: 2 }, 4),
        ]).unwrap();

        assert_eq!(cpu.step().unwrap(), None);
        assert_eq!(cpu.step().unwrap(), Some(Instruction::Exit { code: 2 }));
        assert_eq!(cpu.exit_code(), Some(2));
    }

    #[test]
    fn test_step_after_halt() {
        let mut cpu = make_cpu(&[Instruction::Exit { code: 0 }]);
        cpu.run().unwrap();
        assert_eq!(cpu.step(), Err(CpuError::NotRunning { cycle: 1 }));
    }

    #[test]
    fn test_run_limited() {
        let mut cpu = make_cpu(&[
            Instruction::Mov { dst: 0, src: imm(1) },
            Instruction::Mov { dst: 1, src: imm(1) },
            Instruction::Exit { code: 4 },
        ]);

        assert_eq!(cpu.run_limited(2).unwrap(), None);
        assert_eq!(cpu.cycle, 2);
        assert_eq!(cpu.run_limited(10).unwrap(), Some(ExitStatus { code: 4, cycles: 3 }));
    }

    #[test]
    fn test_rewind_keeps_memory() {
        let mut cpu = make_cpu(&[
            Instruction::Mov { dst: 0, src: imm(9) },
            Instruction::Out { src: 0 },
            Instruction::Exit { code: 0 },
        ]);
        cpu.run().unwrap();
        cpu.rewind();

        assert!(cpu.is_running());
        assert_eq!(cpu.regs.get(0).unwrap(), None);
        cpu.run().unwrap();
        assert_eq!(cpu.serial().values(), &[Some(9), Some(9)]);
    }

    #[test]
    fn test_custom_register_count() {
        let config = MachineConfig { register_count: 2, ..MachineConfig::default() };
        let mut cpu = Cpu::with_serial(config, CaptureSerial::new());
        cpu.load_words(&[encode(&Instruction::Mov { dst: 2, src: imm(1) }, 4)]).unwrap();

        assert!(matches!(cpu.run(), Err(CpuError::InvalidRegister { index: 2, count: 2, .. })));
    }
}
