//! Debugger application state and logic.

use crate::{Address, Cpu, MachineConfig, Program};
use crate::asm::disasm::{disassemble_word_with, format_instruction};
use crate::io::CaptureSerial;
use std::collections::HashSet;

/// Debugger application state.
pub struct DebuggerApp {
    /// The CPU being debugged; `OUT` values are captured for the output panel.
    pub cpu: Cpu<CaptureSerial>,
    /// Original program, reloaded on reset.
    pub program: Program,
    /// Breakpoints (by address).
    pub breakpoints: HashSet<Address>,
    /// Is the debugger running continuously?
    pub running: bool,
    /// Should we quit?
    pub should_quit: bool,
    /// Status message to display.
    pub status: String,
    /// Memory view scroll offset, in occupied slots.
    pub mem_scroll: usize,
}

impl DebuggerApp {
    /// Create a new debugger with a loaded program.
    pub fn new(config: MachineConfig, program: Program) -> Self {
        let mut app = Self {
            cpu: Cpu::with_serial(config, CaptureSerial::new()),
            program,
            breakpoints: HashSet::new(),
            running: false,
            should_quit: false,
            status: String::new(),
            mem_scroll: 0,
        };
        app.reload();
        app.status = match app.cpu.fault() {
            Some(e) => format!("Load failed: {}", e),
            None => "Ready. Press 's' to step, 'r' to run, 'q' to quit.".into(),
        };
        app
    }

    fn reload(&mut self) {
        self.cpu.reset();
        self.cpu.serial_mut().clear();
        if let Err(e) = self.cpu.load_program(&self.program) {
            self.cpu.state = crate::CpuState::Faulted(e.into());
        }
    }

    /// Step one cycle.
    pub fn step(&mut self) {
        if !self.cpu.is_running() {
            self.status = format!("CPU stopped: {}", self.describe_state());
            self.running = false;
            return;
        }

        let addr = self.cpu.next_address();
        match self.cpu.step() {
            Ok(Some(instr)) => {
                self.status = format!("{}: {}", addr, format_instruction(&instr));
            }
            Ok(None) => {
                self.status = format!("{}: skipped data word", addr);
            }
            Err(e) => {
                self.status = format!("Error: {}", e);
                self.running = false;
            }
        }
    }

    /// Run until halt, breakpoint, or error.
    pub fn run(&mut self) {
        self.running = true;
        self.status = "Running...".into();
    }

    /// Run one iteration of continuous execution.
    pub fn tick(&mut self) {
        if !self.running {
            return;
        }

        if !self.cpu.is_running() {
            self.running = false;
            self.status = format!("Stopped after {} cycles: {}", self.cpu.cycle, self.describe_state());
            return;
        }

        // Check for breakpoint
        let next = self.cpu.next_address();
        if self.breakpoints.contains(&next) {
            self.running = false;
            self.status = format!("Breakpoint at {}", next);
            return;
        }

        self.step();
    }

    /// Toggle breakpoint at the next address.
    pub fn toggle_breakpoint(&mut self) {
        let next = self.cpu.next_address();
        if self.breakpoints.remove(&next) {
            self.status = format!("Removed breakpoint at {}", next);
        } else {
            self.breakpoints.insert(next);
            self.status = format!("Set breakpoint at {}", next);
        }
    }

    /// Reset CPU to initial state.
    pub fn reset(&mut self) {
        self.reload();
        self.running = false;
        self.status = "Reset. Ready.".into();
    }

    pub fn scroll_up(&mut self) {
        self.mem_scroll = self.mem_scroll.saturating_sub(1);
    }

    pub fn scroll_down(&mut self) {
        if self.mem_scroll + 1 < self.cpu.mem.len() {
            self.mem_scroll += 1;
        }
    }

    /// Get disassembly around the next fetch address.
    ///
    /// Each entry is `(address, text, is_next)`; empty slots show as `·`.
    pub fn get_disassembly(&self, lines: usize) -> Vec<(Address, String, bool)> {
        let next = self.cpu.next_address();
        let min_len = self.cpu.config().min_instruction_len;
        let start = next.slot().saturating_sub(lines as u64 / 2).max(1);

        (start..start + lines as u64)
            .map(|slot| {
                let addr = Address(slot);
                let text = match self.cpu.mem.get(addr) {
                    Ok(word) => disassemble_word_with(word, min_len),
                    Err(_) => "·".to_string(),
                };
                (addr, text, addr == next)
            })
            .collect()
    }

    /// Human readable CPU state.
    pub fn describe_state(&self) -> String {
        if let Some(code) = self.cpu.exit_code() {
            format!("exited with status {}", code)
        } else if let Some(e) = self.cpu.fault() {
            format!("fault: {}", e)
        } else {
            "running".to_string()
        }
    }
}

/// Run the debugger with a program.
pub fn run_debugger(config: MachineConfig, program: Program) -> std::io::Result<()> {
    use crossterm::{
        event::{self, Event, KeyCode, KeyEventKind},
        terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
        ExecutableCommand,
    };
    use ratatui::prelude::*;
    use std::io::stdout;
    use std::time::Duration;

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    // Create app
    let mut app = DebuggerApp::new(config, program);

    // Main loop
    loop {
        // Draw
        terminal.draw(|frame| {
            super::ui::draw(frame, &app);
        })?;

        // Handle input
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') => app.should_quit = true,
                        KeyCode::Char('s') => {
                            app.running = false;
                            app.step();
                        }
                        KeyCode::Char('r') => app.run(),
                        KeyCode::Char('p') => {
                            app.running = false;
                            app.status = "Paused.".into();
                        }
                        KeyCode::Char('b') => app.toggle_breakpoint(),
                        KeyCode::Char('x') => app.reset(),
                        KeyCode::Up => app.scroll_up(),
                        KeyCode::Down => app.scroll_down(),
                        _ => {}
                    }
                }
            }
        }

        // Tick for continuous running
        if app.running {
            app.tick();
        }

        if app.should_quit {
            break;
        }
    }

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assemble;

    fn app(source: &str) -> DebuggerApp {
        DebuggerApp::new(MachineConfig::default(), assemble(source).unwrap())
    }

    #[test]
    fn test_step_and_output() {
        let mut app = app("MOV reg0 $5\nOUT reg0\nEXIT $0");
        app.step();
        assert!(app.status.contains("MOV reg0 $5"));
        app.step();
        assert_eq!(app.cpu.serial().values(), &[Some(5)]);
    }

    #[test]
    fn test_breakpoint_stops_run() {
        let mut app = app("MOV reg0 $5\nOUT reg0\nEXIT $0");
        app.step();
        app.toggle_breakpoint();
        app.reset();
        app.run();
        for _ in 0..10 {
            app.tick();
        }
        assert!(!app.running);
        assert_eq!(app.cpu.cycle, 1);
        assert!(app.status.contains("Breakpoint at 0x2"));
    }

    #[test]
    fn test_run_to_exit_and_reset() {
        let mut app = app("MOV reg0 $5\nOUT reg0\nEXIT $3");
        app.run();
        for _ in 0..10 {
            app.tick();
        }
        assert_eq!(app.cpu.exit_code(), Some(3));
        assert!(app.status.contains("exited with status 3"));

        app.reset();
        assert!(app.cpu.is_running());
        assert!(app.cpu.serial().values().is_empty());
        assert_eq!(app.cpu.mem.len(), 3);
    }

    #[test]
    fn test_disassembly_uses_machine_threshold() {
        let config = MachineConfig { min_instruction_len: 3, ..MachineConfig::default() };
        let app = DebuggerApp::new(config, assemble("OUT reg1\nEXIT $0").unwrap());
        let lines = app.get_disassembly(2);
        assert_eq!(lines[0].1, "DAT $5");
    }

    #[test]
    fn test_disassembly_window() {
        let app = app("OUT reg0\nEXIT $0");
        let lines = app.get_disassembly(4);
        assert_eq!(lines[0], (Address(1), "OUT reg0".to_string(), true));
        assert_eq!(lines[2].1, "·");
    }
}
