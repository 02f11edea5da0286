//! TUI debugger for the ZEV machine.
//!
//! Provides an interactive terminal-based debugger with:
//! - Register view with decoded values
//! - Sparse memory view
//! - Step/run/breakpoint controls
//! - Disassembly around the next fetch
//! - Captured serial output

mod app;
mod ui;

pub use app::{DebuggerApp, run_debugger};
