//! Devices the CPU talks to.
//!
//! The only device wired into the execution engine is the serial port,
//! which receives the values written by `OUT`.

pub mod serial;

pub use serial::{Serial, ConsoleSerial, CaptureSerial};
