//! Serial output port.

use std::io::Write;

/// Text printed for an emission with no value.
pub const NULL_MARKER: &str = "null";

/// Receives every value written by an `OUT` instruction.
///
/// `None` means the source register was never initialized.
pub trait Serial {
    fn emit(&mut self, value: Option<i64>);
}

/// Writes one value per line to standard output, unbuffered.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleSerial;

impl Serial for ConsoleSerial {
    fn emit(&mut self, value: Option<i64>) {
        let mut out = std::io::stdout().lock();
        let result = match value {
            Some(v) => writeln!(out, "{}", v),
            None => writeln!(out, "{}", NULL_MARKER),
        };
        if let Err(e) = result.and_then(|_| out.flush()) {
            tracing::warn!("serial write failed: {}", e);
        }
    }
}

/// Records emissions in memory (tests, the debugger, WASM).
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CaptureSerial {
    values: Vec<Option<i64>>,
}

impl CaptureSerial {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything emitted so far, oldest first.
    pub fn values(&self) -> &[Option<i64>] {
        &self.values
    }

    /// Emissions rendered the way the console device prints them.
    pub fn lines(&self) -> Vec<String> {
        self.values.iter().map(|v| format_value(*v)).collect()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}

impl Serial for CaptureSerial {
    fn emit(&mut self, value: Option<i64>) {
        self.values.push(value);
    }
}

impl<S: Serial + ?Sized> Serial for &mut S {
    fn emit(&mut self, value: Option<i64>) {
        (**self).emit(value)
    }
}

/// Render one emission as text.
pub fn format_value(value: Option<i64>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => NULL_MARKER.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_records_in_order() {
        let mut serial = CaptureSerial::new();
        serial.emit(Some(10));
        serial.emit(None);
        serial.emit(Some(-3));
        assert_eq!(serial.values(), &[Some(10), None, Some(-3)]);
        assert_eq!(serial.lines(), vec!["10", "null", "-3"]);
    }

    #[test]
    fn test_emit_through_reference() {
        fn emit_one<S: Serial>(mut port: S) {
            port.emit(Some(1));
        }

        let mut serial = CaptureSerial::new();
        emit_one(&mut serial);
        assert_eq!(serial.values(), &[Some(1)]);
    }
}
