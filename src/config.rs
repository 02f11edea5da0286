//! Machine configuration.
//!
//! A machine is described by its register count, the width used when
//! encoding operand tokens, the minimum word length treated as an
//! instruction, and an optional memory capacity. Configurations can be
//! read from JSON:
//!
//! ```json
//! { "register_count": 8, "token_width": 4, "memory_max_slots": 256 }
//! ```
//!
//! Missing fields take the canonical defaults.

use std::path::Path;
use serde::{Serialize, Deserialize};
use thiserror::Error;

/// Canonical number of general purpose registers.
pub const DEFAULT_REGISTER_COUNT: usize = 8;
/// Canonical operand token width, in bits.
pub const DEFAULT_TOKEN_WIDTH: usize = 4;
/// Words shorter than this are data, not instructions.
pub const DEFAULT_MIN_INSTRUCTION_LEN: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MachineConfig {
    /// Number of registers, addressed `0..register_count`.
    pub register_count: usize,
    /// Width used by the assembler when encoding numeric tokens.
    pub token_width: usize,
    /// Minimum token count for a fetched word to be executed.
    pub min_instruction_len: usize,
    /// Optional memory capacity in slots; `None` is unbounded.
    pub memory_max_slots: Option<usize>,
}

impl MachineConfig {
    /// Read a configuration from a JSON file and validate it.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Io(e.to_string()))?;
        Self::from_json_str(&text)
    }

    /// Parse a configuration from JSON text and validate it.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)
            .map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.register_count == 0 {
            return Err(ConfigError::Invalid("register_count must be at least 1".into()));
        }
        if self.token_width == 0 {
            return Err(ConfigError::Invalid("token_width must be at least 1".into()));
        }
        if self.min_instruction_len == 0 {
            return Err(ConfigError::Invalid("min_instruction_len must be at least 1".into()));
        }
        Ok(())
    }
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            register_count: DEFAULT_REGISTER_COUNT,
            token_width: DEFAULT_TOKEN_WIDTH,
            min_instruction_len: DEFAULT_MIN_INSTRUCTION_LEN,
            memory_max_slots: None,
        }
    }
}

/// Errors that can occur while loading a configuration.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}
