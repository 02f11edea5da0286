//! ZEV register file.
//!
//! A fixed number of general purpose registers (8 on the canonical
//! machine), numbered from 0. Each register is either uninitialized or
//! holds a bit-string.

use std::fmt;
use serde::{Serialize, Deserialize};
use crate::binary::Bits;

/// The register file.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registers {
    slots: Box<[Option<Bits>]>,
}

impl Registers {
    /// Create a register file with `count` uninitialized registers.
    pub fn new(count: usize) -> Self {
        Self {
            slots: vec![None; count].into_boxed_slice(),
        }
    }

    /// Number of registers.
    #[inline]
    pub fn count(&self) -> usize {
        self.slots.len()
    }

    /// Check that `index` names a register: `0 <= index < count`.
    pub fn validate(&self, index: u64) -> Result<usize, RegisterError> {
        usize::try_from(index)
            .ok()
            .filter(|&i| i < self.slots.len())
            .ok_or(RegisterError { index, count: self.slots.len() })
    }

    /// Read a register. `Ok(None)` means it is uninitialized.
    pub fn get(&self, index: u64) -> Result<Option<&Bits>, RegisterError> {
        let i = self.validate(index)?;
        Ok(self.slots[i].as_ref())
    }

    /// Write a register.
    pub fn set(&mut self, index: u64, value: Bits) -> Result<(), RegisterError> {
        let i = self.validate(index)?;
        self.slots[i] = Some(value);
        Ok(())
    }

    /// Return every register to the uninitialized state.
    pub fn reset(&mut self) {
        for slot in self.slots.iter_mut() {
            *slot = None;
        }
    }

    /// All registers in index order.
    pub fn iter(&self) -> impl Iterator<Item = Option<&Bits>> {
        self.slots.iter().map(Option::as_ref)
    }
}

impl Default for Registers {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_REGISTER_COUNT)
    }
}

impl fmt::Debug for Registers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut list = f.debug_map();
        for (i, slot) in self.slots.iter().enumerate() {
            match slot {
                Some(bits) => list.entry(&format_args!("reg{}", i), &format_args!("{}", bits)),
                None => list.entry(&format_args!("reg{}", i), &format_args!("-")),
            };
        }
        list.finish()
    }
}

/// A register index outside `0..count`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterError {
    pub index: u64,
    pub count: usize,
}

impl fmt::Display for RegisterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "register index {} out of range (0-{})", self.index, self.count.saturating_sub(1))
    }
}

impl std::error::Error for RegisterError {}
