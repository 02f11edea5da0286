//! ZEV memory subsystem.
//!
//! Memory is a sparse map from slot addresses to instruction words. Slots
//! are numbered from 1; the textual form of slot `n` is `0xn` with `n`
//! written in decimal.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use serde::{Serialize, Deserialize};
use crate::binary::{Bits, CodecError};

/// First slot handed out by sequential insertion.
pub const FIRST_SLOT: u64 = 1;

/// A memory slot address.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(pub u64);

impl Address {
    #[inline]
    pub const fn new(slot: u64) -> Self {
        Self(slot)
    }

    #[inline]
    pub const fn slot(self) -> u64 {
        self.0
    }

    /// The address fetched on the given cycle.
    #[inline]
    pub const fn for_cycle(cycle: u64) -> Self {
        Self(cycle)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.0)
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address(0x{})", self.0)
    }
}

impl FromStr for Address {
    type Err = MemoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.strip_prefix("0x")
            .filter(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
            .and_then(|n| n.parse::<u64>().ok())
            .map(Address)
            .ok_or_else(|| MemoryError::MalformedAddress(s.to_string()))
    }
}

/// One instruction (or data) word: an opcode token followed by operands.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Word(Vec<Bits>);

impl Word {
    pub fn new(tokens: Vec<Bits>) -> Self {
        Self(tokens)
    }

    /// Parse whitespace separated bit-string tokens, e.g. `"0101 0010"`.
    pub fn parse(s: &str) -> Result<Self, CodecError> {
        s.split_whitespace()
            .map(Bits::parse)
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }

    #[inline]
    pub fn tokens(&self) -> &[Bits] {
        &self.0
    }

    /// The opcode token, if any.
    #[inline]
    pub fn first(&self) -> Option<&Bits> {
        self.0.first()
    }

    /// Everything after the opcode token.
    #[inline]
    pub fn operands(&self) -> &[Bits] {
        self.0.get(1..).unwrap_or(&[])
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<Bits>> for Word {
    fn from(tokens: Vec<Bits>) -> Self {
        Self(tokens)
    }
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, token) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}", token)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Word[{}]", self)
    }
}

/// ZEV memory: address-keyed word storage.
#[derive(Clone, Serialize, Deserialize)]
pub struct Memory {
    cells: BTreeMap<Address, Word>,
    /// Next slot for sequential insertion; always past every used slot.
    /// `None` once a word sits at the last representable slot.
    next_slot: Option<u64>,
    /// Optional capacity in slots.
    max_slots: Option<usize>,
}

impl Memory {
    /// Create an empty, unbounded memory.
    pub fn new() -> Self {
        Self {
            cells: BTreeMap::new(),
            next_slot: Some(FIRST_SLOT),
            max_slots: None,
        }
    }

    /// Create an empty memory holding at most `max_slots` words.
    pub fn with_capacity(max_slots: Option<usize>) -> Self {
        Self {
            max_slots,
            ..Self::new()
        }
    }

    pub fn max_slots(&self) -> Option<usize> {
        self.max_slots
    }

    /// Store a word at the next sequential address and return that address.
    ///
    /// Fails with `OutOfMemory` once the address space above the highest
    /// used slot is exhausted.
    pub fn insert(&mut self, word: Word) -> Result<Address, MemoryError> {
        let addr = self.next_slot.map(Address).ok_or(MemoryError::OutOfMemory {
            addr: Address(u64::MAX),
            capacity: self.cells.len(),
        })?;
        self.insert_at(addr, word)?;
        Ok(addr)
    }

    /// Store a word at an explicit address, replacing any previous word.
    pub fn insert_at(&mut self, addr: Address, word: Word) -> Result<(), MemoryError> {
        if word.is_empty() {
            return Err(MemoryError::EmptyWord(addr));
        }
        if !self.cells.contains_key(&addr) {
            if let Some(max) = self.max_slots {
                if self.cells.len() >= max {
                    return Err(MemoryError::OutOfMemory { addr, capacity: max });
                }
            }
        }

        self.cells.insert(addr, word);
        if let Some(next) = self.next_slot {
            if addr.0 >= next {
                self.next_slot = addr.0.checked_add(1);
            }
        }
        Ok(())
    }

    /// Read the word at an address.
    pub fn get(&self, addr: Address) -> Result<&Word, MemoryError> {
        self.cells.get(&addr).ok_or(MemoryError::NotFound(addr))
    }

    /// Remove the word at an address and return it.
    pub fn delete(&mut self, addr: Address) -> Result<Word, MemoryError> {
        self.cells.remove(&addr).ok_or(MemoryError::NotFound(addr))
    }

    #[inline]
    pub fn contains(&self, addr: Address) -> bool {
        self.cells.contains_key(&addr)
    }

    /// Remove every word and restart sequential numbering.
    pub fn clear(&mut self) {
        self.cells.clear();
        self.next_slot = Some(FIRST_SLOT);
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// All stored words in address order.
    pub fn iter(&self) -> impl Iterator<Item = (Address, &Word)> {
        self.cells.iter().map(|(addr, word)| (*addr, word))
    }

    /// Dump up to `count` stored words starting at `start` (for debugging).
    pub fn dump(&self, start: Address, count: usize) -> Vec<(Address, Word)> {
        self.cells
            .range(start..)
            .take(count)
            .map(|(addr, word)| (*addr, word.clone()))
            .collect()
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Memory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Memory")
            .field("used_slots", &self.cells.len())
            .field("next_slot", &self.next_slot)
            .field("max_slots", &self.max_slots)
            .finish()
    }
}

/// Errors that can occur during memory operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemoryError {
    /// Nothing is stored at the address.
    NotFound(Address),
    /// Storing a new word would exceed the configured capacity.
    OutOfMemory { addr: Address, capacity: usize },
    /// Words must contain at least one token.
    EmptyWord(Address),
    /// Text is not of the form `0xN`.
    MalformedAddress(String),
}

impl fmt::Display for MemoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemoryError::NotFound(addr) => {
                write!(f, "no word stored at address {}", addr)
            }
            MemoryError::OutOfMemory { addr, capacity } => {
                write!(f, "cannot store at {}: memory full ({} slots)", addr, capacity)
            }
            MemoryError::EmptyWord(addr) => {
                write!(f, "refusing to store an empty word at {}", addr)
            }
            MemoryError::MalformedAddress(text) => {
                write!(f, "malformed address {:?} (expected 0xN)", text)
            }
        }
    }
}

impl std::error::Error for MemoryError {}
