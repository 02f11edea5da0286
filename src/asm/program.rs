//! Assembled programs and the linker that loads them into memory.

use serde::{Serialize, Deserialize};
use crate::cpu::memory::{Address, Memory, MemoryError, Word, FIRST_SLOT};

/// An assembled program: words paired with the address each is placed at,
/// in emission order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    words: Vec<(Address, Word)>,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place words at consecutive addresses starting at `0x1`.
    pub fn from_words(words: Vec<Word>) -> Self {
        let words = (FIRST_SLOT..)
            .zip(words)
            .map(|(slot, word)| (Address(slot), word))
            .collect();
        Self { words }
    }

    pub fn push(&mut self, addr: Address, word: Word) {
        self.words.push((addr, word));
    }

    pub fn words(&self) -> &[(Address, Word)] {
        &self.words
    }

    pub fn iter(&self) -> impl Iterator<Item = &(Address, Word)> {
        self.words.iter()
    }

    /// The word placed at `addr`, if any.
    pub fn get(&self, addr: Address) -> Option<&Word> {
        self.words.iter().find(|(a, _)| *a == addr).map(|(_, w)| w)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Link the program into memory at its explicit addresses.
    pub fn load_into(&self, mem: &mut Memory) -> Result<(), MemoryError> {
        for (addr, word) in &self.words {
            mem.insert_at(*addr, word.clone())?;
        }
        Ok(())
    }
}
