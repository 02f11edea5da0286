//! Validated bit-strings.
//!
//! Every operand token in a [`Word`](crate::cpu::Word) and every value held
//! in a register is a `Bits`: one or more binary digits, most significant
//! first. Register values may additionally carry a single leading `-` sign
//! marker, which only `sub_binary` ever produces.

use std::fmt;
use std::str::FromStr;
use serde::{Serialize, Deserialize};
use crate::binary::CodecError;

/// Sign marker prefixed to negative subtraction results.
pub const SIGN_MARKER: char = '-';

/// A bit-string value.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Bits(String);

impl Bits {
    /// Parse and validate a bit-string.
    pub fn parse(s: &str) -> Result<Self, CodecError> {
        validate(s)?;
        Ok(Self(s.to_string()))
    }

    /// The single digit `0`.
    pub fn zero() -> Self {
        Self("0".to_string())
    }

    /// Minimal binary form of `value` (no padding).
    pub fn from_u64(value: u64) -> Self {
        Self(format!("{:b}", value))
    }

    /// Build from a string already known to be valid.
    pub(crate) fn from_raw(raw: String) -> Self {
        debug_assert!(validate(&raw).is_ok(), "invalid bit-string {raw:?}");
        Self(raw)
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the value carries the sign marker.
    #[inline]
    pub fn is_negative(&self) -> bool {
        self.0.starts_with(SIGN_MARKER)
    }

    /// The digits without any sign marker.
    #[inline]
    pub fn digits(&self) -> &str {
        self.0.strip_prefix(SIGN_MARKER).unwrap_or(&self.0)
    }

    /// Number of binary digits (the sign marker is not counted).
    #[inline]
    pub fn width(&self) -> usize {
        self.digits().len()
    }
}

fn validate(s: &str) -> Result<(), CodecError> {
    let digits = s.strip_prefix(SIGN_MARKER).unwrap_or(s);
    if digits.is_empty() {
        return Err(CodecError::Empty);
    }
    if let Some(c) = digits.chars().find(|c| !matches!(c, '0' | '1')) {
        return Err(CodecError::InvalidDigit(c));
    }
    Ok(())
}

impl FromStr for Bits {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Bits {
    type Error = CodecError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        validate(&s)?;
        Ok(Self(s))
    }
}

impl From<Bits> for String {
    fn from(bits: Bits) -> Self {
        bits.0
    }
}

impl AsRef<str> for Bits {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Bits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl fmt::Debug for Bits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0b{}", self.0)
    }
}
