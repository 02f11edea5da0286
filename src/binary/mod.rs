//! Binary number primitives.
//!
//! This module provides the value type and arithmetic used by the CPU:
//! - [`Bits`] - A validated bit-string (operand tokens and register values)
//! - [`codec`] - Bit-string ⇄ integer conversion
//! - [`arith`] - Ripple-carry addition and ripple-borrow subtraction

mod bits;
pub mod codec;
pub mod arith;

use thiserror::Error;

pub use bits::{Bits, SIGN_MARKER};
pub use codec::{decode_signed, decode_unsigned, encode_unsigned};
pub use arith::{add_binary, sub_binary};

/// Errors produced when a bit-string cannot be interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("empty bit-string")]
    Empty,

    #[error("invalid binary digit {0:?}")]
    InvalidDigit(char),

    #[error("signed value {0} where an unsigned one is required")]
    Signed(String),

    #[error("value {0} does not fit in 64 bits")]
    Overflow(String),
}
