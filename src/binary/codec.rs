//! Conversions between bit-strings and integers.

use crate::binary::{Bits, CodecError, SIGN_MARKER};

/// Decode a big-endian binary literal to an unsigned integer.
///
/// Leading zeros are allowed and ignored. A sign marker is rejected.
pub fn decode_unsigned(bits: &str) -> Result<u64, CodecError> {
    if bits.starts_with(SIGN_MARKER) {
        return Err(CodecError::Signed(bits.to_string()));
    }
    if bits.is_empty() {
        return Err(CodecError::Empty);
    }

    let mut value: u64 = 0;
    for c in bits.chars() {
        let digit = match c {
            '0' => 0,
            '1' => 1,
            _ => return Err(CodecError::InvalidDigit(c)),
        };
        value = value
            .checked_mul(2)
            .and_then(|v| v.checked_add(digit))
            .ok_or_else(|| CodecError::Overflow(bits.to_string()))?;
    }
    Ok(value)
}

/// Decode a binary literal that may carry a leading sign marker.
pub fn decode_signed(bits: &str) -> Result<i64, CodecError> {
    let (negative, digits) = match bits.strip_prefix(SIGN_MARKER) {
        Some(rest) => (true, rest),
        None => (false, bits),
    };
    let magnitude = decode_unsigned(digits)?;

    if negative {
        // i64::MIN has no positive counterpart
        if magnitude == i64::MIN.unsigned_abs() {
            return Ok(i64::MIN);
        }
        let value = i64::try_from(magnitude)
            .map_err(|_| CodecError::Overflow(bits.to_string()))?;
        Ok(-value)
    } else {
        i64::try_from(magnitude).map_err(|_| CodecError::Overflow(bits.to_string()))
    }
}

/// Encode `value` as a binary literal zero-padded to at least `width` digits.
///
/// Values wider than `width` keep their natural length.
pub fn encode_unsigned(value: u64, width: usize) -> Bits {
    Bits::from_raw(format!("{:0width$b}", value, width = width.max(1)))
}
