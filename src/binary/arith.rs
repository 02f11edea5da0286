//! Digit-by-digit binary arithmetic.
//!
//! ADD and SUB never go through native integers: both operands are walked
//! from the least significant digit upward with an explicit carry or
//! borrow, the way a ripple adder would.

use crate::binary::{Bits, CodecError, SIGN_MARKER};

/// Add two unsigned bit-strings with ripple carry.
///
/// The result has no leading zeros (a zero sum is `"0"`).
pub fn add_binary(a: &str, b: &str) -> Result<Bits, CodecError> {
    let a = unsigned_digits(a)?;
    let b = unsigned_digits(b)?;
    let (a, b) = pad_equal(a, b);

    let mut sum = Vec::with_capacity(a.len() + 1);
    let mut carry = 0u8;
    for (x, y) in a.iter().rev().zip(b.iter().rev()) {
        let total = x + y + carry;
        sum.push(total % 2);
        carry = total / 2;
    }
    if carry == 1 {
        sum.push(1);
    }
    sum.reverse();

    Ok(Bits::from_raw(render(&sum, false)))
}

/// Subtract two unsigned bit-strings (`a - b`) with ripple borrow.
///
/// When `a < b` the operands are swapped and the result carries the sign
/// marker. Leading zeros are stripped; a zero difference is `"0"`.
pub fn sub_binary(a: &str, b: &str) -> Result<Bits, CodecError> {
    let a = unsigned_digits(a)?;
    let b = unsigned_digits(b)?;

    let (minuend, subtrahend, negative) = if is_smaller(&a, &b) {
        (b, a, true)
    } else {
        (a, b, false)
    };
    let (minuend, subtrahend) = pad_equal(minuend, subtrahend);

    let mut diff = Vec::with_capacity(minuend.len());
    let mut borrow = 0i8;
    for (x, y) in minuend.iter().rev().zip(subtrahend.iter().rev()) {
        let mut d = *x as i8 - (*y as i8 + borrow);
        if d < 0 {
            d += 2;
            borrow = 1;
        } else {
            borrow = 0;
        }
        diff.push(d as u8);
    }
    debug_assert_eq!(borrow, 0, "minuend was not the larger operand");
    diff.reverse();

    Ok(Bits::from_raw(render(&diff, negative)))
}

/// Magnitude comparison on digit strings: after stripping leading zeros the
/// shorter string is smaller, equal lengths compare digit by digit.
fn is_smaller(a: &[u8], b: &[u8]) -> bool {
    let a = strip_leading_zeros(a);
    let b = strip_leading_zeros(b);
    if a.len() != b.len() {
        return a.len() < b.len();
    }
    a < b
}

fn strip_leading_zeros(digits: &[u8]) -> &[u8] {
    let first_one = digits.iter().position(|&d| d == 1).unwrap_or(digits.len());
    &digits[first_one..]
}

fn unsigned_digits(bits: &str) -> Result<Vec<u8>, CodecError> {
    if bits.starts_with(SIGN_MARKER) {
        return Err(CodecError::Signed(bits.to_string()));
    }
    if bits.is_empty() {
        return Err(CodecError::Empty);
    }
    bits.chars()
        .map(|c| match c {
            '0' => Ok(0),
            '1' => Ok(1),
            _ => Err(CodecError::InvalidDigit(c)),
        })
        .collect()
}

fn pad_equal(a: Vec<u8>, b: Vec<u8>) -> (Vec<u8>, Vec<u8>) {
    let width = a.len().max(b.len());
    (zero_extend(a, width), zero_extend(b, width))
}

fn zero_extend(digits: Vec<u8>, width: usize) -> Vec<u8> {
    if digits.len() >= width {
        return digits;
    }
    let mut padded = vec![0; width - digits.len()];
    padded.extend(digits);
    padded
}

fn render(digits: &[u8], negative: bool) -> String {
    let significant = strip_leading_zeros(digits);
    let mut out = String::with_capacity(significant.len() + 1);
    if significant.is_empty() {
        out.push('0');
        return out;
    }
    if negative {
        out.push(SIGN_MARKER);
    }
    out.extend(significant.iter().map(|&d| if d == 1 { '1' } else { '0' }));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_simple() {
        assert_eq!(add_binary("0111", "0011").unwrap().as_str(), "1010");
        assert_eq!(add_binary("0", "0").unwrap().as_str(), "0");
        assert_eq!(add_binary("0001", "0001").unwrap().as_str(), "10");
    }

    #[test]
    fn test_add_final_carry() {
        // 15 + 1 overflows four digits and grows a fifth
        assert_eq!(add_binary("1111", "0001").unwrap().as_str(), "10000");
        assert_eq!(add_binary("1", "1").unwrap().as_str(), "10");
    }

    #[test]
    fn test_add_unequal_lengths() {
        assert_eq!(add_binary("1", "1000").unwrap().as_str(), "1001");
    }

    #[test]
    fn test_sub_positive() {
        assert_eq!(sub_binary("0111", "0011").unwrap().as_str(), "100");
        assert_eq!(sub_binary("1000", "1").unwrap().as_str(), "111");
    }

    #[test]
    fn test_sub_cancels_to_zero() {
        assert_eq!(sub_binary("0101", "101").unwrap().as_str(), "0");
    }

    #[test]
    fn test_sub_negative() {
        assert_eq!(sub_binary("0011", "0111").unwrap().as_str(), "-100");
        assert_eq!(sub_binary("0", "1").unwrap().as_str(), "-1");
    }

    #[test]
    fn test_magnitude_ignores_leading_zeros() {
        // "0010" is shorter than "011" once stripped, so it is the smaller
        assert_eq!(sub_binary("0010", "011").unwrap().as_str(), "-1");
    }

    #[test]
    fn test_signed_operand_rejected() {
        assert!(matches!(add_binary("-1", "1"), Err(CodecError::Signed(_))));
        assert!(matches!(sub_binary("1", "-1"), Err(CodecError::Signed(_))));
        assert_eq!(add_binary("12", "1"), Err(CodecError::InvalidDigit('2')));
    }
}
