//! Fixed-point monetary values stored on the card.
//!
//! The card stores amounts as unsigned integers with three implied fractional digits.
//! Fields may be wider than any native integer.

use std::fmt::{Display, Formatter};

use num_bigint::BigUint;

/// Number of implied fractional digits, i.e. the divisor is 10^3.
pub const FRACTION_DIGITS: usize = 3;

/// A decoded amount, equal to the big-endian integer of the source bytes divided by 1000.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Value(BigUint);

impl Value {
    /// Returns the raw integer (the amount times 1000) in decimal notation.
    pub fn to_scaled_string(&self) -> String {
        self.0.to_string()
    }
}

impl<'a> From<&'a [u8]> for Value {
    fn from(bytes: &'a [u8]) -> Self {
        decode(bytes)
    }
}

/// Formats the amount as the shortest decimal: no trailing fractional zeros, no dangling point.
impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let digits = format!(
            "{:0>width$}",
            self.to_scaled_string(),
            width = FRACTION_DIGITS + 1
        );
        let (integer, fraction) = digits.split_at(digits.len() - FRACTION_DIGITS);
        let fraction = fraction.trim_end_matches('0');

        match fraction.is_empty() {
            true => write!(f, "{}", integer),
            _ => write!(f, "{}.{}", integer, fraction),
        }
    }
}

/// Decodes the bytes, most significant first, as an unsigned integer scaled by 1/1000.
/// An empty sequence decodes to zero.
pub fn decode(bytes: &[u8]) -> Value {
    Value(BigUint::from_bytes_be(bytes))
}
