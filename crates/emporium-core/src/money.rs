//! # Money
//!
//! Prices travel as whole cents. Decimal input is parsed exactly once, at the
//! edge, and every sum after that is integer arithmetic.
//!
//! ```text
//!  "9.99" ──parse_decimal──► Money(999) ──× 2──► Money(1998) ──Display──► "$19.98"
//! ```
//!
//! ```rust
//! use emporium_core::money::Money;
//!
//! let price = Money::parse_decimal("9.99").unwrap();
//! assert_eq!(price, Money::from_cents(999));
//! assert_eq!((price * 2).to_string(), "$19.98");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Mul};
use ts_rs::TS;

use crate::error::ValidationError;

/// An amount in cents.
///
/// Product validation keeps prices in `0..=MAX_PRICE_CENTS`, so a single
/// line total always fits. Arithmetic saturates at the `i64` bounds rather
/// than wrapping for amounts that didn't pass through validation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Parses a decimal amount such as `"9.99"`, `"10"`, `"0.5"` or `".75"`.
    ///
    /// More than two fractional digits is an error rather than a rounding.
    /// A leading `-` is accepted here and left for validation to reject.
    ///
    /// ```rust
    /// use emporium_core::money::Money;
    ///
    /// assert_eq!(Money::parse_decimal("0.5").unwrap().cents(), 50);
    /// assert!(Money::parse_decimal("1.999").is_err());
    /// ```
    pub fn parse_decimal(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        let invalid = |reason: String| ValidationError::InvalidFormat {
            field: "price".to_string(),
            reason,
        };
        let not_decimal = || invalid(format!("'{}' is not a decimal amount", trimmed));

        let (negative, digits) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };
        let (whole, fraction) = digits.split_once('.').unwrap_or((digits, ""));

        if whole.is_empty() && fraction.is_empty() {
            return Err(not_decimal());
        }
        if fraction.len() > 2 {
            return Err(invalid("at most two decimal places are allowed".to_string()));
        }
        if !whole.bytes().chain(fraction.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(not_decimal());
        }

        let whole: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| not_decimal())?
        };
        // One fractional digit is tenths: "0.5" is 50 cents
        let fraction: i64 = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<i64>().map_err(|_| not_decimal())? * 10,
            _ => fraction.parse().map_err(|_| not_decimal())?,
        };

        let cents = whole
            .checked_mul(100)
            .and_then(|c| c.checked_add(fraction))
            .ok_or_else(not_decimal)?;

        Ok(Money(if negative { -cents } else { cents }))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}${}.{:02}", sign, abs / 100, abs % 100)
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0.saturating_add(other.0))
    }
}

/// Unit price times line quantity.
impl Mul<u32> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: u32) -> Self {
        Money(self.0.saturating_mul(i64::from(qty)))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(1099).to_string(), "$10.99");
        assert_eq!(Money::from_cents(500).to_string(), "$5.00");
        assert_eq!(Money::from_cents(-550).to_string(), "-$5.50");
        assert_eq!(Money::from_cents(-5).to_string(), "-$0.05");
        assert_eq!(Money::zero().to_string(), "$0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        assert_eq!((a + Money::from_cents(500)).cents(), 1500);
        assert_eq!((a * 3).cents(), 3000);
    }

    #[test]
    fn test_arithmetic_saturates() {
        let huge = Money::from_cents(i64::MAX - 1);
        assert_eq!((huge * 2).cents(), i64::MAX);
        assert_eq!((huge * u32::MAX).cents(), i64::MAX);
        assert_eq!((huge + Money::from_cents(10)).cents(), i64::MAX);
        assert_eq!((Money::from_cents(-5) * u32::MAX).cents(), -5 * i64::from(u32::MAX));

        let total: Money = [huge, huge, huge].into_iter().sum();
        assert_eq!(total.cents(), i64::MAX);
    }

    #[test]
    fn test_sum_of_line_totals() {
        let total: Money = [999, 1998, 1].into_iter().map(Money::from_cents).sum();
        assert_eq!(total.cents(), 2998);

        let empty: Money = std::iter::empty().sum();
        assert!(empty.is_zero());
    }

    #[test]
    fn test_parse_decimal() {
        assert_eq!(Money::parse_decimal("9.99").unwrap().cents(), 999);
        assert_eq!(Money::parse_decimal("10").unwrap().cents(), 1000);
        assert_eq!(Money::parse_decimal("0.5").unwrap().cents(), 50);
        assert_eq!(Money::parse_decimal(".75").unwrap().cents(), 75);
        assert_eq!(Money::parse_decimal(" 12.30 ").unwrap().cents(), 1230);
        assert_eq!(Money::parse_decimal("-1.25").unwrap().cents(), -125);
    }

    #[test]
    fn test_parse_decimal_rejects_garbage() {
        for input in ["", ".", "-", "1.234", "1e3", "12,50", "+3", "99999999999999999999"] {
            assert!(Money::parse_decimal(input).is_err(), "{:?} should fail", input);
        }
    }

    #[test]
    fn test_no_float_drift() {
        let price = Money::parse_decimal("9.99").unwrap();
        assert_eq!((price * 2).to_string(), "$19.98");
    }
}
