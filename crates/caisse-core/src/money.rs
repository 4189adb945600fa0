//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  Summing a day of tickets in floating point:                            │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  A register variance of "-0.0000001" is neither balanced nor a          │
//! │  shortfall. Reconciliation needs exact arithmetic.                      │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    Decimal text is parsed ONCE at the boundary, then every sum,        │
//! │    difference and comparison is done on i64 cents.                     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Boundary Conversions
//! | Direction | Function | Rule |
//! |-----------|----------|------|
//! | text → cents | [`Money::parse_decimal`] | `.` or `,` separator, half away from zero past 2 decimals |
//! | float → cents | [`Money::from_decimal`] | `round(value * 100)`, finite values only |
//! | cents → text | [`Money::to_decimal_string`] | fixed 2 decimals |

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::types::TaxRate;

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit (cents).
///
/// ## Design Decisions
/// - **i64 (signed)**: corrections and refunds are negative
/// - **Single field tuple struct**: zero-cost abstraction over i64
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use caisse_core::money::Money;
    ///
    /// let fund = Money::from_cents(15000); // 150.00
    /// assert_eq!(fund.cents(), 15000);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion (truncated toward zero).
    #[inline]
    pub const fn units(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    ///
    /// ## Example
    /// ```rust
    /// use caisse_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(-550).cents_part(), 50);
    /// ```
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Parses operator-entered decimal text into cents.
    ///
    /// ## Accepted Input
    /// - Optional leading `+` or `-`
    /// - Integer digits, optionally followed by `.` or `,` and fraction digits
    /// - Surrounding whitespace is ignored
    ///
    /// More than two fraction digits are rounded half away from zero,
    /// matching `round(value * 100)` on the decimal value.
    ///
    /// ## Example
    /// ```rust
    /// use caisse_core::money::Money;
    ///
    /// assert_eq!(Money::parse_decimal("116.50").unwrap().cents(), 11650);
    /// assert_eq!(Money::parse_decimal("-5").unwrap().cents(), -500);
    /// assert_eq!(Money::parse_decimal("0,005").unwrap().cents(), 1);
    /// assert!(Money::parse_decimal("12.3.4").is_err());
    /// ```
    pub fn parse_decimal(input: &str) -> Result<Money, ValidationError> {
        let invalid = |reason: &str| ValidationError::InvalidFormat {
            field: "amount".to_string(),
            reason: reason.to_string(),
        };

        let text = input.trim();
        let (negative, body) = match text.as_bytes().first() {
            Some(b'-') => (true, &text[1..]),
            Some(b'+') => (false, &text[1..]),
            Some(_) => (false, text),
            None => {
                return Err(ValidationError::Required {
                    field: "amount".to_string(),
                })
            }
        };

        let (int_part, frac_part) = match body.find(|c| c == '.' || c == ',') {
            Some(pos) => (&body[..pos], &body[pos + 1..]),
            None => (body, ""),
        };

        if int_part.is_empty() && frac_part.is_empty() {
            return Err(invalid("expected digits"));
        }
        if !int_part.bytes().all(|b| b.is_ascii_digit())
            || !frac_part.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid("expected a decimal number"));
        }

        let units: i128 = if int_part.is_empty() {
            0
        } else {
            int_part
                .parse()
                .map_err(|_| invalid("number is too large"))?
        };

        let digits: Vec<i128> = frac_part.bytes().map(|b| (b - b'0') as i128).collect();
        let tenths = digits.first().copied().unwrap_or(0);
        let hundredths = digits.get(1).copied().unwrap_or(0);
        let round_up = digits.get(2).is_some_and(|d| *d >= 5);

        let magnitude = units
            .checked_mul(100)
            .map(|c| c + tenths * 10 + hundredths + i128::from(round_up))
            .ok_or_else(|| invalid("number is too large"))?;

        let cents = if negative { -magnitude } else { magnitude };
        i64::try_from(cents)
            .map(Money)
            .map_err(|_| invalid("number is too large"))
    }

    /// Converts a decimal value received from an untyped boundary
    /// (JSON number, form field) into cents: `round(value * 100)`.
    ///
    /// Rounding is half away from zero. Non-finite input is rejected.
    pub fn from_decimal(value: f64) -> Result<Money, ValidationError> {
        if !value.is_finite() {
            return Err(ValidationError::InvalidFormat {
                field: "amount".to_string(),
                reason: "must be a finite number".to_string(),
            });
        }

        let cents = (value * 100.0).round();
        if cents.abs() > i64::MAX as f64 {
            return Err(ValidationError::InvalidFormat {
                field: "amount".to_string(),
                reason: "number is too large".to_string(),
            });
        }

        Ok(Money(cents as i64))
    }

    /// Formats the value with exactly two decimals and no currency symbol.
    ///
    /// ## Example
    /// ```rust
    /// use caisse_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(11650).to_decimal_string(), "116.50");
    /// assert_eq!(Money::from_cents(-5).to_decimal_string(), "-0.05");
    /// ```
    pub fn to_decimal_string(&self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        format!("{}{}.{:02}", sign, self.units().abs(), self.cents_part())
    }

    /// Splits a tax-inclusive (TTC) amount into its net (HT) and tax (TVA)
    /// parts.
    ///
    /// ## Implementation
    /// `tva = round(ttc * bps / (10000 + bps))`, half away from zero,
    /// and `ht = ttc - tva` so that `ht + tva == ttc` holds exactly.
    ///
    /// ## Example
    /// ```rust
    /// use caisse_core::money::Money;
    /// use caisse_core::types::TaxRate;
    ///
    /// // 11.00 TTC at 10% → 10.00 HT + 1.00 TVA
    /// let (ht, tva) = Money::from_cents(1100).split_inclusive_tax(TaxRate::from_bps(1000));
    /// assert_eq!((ht.cents(), tva.cents()), (1000, 100));
    /// ```
    pub fn split_inclusive_tax(&self, rate: TaxRate) -> (Money, Money) {
        // i128 so that large gross amounts cannot overflow the product
        let numerator = self.0 as i128 * rate.bps() as i128;
        let denominator = 10_000 + rate.bps() as i128;
        let tax = div_round_half_away(numerator, denominator) as i64;
        (Money(self.0 - tax), Money(tax))
    }
}

/// Integer division rounding half away from zero. `den` must be positive.
fn div_round_half_away(num: i128, den: i128) -> i128 {
    if num >= 0 {
        (num + den / 2) / den
    } else {
        -((-num + den / 2) / den)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display uses the fixed two-decimal form. The currency symbol is a
/// presentation concern and is added by the caller.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_decimal_string())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
        assert_eq!(money.units(), 10);
        assert_eq!(money.cents_part(), 99);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(1099).to_string(), "10.99");
        assert_eq!(Money::from_cents(500).to_string(), "5.00");
        assert_eq!(Money::from_cents(-550).to_string(), "-5.50");
        assert_eq!(Money::from_cents(-5).to_string(), "-0.05");
        assert_eq!(Money::from_cents(0).to_string(), "0.00");
    }

    #[test]
    fn test_arithmetic_and_sum() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((-a).cents(), -1000);

        let total: Money = [a, b, Money::from_cents(-150)].into_iter().sum();
        assert_eq!(total.cents(), 1350);
    }

    #[test]
    fn test_parse_decimal_separators() {
        assert_eq!(Money::parse_decimal("115.00").unwrap().cents(), 11500);
        assert_eq!(Money::parse_decimal("115,5").unwrap().cents(), 11550);
        assert_eq!(Money::parse_decimal(" 7 ").unwrap().cents(), 700);
        assert_eq!(Money::parse_decimal(".25").unwrap().cents(), 25);
        assert_eq!(Money::parse_decimal("3.").unwrap().cents(), 300);
        assert_eq!(Money::parse_decimal("+2.10").unwrap().cents(), 210);
    }

    #[test]
    fn test_parse_decimal_rounds_half_away_from_zero() {
        assert_eq!(Money::parse_decimal("1.005").unwrap().cents(), 101);
        assert_eq!(Money::parse_decimal("1.0049").unwrap().cents(), 100);
        assert_eq!(Money::parse_decimal("-1.005").unwrap().cents(), -101);
        assert_eq!(Money::parse_decimal("-0.004").unwrap().cents(), 0);
    }

    #[test]
    fn test_parse_decimal_rejects_garbage() {
        assert!(Money::parse_decimal("").is_err());
        assert!(Money::parse_decimal("-").is_err());
        assert!(Money::parse_decimal("abc").is_err());
        assert!(Money::parse_decimal("1.2.3").is_err());
        assert!(Money::parse_decimal("1e5").is_err());
        assert!(Money::parse_decimal("99999999999999999999").is_err());
    }

    #[test]
    fn test_from_decimal() {
        assert_eq!(Money::from_decimal(116.5).unwrap().cents(), 11650);
        assert_eq!(Money::from_decimal(-5.0).unwrap().cents(), -500);
        assert_eq!(Money::from_decimal(0.125).unwrap().cents(), 13);
        assert!(Money::from_decimal(f64::NAN).is_err());
        assert!(Money::from_decimal(f64::INFINITY).is_err());
    }

    #[test]
    fn test_split_inclusive_tax() {
        // 10% restaurant rate
        let (ht, tva) = Money::from_cents(1100).split_inclusive_tax(TaxRate::from_bps(1000));
        assert_eq!((ht.cents(), tva.cents()), (1000, 100));

        // 5.5% take-away rate: 4.50 TTC → 0.2346... → 0.23 TVA
        let (ht, tva) = Money::from_cents(450).split_inclusive_tax(TaxRate::from_bps(550));
        assert_eq!(tva.cents(), 23);
        assert_eq!(ht.cents() + tva.cents(), 450);

        // refunds split symmetrically
        let (ht, tva) = Money::from_cents(-1100).split_inclusive_tax(TaxRate::from_bps(1000));
        assert_eq!((ht.cents(), tva.cents()), (-1000, -100));
    }

    #[test]
    fn test_zero_and_checks() {
        let zero = Money::zero();
        assert!(zero.is_zero());
        assert!(!zero.is_positive());
        assert!(!zero.is_negative());

        let negative = Money::from_cents(-100);
        assert!(negative.is_negative());
        assert_eq!(negative.abs().cents(), 100);
    }

    proptest! {
        /// Formatting then parsing returns the original cents.
        #[test]
        fn prop_decimal_round_trip(cents in 0i64..=10_000_000) {
            let money = Money::from_cents(cents);
            let parsed = Money::parse_decimal(&money.to_decimal_string()).unwrap();
            prop_assert_eq!(parsed, money);
        }

        #[test]
        fn prop_negative_round_trip(cents in -10_000_000i64..0) {
            let money = Money::from_cents(cents);
            prop_assert_eq!(Money::parse_decimal(&money.to_string()).unwrap(), money);
        }

        /// HT + TVA always reconstructs the gross amount.
        #[test]
        fn prop_split_is_exact(cents in -10_000_000i64..=10_000_000, bps in 0u32..=3000) {
            let (ht, tva) = Money::from_cents(cents).split_inclusive_tax(TaxRate::from_bps(bps));
            prop_assert_eq!(ht + tva, Money::from_cents(cents));
        }
    }
}
