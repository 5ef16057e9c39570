//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  With floats:                                                           │
//! │    100000 × 0.1 may come out as 10000.000000000002                     │
//! │    floor() of a value that should be exact becomes a coin toss         │
//! │                                                                         │
//! │  OUR SOLUTION: Integer amounts + basis-point rates                     │
//! │    100000 × 1000 / 10000 = 10000 (exact)                               │
//! │    Remainders are floored explicitly, never hidden                     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The storefront sells in CFA francs, which have no minor unit, so one
//! `Money` unit is one franc.
//!
//! ## Usage
//! ```rust
//! use shopfront_core::money::Money;
//!
//! let price = Money::from_amount(10_000);
//! let line = price.multiply_quantity(3);
//! assert_eq!(line.amount(), 30_000);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

use crate::types::DiscountRate;
use crate::BPS_SCALE;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit.
///
/// ## Design Decisions
/// - **i64 (signed)**: Allows negative values for discounts shown as lines
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Derives**: Full serde support for JSON serialization
///
/// ## Where Money Flows
/// ```text
/// Product.price ──┬──► effective unit price ──► line subtotal
///                 │                                  │
/// Product.promo ──┘                                  ▼
///                                   Σ subtotal ──► − coupon discount ──► total
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from an integer amount.
    ///
    /// ## Example
    /// ```rust
    /// use shopfront_core::money::Money;
    ///
    /// let price = Money::from_amount(250_000);
    /// assert_eq!(price.amount(), 250_000);
    /// ```
    #[inline]
    pub const fn from_amount(amount: i64) -> Self {
        Money(amount)
    }

    /// Returns the raw integer amount.
    #[inline]
    pub const fn amount(&self) -> i64 {
        self.0
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

    /// Multiplies money by a quantity.
    ///
    /// Prices are capped at [`MAX_PRICE`](crate::MAX_PRICE) and quantities
    /// by validated [`CartLimits`](crate::CartLimits), so cart arithmetic
    /// stays inside `i64`.
    ///
    /// ## Example
    /// ```rust
    /// use shopfront_core::money::Money;
    ///
    /// let unit_price = Money::from_amount(8_000);
    /// assert_eq!(unit_price.multiply_quantity(3).amount(), 24_000);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Returns `floor(self × rate)`.
    ///
    /// This is the amount a coupon takes off. Flooring means the customer
    /// never gets more than the advertised fraction.
    ///
    /// ## Example
    /// ```rust
    /// use shopfront_core::money::Money;
    /// use shopfront_core::types::DiscountRate;
    ///
    /// let total = Money::from_amount(12_345);
    /// let rate = DiscountRate::from_bps(1000); // 10%
    ///
    /// // 1234.5 floors to 1234
    /// assert_eq!(total.discount_amount(rate).amount(), 1_234);
    /// ```
    pub fn discount_amount(&self, rate: DiscountRate) -> Money {
        // i128 keeps large carts from overflowing before the division
        let raw = self.0 as i128 * rate.bps() as i128;
        Money(raw.div_euclid(BPS_SCALE as i128) as i64)
    }

    /// Applies a discount and returns what is left to pay.
    ///
    /// ## Example
    /// ```rust
    /// use shopfront_core::money::Money;
    /// use shopfront_core::types::DiscountRate;
    ///
    /// let total = Money::from_amount(100_000);
    /// let discounted = total.apply_discount(DiscountRate::from_bps(1000));
    /// assert_eq!(discounted.amount(), 90_000);
    /// ```
    pub fn apply_discount(&self, rate: DiscountRate) -> Money {
        *self - self.discount_amount(rate)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display groups thousands with a space and suffixes the currency,
/// the way prices are printed on the storefront: `250 000 FCFA`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.0.unsigned_abs().to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push(' ');
            }
            grouped.push(ch);
        }
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{} FCFA", sign, grouped)
    }
}

/// Default money is zero.
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

/// Multiplication by quantity.
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Money::from_amount(250_000).to_string(), "250 000 FCFA");
        assert_eq!(Money::from_amount(1_000).to_string(), "1 000 FCFA");
        assert_eq!(Money::from_amount(999).to_string(), "999 FCFA");
        assert_eq!(Money::from_amount(-15_000).to_string(), "-15 000 FCFA");
        assert_eq!(Money::zero().to_string(), "0 FCFA");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_amount(10_000);
        let b = Money::from_amount(5_000);

        assert_eq!((a + b).amount(), 15_000);
        assert_eq!((a - b).amount(), 5_000);
        assert_eq!((a * 3).amount(), 30_000);

        let total: Money = [a, b, b].into_iter().sum();
        assert_eq!(total.amount(), 20_000);
    }

    #[test]
    fn test_discount_is_floored() {
        let rate = DiscountRate::from_bps(1000);

        assert_eq!(Money::from_amount(100_000).discount_amount(rate).amount(), 10_000);
        // 999 × 10% = 99.9 → 99
        assert_eq!(Money::from_amount(999).discount_amount(rate).amount(), 99);
        // 9 × 10% = 0.9 → 0
        assert_eq!(Money::from_amount(9).discount_amount(rate).amount(), 0);
    }

    #[test]
    fn test_apply_discount() {
        let total = Money::from_amount(100_000);
        assert_eq!(total.apply_discount(DiscountRate::from_bps(1000)).amount(), 90_000);
        assert_eq!(total.apply_discount(DiscountRate::from_bps(2500)).amount(), 75_000);

        // Flooring the discount rounds the amount due up
        let odd = Money::from_amount(12_345);
        assert_eq!(odd.apply_discount(DiscountRate::from_bps(1000)).amount(), 11_111);
    }

    #[test]
    fn test_large_amounts_do_not_overflow() {
        let total = Money::from_amount(i64::MAX / 2);
        let discount = total.discount_amount(DiscountRate::from_bps(9_999));
        assert!(discount < total);
        assert!(discount.is_positive());
    }

    #[test]
    fn test_zero_and_checks() {
        assert!(Money::zero().is_zero());
        assert!(Money::from_amount(100).is_positive());
        assert!(Money::from_amount(-100).is_negative());
    }
}
