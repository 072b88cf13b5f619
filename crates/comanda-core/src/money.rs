//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  0.1 + 0.2 = 0.30000000000000004                                        │
//! │                                                                         │
//! │  A weighted-average lot cost recomputed after every deduction would     │
//! │  accumulate that drift into every profit figure in the sales ledger.    │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    Every amount is i64 cents. Derived amounts (cost of 0.125 kg at     │
//! │    13.37/kg, average of several lots) are rounded half-to-even once,   │
//! │    at the point they are produced.                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use comanda_core::money::Money;
//! use comanda_core::quantity::Quantity;
//!
//! let per_kg = Money::from_cents(1250);          // 12.50 per kg
//! let cost = per_kg.times_quantity(Quantity::from_milli(100)); // 0.1 kg
//! assert_eq!(cost.cents(), 125);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

use crate::quantity::{Quantity, MILLI_PER_UNIT};

// =============================================================================
// Rounding
// =============================================================================

/// Integer division rounding half to even.
///
/// ```text
///   0.5 → 0, 1.5 → 2, 2.5 → 2, -1.5 → -2
/// ```
///
/// `denominator` must be positive.
pub(crate) fn div_round_half_even(numerator: i128, denominator: i128) -> i128 {
    debug_assert!(denominator > 0);
    let quotient = numerator.div_euclid(denominator);
    let remainder = numerator.rem_euclid(denominator);
    let twice = remainder * 2;

    if twice > denominator || (twice == denominator && quotient % 2 != 0) {
        quotient + 1
    } else {
        quotient
    }
}

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit (cents).
///
/// ## Design Decisions
/// - **i64 (signed)**: profit can be negative
/// - **Single field tuple struct**: Zero-cost abstraction over i64
///
/// ## Where Money is Used
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Purchase total ──► Lot.unit_cost ──► Ingredient.average_cost           │
/// │                                             │                           │
/// │                                             ▼                           │
/// │  Product.price ──► Sale.revenue     Sale.unit_cost ──► Sale.cost        │
/// │                          │                                 │            │
/// │                          └──────────► Sale.profit ◄────────┘            │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    ///
    /// ```rust
    /// use comanda_core::money::Money;
    ///
    /// let price = Money::from_cents(1099);
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from major and minor units.
    ///
    /// For negative amounts only the major unit carries the sign:
    /// `from_major_minor(-5, 50)` is -5.50.
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion.
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn minor(&self) -> i64 {
        (self.0 % 100).abs()
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies money by a whole item count (e.g. price × 3 pizzas).
    ///
    /// ```rust
    /// use comanda_core::money::Money;
    ///
    /// let line_total = Money::from_cents(299).multiply_quantity(3);
    /// assert_eq!(line_total.cents(), 897);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Cost of `quantity` stock units when `self` is the price of one unit.
    ///
    /// ```rust
    /// use comanda_core::money::Money;
    /// use comanda_core::quantity::Quantity;
    ///
    /// // 0.125 kg at 13.37/kg = 1.67125 → 1.67
    /// let cost = Money::from_cents(1337).times_quantity(Quantity::from_milli(125));
    /// assert_eq!(cost.cents(), 167);
    /// ```
    pub fn times_quantity(&self, quantity: Quantity) -> Money {
        let scaled = self.0 as i128 * quantity.milli() as i128;
        Money(div_round_half_even(scaled, MILLI_PER_UNIT as i128) as i64)
    }

    /// Price of one stock unit given the total paid for `quantity` units.
    ///
    /// Returns `None` when `quantity` is not positive.
    ///
    /// ```rust
    /// use comanda_core::money::Money;
    /// use comanda_core::quantity::Quantity;
    ///
    /// // 2.5 kg for 50.00 → 20.00 per kg
    /// let unit = Money::from_cents(5000).per_unit_of(Quantity::from_milli(2500));
    /// assert_eq!(unit, Some(Money::from_cents(2000)));
    /// ```
    pub fn per_unit_of(&self, quantity: Quantity) -> Option<Money> {
        if !quantity.is_positive() {
            return None;
        }
        let scaled = self.0 as i128 * MILLI_PER_UNIT as i128;
        Some(Money(
            div_round_half_even(scaled, quantity.milli() as i128) as i64,
        ))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Plain decimal rendering; currency symbols are a display concern.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.major().abs(), self.minor())
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
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
        assert_eq!(money.major(), 10);
        assert_eq!(money.minor(), 99);
    }

    #[test]
    fn test_from_major_minor() {
        assert_eq!(Money::from_major_minor(10, 99).cents(), 1099);
        assert_eq!(Money::from_major_minor(-5, 50).cents(), -550);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(1099).to_string(), "10.99");
        assert_eq!(Money::from_cents(500).to_string(), "5.00");
        assert_eq!(Money::from_cents(-550).to_string(), "-5.50");
        assert_eq!(Money::zero().to_string(), "0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((a * 3).cents(), 3000);

        let total: Money = vec![a, b, b].into_iter().sum();
        assert_eq!(total.cents(), 2000);
    }

    #[test]
    fn test_round_half_even() {
        assert_eq!(div_round_half_even(5, 10), 0);
        assert_eq!(div_round_half_even(15, 10), 2);
        assert_eq!(div_round_half_even(25, 10), 2);
        assert_eq!(div_round_half_even(26, 10), 3);
        assert_eq!(div_round_half_even(-15, 10), -2);
        assert_eq!(div_round_half_even(-25, 10), -2);
    }

    #[test]
    fn test_times_quantity() {
        let per_kg = Money::from_cents(1250);
        assert_eq!(per_kg.times_quantity(Quantity::from_milli(100)).cents(), 125);
        assert_eq!(per_kg.times_quantity(Quantity::from_units(3)).cents(), 3750);
        assert_eq!(per_kg.times_quantity(Quantity::zero()).cents(), 0);
    }

    #[test]
    fn test_per_unit_of() {
        let total = Money::from_cents(1000);
        assert_eq!(
            total.per_unit_of(Quantity::from_units(3)),
            Some(Money::from_cents(333))
        );
        assert_eq!(total.per_unit_of(Quantity::zero()), None);
        assert_eq!(total.per_unit_of(Quantity::from_milli(-1)), None);
    }

    #[test]
    fn test_zero_and_checks() {
        assert!(Money::zero().is_zero());
        assert!(Money::from_cents(100).is_positive());
        assert!(Money::from_cents(-100).is_negative());
    }
}
