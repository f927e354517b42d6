//! # Money Module
//!
//! Provides the `Money` type and the host-configured `Rounding` policy.
//!
//! ## Why Decimal Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  Subscription discounts also need fractions of a cent mid-calculation: │
//! │    $15 coupon split over lines worth $10 / $20 / $30                    │
//! │    → shares of 1/6, 2/6, 3/6 → $2.50, $5.00, $7.50                      │
//! │                                                                         │
//! │  OUR SOLUTION: exact decimals, rounded ONCE at the very end with the   │
//! │  precision and mode the host store is configured for.                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use subcoupon_core::money::{Money, Rounding, RoundingMode};
//! use subcoupon_core::types::Percent;
//!
//! let price = Money::from_cents(1099); // $10.99
//! let line = price * 3u32;             // $32.97
//! assert_eq!(line, Money::from_cents(3297));
//!
//! let rounding = Rounding::new(2, RoundingMode::HalfUp);
//! let fee = Money::from_cents(999).percentage(Percent::from_whole(15)); // 1.4985
//! assert_eq!(fee.round(rounding), Money::from_cents(150));
//! ```

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub};
use std::str::FromStr;

use crate::error::ValidationError;
use crate::types::Percent;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in major currency units (dollars for USD).
///
/// ## Design Decisions
/// - **Decimal (signed)**: negative values for refunds, exact percentages
/// - **Single field tuple struct**: zero-cost wrapper
/// - **No implicit rounding**: arithmetic stays exact until [`Money::round`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ```rust
    /// use subcoupon_core::money::Money;
    ///
    /// let price = Money::from_cents(1099); // $10.99
    /// assert_eq!(price.to_string(), "$10.99");
    /// ```
    #[inline]
    pub fn from_cents(cents: i64) -> Self {
        Money(Decimal::new(cents, 2))
    }

    /// Wraps an exact decimal amount in major units.
    #[inline]
    pub const fn from_decimal(amount: Decimal) -> Self {
        Money(amount)
    }

    /// Returns the exact decimal amount in major units.
    #[inline]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(Decimal::ZERO)
    }

    /// Checks if the value is zero.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// Multiplies money by a quantity.
    #[inline]
    pub fn multiply_quantity(&self, qty: u32) -> Self {
        Money(self.0 * Decimal::from(qty))
    }

    /// Returns `pct` percent of this amount, exactly (no rounding).
    ///
    /// ```rust
    /// use subcoupon_core::money::Money;
    /// use subcoupon_core::types::Percent;
    ///
    /// let fee = Money::from_cents(2000);
    /// assert_eq!(fee.percentage(Percent::from_whole(50)), Money::from_cents(1000));
    /// ```
    pub fn percentage(&self, pct: Percent) -> Money {
        Money(self.0 * pct.value() / Decimal::ONE_HUNDRED)
    }

    /// Rounds the amount using the host's rounding policy.
    #[inline]
    pub fn round(&self, rounding: Rounding) -> Money {
        Money(rounding.apply(self.0))
    }

    /// Loose equality: true when both amounts differ by less than `epsilon`.
    ///
    /// An `epsilon` of zero degrades to exact equality.
    pub fn approx_eq(&self, other: Money, epsilon: Money) -> bool {
        let diff = (self.0 - other.0).abs();
        diff == Decimal::ZERO || diff < epsilon.0.abs()
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display shows the amount rounded to cents, for logs and audit notes.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.is_negative() { "-" } else { "" };
        let rounded = self
            .0
            .abs()
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        write!(f, "{}${:.2}", sign, rounded)
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

/// Multiplication by a quantity.
impl Mul<u32> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: u32) -> Self {
        self.multiply_quantity(qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Rounding Policy
// =============================================================================

/// How a discount is rounded once it has been computed exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundingMode {
    /// Ties away from zero: 0.125 → 0.13.
    #[default]
    HalfUp,

    /// Ties to even (bankers): 0.125 → 0.12, 0.135 → 0.14.
    HalfEven,

    /// Truncate toward zero: 0.129 → 0.12.
    Down,
}

impl RoundingMode {
    fn strategy(self) -> RoundingStrategy {
        match self {
            RoundingMode::HalfUp => RoundingStrategy::MidpointAwayFromZero,
            RoundingMode::HalfEven => RoundingStrategy::MidpointNearestEven,
            RoundingMode::Down => RoundingStrategy::ToZero,
        }
    }
}

impl fmt::Display for RoundingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoundingMode::HalfUp => write!(f, "half_up"),
            RoundingMode::HalfEven => write!(f, "half_even"),
            RoundingMode::Down => write!(f, "down"),
        }
    }
}

impl FromStr for RoundingMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "half_up" | "half-up" => Ok(RoundingMode::HalfUp),
            "half_even" | "half-even" | "bankers" => Ok(RoundingMode::HalfEven),
            "down" | "truncate" => Ok(RoundingMode::Down),
            _ => Err(ValidationError::NotAllowed {
                field: "rounding mode".to_string(),
                allowed: vec![
                    "half_up".to_string(),
                    "half_even".to_string(),
                    "down".to_string(),
                ],
            }),
        }
    }
}

/// Precision and mode used for the final rounding step of every discount.
///
/// `decimal_places` counts places of the major unit, so a store showing
/// prices with 2 decimals and rounding discounts at 4 uses `decimal_places = 4`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rounding {
    pub decimal_places: u32,
    #[serde(default)]
    pub mode: RoundingMode,
}

/// Default number of places discounts are rounded to (price decimals + 2).
pub const DEFAULT_ROUNDING_PLACES: u32 = 4;

impl Rounding {
    #[inline]
    pub const fn new(decimal_places: u32, mode: RoundingMode) -> Self {
        Rounding {
            decimal_places,
            mode,
        }
    }

    /// Rounds an exact value.
    #[inline]
    pub fn apply(&self, value: Decimal) -> Decimal {
        value.round_dp_with_strategy(self.decimal_places, self.mode.strategy())
    }
}

impl Default for Rounding {
    fn default() -> Self {
        Rounding::new(DEFAULT_ROUNDING_PLACES, RoundingMode::HalfUp)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
