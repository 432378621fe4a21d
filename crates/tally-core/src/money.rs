//! # Money Module
//!
//! Provides the `Money` type for amounts read from the order schema.
//!
//! ## Why Decimal Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  Amounts are stored as decimal text ("12.345", "7.655").                │
//! │                                                                         │
//! │  Summed as f64:                                                         │
//! │    12.345 + 7.655 = 19.999999999999996 → rounds to 20.00 (by luck)     │
//! │    and every report row drifts a little differently                    │
//! │                                                                         │
//! │  OUR SOLUTION: rust_decimal                                             │
//! │    Parse → exact Decimal → sum everything → round ONCE to 2 places     │
//! │    12.345 + 7.655 = 20.000 → "20.00"                                   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use tally_core::money::Money;
//!
//! let a = Money::parse("12.345").unwrap();
//! let b = Money::parse("7.655").unwrap();
//! assert_eq!((a + b).to_fixed(), "20.00");
//! assert_eq!((a + b).with_symbol("¥"), "¥20.00");
//! ```

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub};
use std::str::FromStr;

use crate::error::{CoreError, CoreResult};

/// Decimal places shown for every monetary value.
pub const DISPLAY_SCALE: u32 = 2;

/// Decimal places kept when amounts are compared inside SQL.
///
/// Stored text is normalized to an integer of ten-thousandths
/// (`12.3456` → `123456`) on both sides of a comparison.
pub const COMPARE_SCALE: u32 = 4;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value with exact decimal arithmetic.
///
/// ## User Workflow Context
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │                    Where Money is Used                                  │
/// │                                                                         │
/// │  sale_order_payment.payment_amount (TEXT)                              │
/// │        │ Money::parse                                                   │
/// │        ▼                                                                │
/// │  Σ successful payments ──► rounded() ──► "20.00" / "¥20.00"            │
/// │                                                                         │
/// │  Amount filters ──► scaled_units() ──► bound as INTEGER in SQL         │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Money(Decimal);

impl Money {
    /// Wraps an exact decimal amount.
    #[inline]
    pub const fn new(amount: Decimal) -> Self {
        Money(amount)
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(Decimal::ZERO)
    }

    /// Parses stored decimal text, returning `None` for blank or malformed input.
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::money::Money;
    ///
    /// assert!(Money::parse(" 12.50 ").is_some());
    /// assert!(Money::parse("").is_none());
    /// assert!(Money::parse("twelve").is_none());
    /// ```
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        Decimal::from_str(raw).ok().map(Money)
    }

    /// Parses stored decimal text, reporting which field held the bad value.
    pub fn try_parse(field: &str, raw: &str) -> CoreResult<Self> {
        Self::parse(raw).ok_or_else(|| CoreError::InvalidAmount {
            field: field.to_string(),
            raw: raw.to_string(),
        })
    }

    /// Parses an optional column, logging and dropping malformed text.
    pub fn from_column(field: &str, raw: Option<&str>) -> Option<Self> {
        let raw = raw?;
        if raw.trim().is_empty() {
            return None;
        }
        match Self::try_parse(field, raw) {
            Ok(money) => Some(money),
            Err(err) => {
                tracing::warn!(error = %err, "Ignoring malformed amount");
                None
            }
        }
    }

    /// Rebuilds an amount from SQL-side scaled units (ten-thousandths).
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::money::Money;
    ///
    /// assert_eq!(Money::from_scaled_units(123460).to_fixed(), "12.35");
    /// // Ties at display precision go to the even cent.
    /// assert_eq!(Money::from_scaled_units(123450).to_fixed(), "12.34");
    /// ```
    #[inline]
    pub fn from_scaled_units(units: i64) -> Self {
        Money(Decimal::new(units, COMPARE_SCALE))
    }

    /// Returns the amount in scaled units (ten-thousandths).
    ///
    /// A fifth decimal of 5 or more rounds away from zero, the same rule the
    /// SQL side applies to stored text. `None` only when the value does not
    /// fit an `i64`.
    pub fn scaled_units(&self) -> Option<i64> {
        let scaled = self
            .0
            .round_dp_with_strategy(COMPARE_SCALE, RoundingStrategy::MidpointAwayFromZero)
            .checked_mul(Decimal::from(10_i64.pow(COMPARE_SCALE)))?;
        scaled.to_i64()
    }

    /// Returns the underlying decimal.
    #[inline]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Checks if the value is zero.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Rounds to display precision with Bankers Rounding.
    ///
    /// ## Bankers Rounding Explained
    /// ```text
    /// ┌─────────────────────────────────────────────────────────────────────┐
    /// │  Round half to even:                                                │
    /// │    0.125 → 0.12,  0.135 → 0.14,  0.145 → 0.14                       │
    /// │  Ties alternate, so a column of rounded rows has no upward bias.   │
    /// └─────────────────────────────────────────────────────────────────────┘
    /// ```
    pub fn rounded(&self) -> Self {
        let mut value = self
            .0
            .round_dp_with_strategy(DISPLAY_SCALE, RoundingStrategy::MidpointNearestEven);
        value.rescale(DISPLAY_SCALE);
        if value.is_zero() {
            value.set_sign_positive(true);
        }
        Money(value)
    }

    /// Formats as a plain two-place number: `"20.00"`.
    pub fn to_fixed(&self) -> String {
        self.rounded().0.to_string()
    }

    /// Formats with a currency symbol prefix: `"¥20.00"`.
    pub fn with_symbol(&self, symbol: &str) -> String {
        format!("{}{}", symbol, self.to_fixed())
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Money(amount)
    }
}

// =============================================================================
// Arithmetic
// =============================================================================

impl Add for Money {
    type Output = Money;

    #[inline]
    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, rhs: Money) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Money;

    #[inline]
    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

/// Unit price × quantity.
impl Mul<Decimal> for Money {
    type Output = Money;

    #[inline]
    fn mul(self, rhs: Decimal) -> Money {
        Money(self.0 * rhs)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Money {
        iter.fold(Money::zero(), |acc, m| acc + *m)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_fixed())
    }
}

// =============================================================================
// Quantities
// =============================================================================

/// Parses a stored quantity ("2", "1.500"), dropping blank or malformed text.
pub fn parse_quantity(raw: Option<&str>) -> Option<Decimal> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    Decimal::from_str(raw).ok()
}

/// Formats a quantity without trailing zeros: `3.000` → `"3"`, `1.50` → `"1.5"`.
pub fn format_quantity(quantity: Decimal) -> String {
    quantity.normalize().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================
