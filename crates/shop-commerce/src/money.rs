//! Money type for representing monetary values.
//!
//! Amounts are stored as integer cents to avoid the floating-point
//! precision issues that plague monetary calculations. The catalog runs
//! in a single currency, so no currency tag is carried.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub};

/// A monetary value in integer cents.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct Money {
    /// Amount in cents.
    pub cents: i64,
}

impl Money {
    /// Create a Money value from cents.
    pub fn new(cents: i64) -> Self {
        Self { cents }
    }

    /// Create a Money value from a decimal amount.
    ///
    /// ```
    /// use shop_commerce::money::Money;
    /// let price = Money::from_decimal(49.99);
    /// assert_eq!(price.cents, 4999);
    /// ```
    pub fn from_decimal(amount: f64) -> Self {
        Self::new((amount * 100.0).round() as i64)
    }

    /// The zero amount.
    pub fn zero() -> Self {
        Self::new(0)
    }

    /// Check if this is zero.
    pub fn is_zero(&self) -> bool {
        self.cents == 0
    }

    /// Check if this is negative.
    pub fn is_negative(&self) -> bool {
        self.cents < 0
    }

    /// Convert to a decimal value.
    pub fn to_decimal(&self) -> f64 {
        self.cents as f64 / 100.0
    }

    /// Calculate a fraction of this amount, rounded to the nearest cent.
    ///
    /// `fraction` is a ratio, not a percentage: 0.10 means 10%.
    pub fn percent_of(&self, fraction: f64) -> Money {
        Money::new((self.cents as f64 * fraction).round() as i64)
    }

    /// Multiply by a quantity.
    pub fn times(&self, quantity: i64) -> Money {
        Money::new(self.cents * quantity)
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, other: Money) -> Money {
        Money::new(self.cents + other.cents)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, other: Money) {
        self.cents += other.cents;
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, other: Money) -> Money {
        Money::new(self.cents - other.cents)
    }
}

impl Mul<i64> for Money {
    type Output = Money;

    fn mul(self, quantity: i64) -> Money {
        self.times(quantity)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::zero(), Add::add)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.cents < 0 {
            write!(f, "-${:.2}", -self.to_decimal())
        } else {
            write!(f, "${:.2}", self.to_decimal())
        }
    }
}
