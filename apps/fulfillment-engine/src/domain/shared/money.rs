//! Monetary amounts in Vietnamese dong.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub};

/// A non-negative amount of money in VND.
///
/// Order totals, shipping fees, and COD amounts are all `Money`. The
/// constructor rejects negative amounts so a validated total can never go
/// below zero.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Zero dong.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a new amount.
    ///
    /// # Errors
    ///
    /// Returns the offending value if it is negative.
    pub fn new(amount: Decimal) -> Result<Self, Decimal> {
        if amount.is_sign_negative() {
            Err(amount)
        } else {
            Ok(Self(amount))
        }
    }

    /// Create an amount from a whole number of dong.
    #[must_use]
    pub fn from_vnd(amount: u64) -> Self {
        Self(Decimal::from(amount))
    }

    /// Get the inner decimal value.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Whether this amount is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Subtract, saturating at zero.
    #[must_use]
    pub fn saturating_sub(self, other: Self) -> Self {
        if other.0 >= self.0 {
            Self::ZERO
        } else {
            Self(self.0 - other.0)
        }
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Self;

    /// Panics in debug builds if the result would be negative; use
    /// [`Money::saturating_sub`] when the invariant is not already held.
    fn sub(self, rhs: Self) -> Self {
        debug_assert!(self.0 >= rhs.0, "money subtraction went negative");
        Self(self.0 - rhs.0)
    }
}

impl Mul<u32> for Money {
    type Output = Self;

    fn mul(self, rhs: u32) -> Self {
        Self(self.0 * Decimal::from(rhs))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}₫", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn new_rejects_negative() {
        assert!(Money::new(dec!(-1)).is_err());
        assert!(Money::new(dec!(0)).is_ok());
        assert!(Money::new(dec!(350_000)).is_ok());
    }

    #[test]
    fn from_vnd_and_amount() {
        let m = Money::from_vnd(350_000);
        assert_eq!(m.amount(), dec!(350_000));
    }

    #[test]
    fn add_and_sub() {
        let a = Money::from_vnd(200_000);
        let b = Money::from_vnd(50_000);
        assert_eq!((a + b).amount(), dec!(250_000));
        assert_eq!((a - b).amount(), dec!(150_000));
    }

    #[test]
    fn saturating_sub_floors_at_zero() {
        let a = Money::from_vnd(10);
        let b = Money::from_vnd(20);
        assert_eq!(a.saturating_sub(b), Money::ZERO);
    }

    #[test]
    fn display_uses_dong_sign() {
        assert_eq!(format!("{}", Money::from_vnd(500)), "500₫");
    }
}
