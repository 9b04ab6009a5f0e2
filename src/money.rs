//! Exact money amounts in cents.

use std::fmt;
use std::iter::Sum;
use std::ops::Add;

/// An amount of money held as whole cents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Round a decimal amount (as read from a NUMERIC/REAL column) to cents.
    pub fn from_decimal(amount: f64) -> Self {
        Self((amount * 100.0).round() as i64)
    }

    pub const fn cents(&self) -> i64 {
        self.0
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_decimal_rounds_float_noise() {
        assert_eq!(Money::from_decimal(2.99).cents(), 299);
        assert_eq!(Money::from_decimal(0.99).cents(), 99);
        assert_eq!(Money::from_decimal(4.0).cents(), 400);
    }

    #[test]
    fn test_sum_is_exact() {
        let total: Money = [Money::from_decimal(2.99), Money::from_decimal(1.99)]
            .into_iter()
            .sum();
        assert_eq!(total, Money::from_cents(498));
        assert_eq!(total.to_string(), "4.98");
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::ZERO.to_string(), "0.00");
        assert_eq!(Money::from_cents(5).to_string(), "0.05");
        assert_eq!(Money::from_cents(-250).to_string(), "-2.50");
    }
}
