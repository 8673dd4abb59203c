use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Neg, Sub};
use std::str::FromStr;

/// Tolerance for "exact" amount comparisons (one paisa below a rupee cent).
const EPSILON_PAISE: i64 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Money(Decimal);

impl Money {
    pub fn from_paise(paise: i64) -> Self {
        Money(Decimal::from(paise) / Decimal::from(100))
    }

    pub fn to_paise(self) -> i64 {
        (self.0 * Decimal::from(100)).round().to_i64().unwrap_or(0)
    }

    pub fn from_decimal(decimal: Decimal) -> Self {
        Money(decimal.round_dp(2))
    }

    pub fn zero() -> Self {
        Money(Decimal::ZERO)
    }

    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    pub fn is_positive(self) -> bool {
        self.0.is_sign_positive() && !self.0.is_zero()
    }

    pub fn abs(self) -> Self {
        Money(self.0.abs())
    }

    /// Currency-epsilon equality: |self − other| < 0.01.
    pub fn approx_eq(self, other: Money) -> bool {
        (self.to_paise() - other.to_paise()).abs() < EPSILON_PAISE
    }

    pub fn as_decimal(self) -> Decimal {
        self.0
    }

    /// Two-decimal string without currency symbol, for persistence.
    pub fn to_plain_string(self) -> String {
        format!("{:.2}", self.0)
    }
}

impl FromStr for Money {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s.trim()).map(Money::from_decimal)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "₹{:.2}", self.0)
    }
}

impl Add for Money {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Money(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Money(self.0 - rhs.0)
    }
}

impl Neg for Money {
    type Output = Self;
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paise_round_trip() {
        assert_eq!(Money::from_paise(500000).to_paise(), 500000);
        assert_eq!(Money::from_paise(1).to_plain_string(), "0.01");
    }

    #[test]
    fn parse_plain_decimal() {
        let m: Money = "5000.00".parse().unwrap();
        assert_eq!(m.to_paise(), 500000);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!("abc".parse::<Money>().is_err());
    }

    #[test]
    fn approx_eq_within_epsilon() {
        let a: Money = "1500.00".parse().unwrap();
        let b: Money = "1500.004".parse().unwrap();
        assert!(a.approx_eq(b));
        let c: Money = "1500.02".parse().unwrap();
        assert!(!a.approx_eq(c));
    }

    #[test]
    fn display_uses_rupee_symbol() {
        assert_eq!(Money::from_paise(123456).to_string(), "₹1234.56");
    }

    #[test]
    fn plain_string_is_two_decimals() {
        assert_eq!(Money::from_paise(500000).to_plain_string(), "5000.00");
    }
}
