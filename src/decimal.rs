use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Sub;
use std::str::FromStr;

use crate::errors::{LoanError, Result as LoanResult};

/// number of decimal places a currency amount is published with
pub const CURRENCY_DP: u32 = 2;

/// round half-up to currency precision
pub fn round_currency(d: Decimal) -> Decimal {
    d.round_dp_with_strategy(CURRENCY_DP, RoundingStrategy::MidpointAwayFromZero)
}

/// Money type held at cent precision, also when deserialized
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(from = "Decimal")]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);

    /// create from decimal, rounding half-up to cents
    pub fn from_decimal(d: Decimal) -> Self {
        Money(round_currency(d))
    }

    /// create from string with exact parsing
    pub fn from_str_exact(s: &str) -> Result<Self, rust_decimal::Error> {
        Ok(Money::from_decimal(Decimal::from_str(s)?))
    }

    /// create from integer amount (pesos, dollars, etc)
    pub fn from_major(amount: i64) -> Self {
        Money(Decimal::from(amount))
    }

    /// create from minor amount (cents)
    pub fn from_minor(amount: i64) -> Self {
        Money(Decimal::new(amount, CURRENCY_DP))
    }

    /// get underlying decimal
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// strictly greater than zero
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    pub fn min(self, other: Self) -> Self {
        Money(self.0.min(other.0))
    }

    pub fn max(self, other: Self) -> Self {
        Money(self.0.max(other.0))
    }

    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money::from_decimal)
    }

    pub fn checked_sub(self, other: Money) -> Option<Money> {
        self.0.checked_sub(other.0).map(Money::from_decimal)
    }

    /// multiply by a whole number of periods, failing as internal on overflow
    pub fn checked_times(&self, periods: u32) -> LoanResult<Self> {
        self.0
            .checked_mul(Decimal::from(periods))
            .map(Money::from_decimal)
            .ok_or_else(|| LoanError::Internal {
                message: format!("decimal overflow multiplying {} by {}", self, periods),
            })
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl FromStr for Money {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Money::from_str_exact(s)
    }
}

impl From<Decimal> for Money {
    fn from(d: Decimal) -> Self {
        Money::from_decimal(d)
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, other: Money) -> Money {
        Money::from_decimal(self.0 - other.0)
    }
}

/// annual interest rate, stored as a fraction (0.10 for 10%)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct Rate(Decimal);

impl Rate {
    pub const ZERO: Rate = Rate(Decimal::ZERO);

    /// create from decimal fraction (e.g., 0.05 for 5%)
    pub fn from_decimal(d: Decimal) -> Self {
        Rate(d)
    }

    /// create from a percentage value (e.g., 7.5 for 7.5%)
    pub fn from_percent(p: Decimal) -> Self {
        Rate(p / Decimal::ONE_HUNDRED)
    }

    /// create from whole percentage (e.g., 5 for 5%)
    pub fn from_percentage(p: u32) -> Self {
        Rate(Decimal::from(p) / Decimal::ONE_HUNDRED)
    }

    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    pub fn as_percentage(&self) -> Decimal {
        (self.0 * Decimal::ONE_HUNDRED).normalize()
    }

    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// monthly rate from annual rate
    pub fn monthly_rate(&self) -> Rate {
        Rate(self.0 / Decimal::from(12))
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.as_percentage())
    }
}

impl From<Decimal> for Rate {
    fn from(d: Decimal) -> Self {
        Rate::from_decimal(d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_money_rounds_half_up() {
        assert_eq!(Money::from_decimal(dec!(10.005)).to_string(), "10.01");
        assert_eq!(Money::from_decimal(dec!(10.004)).to_string(), "10.00");
        assert_eq!(Money::from_str_exact("33333.333333").unwrap(), Money::from_minor(3_333_333));
    }

    #[test]
    fn test_money_display_keeps_cents() {
        assert_eq!(Money::from_major(5).to_string(), "5.00");
        assert_eq!(Money::from_minor(1).to_string(), "0.01");
    }

    #[test]
    fn test_money_arithmetic() {
        let a = Money::from_minor(1999);
        let b = Money::from_minor(1);
        assert_eq!(a.checked_add(b), Some(Money::from_major(20)));
        assert_eq!(a - b, Money::from_minor(1998));
        assert_eq!(Money::from_minor(3_333_333).checked_times(36).unwrap(), Money::from_minor(119_999_988));
        assert_eq!(a.checked_sub(b), Some(Money::from_minor(1998)));
        assert_eq!(Money::from_decimal(Decimal::MAX).checked_add(Money::from_major(1)), None);
    }

    #[test]
    fn test_checked_times_overflow_is_internal() {
        let huge = Money::from_decimal(dec!(70000000000000000000000000000));
        assert!(matches!(huge.checked_times(60), Err(LoanError::Internal { .. })));
    }

    #[test]
    fn test_deserialized_money_rounds_to_cents() {
        let money: Money = serde_json::from_str("\"0.001\"").unwrap();
        assert_eq!(money, Money::ZERO);
        let money: Money = serde_json::from_str("\"10.005\"").unwrap();
        assert_eq!(money.to_string(), "10.01");
        assert_eq!(serde_json::to_string(&money).unwrap(), "\"10.01\"");
    }

    #[test]
    fn test_rate_conversions() {
        let rate = Rate::from_percent(dec!(10));
        assert_eq!(rate.as_decimal(), dec!(0.1));
        assert_eq!(rate.as_percentage(), dec!(10));
        assert_eq!(Rate::from_percentage(12).monthly_rate().as_decimal(), dec!(0.01));
        assert_eq!(rate.to_string(), "10%");
    }
}
