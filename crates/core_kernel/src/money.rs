//! Money types with precise decimal arithmetic
//!
//! This module provides a type-safe representation of monetary values
//! using rust_decimal for precise calculations without floating-point errors.
//!
//! Unlike a ledger amount, a quote amount is carried at full precision while
//! adjustments compound on it. Rounding to the currency's minor unit happens
//! once, when a result is reported.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Currency codes following ISO 4217
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    USD,
    CAD,
    EUR,
    GBP,
    AUD,
}

impl Currency {
    /// Returns the number of decimal places for this currency
    pub fn decimal_places(&self) -> u32 {
        2
    }

    /// Returns the currency symbol
    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::USD => "$",
            Currency::CAD => "C$",
            Currency::EUR => "€",
            Currency::GBP => "£",
            Currency::AUD => "A$",
        }
    }

    /// Returns the ISO 4217 code
    pub fn code(&self) -> &'static str {
        match self {
            Currency::USD => "USD",
            Currency::CAD => "CAD",
            Currency::EUR => "EUR",
            Currency::GBP => "GBP",
            Currency::AUD => "AUD",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Currency {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "USD" => Ok(Currency::USD),
            "CAD" => Ok(Currency::CAD),
            "EUR" => Ok(Currency::EUR),
            "GBP" => Ok(Currency::GBP),
            "AUD" => Ok(Currency::AUD),
            other => Err(MoneyError::UnknownCurrency(other.to_string())),
        }
    }
}

/// Errors that can occur during money operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoneyError {
    #[error("Invalid amount for {field}: {reason}")]
    InvalidAmount { field: String, reason: String },

    #[error("Unknown currency: {0}")]
    UnknownCurrency(String),

    #[error("Overflow during calculation")]
    Overflow,
}

/// Checked addition of two amounts
pub fn checked_add(a: Decimal, b: Decimal) -> Result<Decimal, MoneyError> {
    a.checked_add(b).ok_or(MoneyError::Overflow)
}

/// Checked subtraction of two amounts
pub fn checked_sub(a: Decimal, b: Decimal) -> Result<Decimal, MoneyError> {
    a.checked_sub(b).ok_or(MoneyError::Overflow)
}

/// Checked multiplication, e.g. area by unit price or amount by factor
pub fn checked_mul(a: Decimal, b: Decimal) -> Result<Decimal, MoneyError> {
    a.checked_mul(b).ok_or(MoneyError::Overflow)
}

/// `part / whole × 100`; zero when `whole` is zero
pub fn percent_of(part: Decimal, whole: Decimal) -> Result<Decimal, MoneyError> {
    if whole.is_zero() {
        return Ok(Decimal::ZERO);
    }
    part.checked_div(whole)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .ok_or(MoneyError::Overflow)
}

/// Parses a numeric form field into a `Decimal`.
///
/// Administrative tools submit prices and areas as text. They are parsed
/// once here, at the boundary, so nothing downstream handles untyped numbers.
/// Thousands separators and a leading currency symbol are tolerated.
pub fn parse_decimal(field: &str, raw: &str) -> Result<Decimal, MoneyError> {
    let cleaned: String = raw
        .trim()
        .trim_start_matches(['$', '€', '£'])
        .chars()
        .filter(|c| *c != ',' && *c != '_')
        .collect();

    if cleaned.is_empty() {
        return Err(MoneyError::InvalidAmount {
            field: field.to_string(),
            reason: "value is empty".to_string(),
        });
    }

    Decimal::from_str(&cleaned)
        .or_else(|_| Decimal::from_scientific(&cleaned))
        .map_err(|_| MoneyError::InvalidAmount {
            field: field.to_string(),
            reason: format!("'{}' is not a number", raw.trim()),
        })
}

/// A monetary amount with associated currency
///
/// The amount is kept at full precision; call [`Money::round_to_currency`]
/// when presenting it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    amount: Decimal,
    currency: Currency,
}

impl Money {
    /// Creates a new Money value
    pub fn new(amount: Decimal, currency: Currency) -> Self {
        Self { amount, currency }
    }

    /// Creates a zero amount in the specified currency
    pub fn zero(currency: Currency) -> Self {
        Self {
            amount: dec!(0),
            currency,
        }
    }

    /// Returns the amount
    pub fn amount(&self) -> Decimal {
        self.amount
    }

    /// Returns the currency
    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// Returns true if the amount is zero
    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    /// Returns true if the amount is positive
    pub fn is_positive(&self) -> bool {
        self.amount.is_sign_positive() && !self.amount.is_zero()
    }

    /// Returns true if the amount is negative
    pub fn is_negative(&self) -> bool {
        self.amount.is_sign_negative() && !self.amount.is_zero()
    }

    /// Returns the absolute value
    pub fn abs(&self) -> Self {
        Self {
            amount: self.amount.abs(),
            currency: self.currency,
        }
    }

    /// Rounds to the currency's standard decimal places (banker's rounding)
    pub fn round_to_currency(&self) -> Self {
        Self {
            amount: self.amount.round_dp_with_strategy(
                self.currency.decimal_places(),
                rust_decimal::RoundingStrategy::MidpointNearestEven,
            ),
            currency: self.currency,
        }
    }


    /// Formats the amount with an explicit sign, e.g. `+$4.50` or `-$11.75`.
    ///
    /// Zero renders without a sign.
    pub fn format_signed(&self) -> String {
        let rounded = self.round_to_currency();
        let sign = if rounded.is_positive() {
            "+"
        } else if rounded.is_negative() {
            "-"
        } else {
            ""
        };
        format!("{}{}", sign, rounded.abs())
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dp = self.currency.decimal_places();
        let rounded = self.round_to_currency();
        if rounded.is_negative() {
            write!(
                f,
                "-{}{:.dp$}",
                self.currency.symbol(),
                rounded.amount.abs(),
                dp = dp as usize
            )
        } else {
            write!(
                f,
                "{}{:.dp$}",
                self.currency.symbol(),
                rounded.amount,
                dp = dp as usize
            )
        }
    }
}

/// Represents a percentage rate (surcharge, discount, fee)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rate {
    /// The rate as a decimal (e.g., 0.05 for 5%)
    value: Decimal,
}

impl Rate {
    /// Creates a rate from a decimal value (e.g., 0.05 for 5%)
    pub fn new(value: Decimal) -> Self {
        Self { value }
    }

    /// Creates a rate from a percentage (e.g., 5.0 for 5%)
    pub fn from_percentage(percentage: Decimal) -> Self {
        Self {
            value: percentage / dec!(100),
        }
    }

    /// Returns the rate as a decimal
    pub fn as_decimal(&self) -> Decimal {
        self.value
    }

    /// Returns the rate as a percentage
    pub fn as_percentage(&self) -> Decimal {
        self.value * dec!(100)
    }

    /// Factor that raises an amount by this rate (`1 + r`)
    pub fn increase_factor(&self) -> Decimal {
        Decimal::ONE + self.value
    }

    /// Factor that lowers an amount by this rate (`1 - r`)
    pub fn decrease_factor(&self) -> Decimal {
        Decimal::ONE - self.value
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.as_percentage().round_dp(4).normalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_keeps_precision_until_rounded() {
        let m = Money::new(dec!(0.333333), Currency::USD);
        assert_eq!(m.amount(), dec!(0.333333));
        assert_eq!(m.round_to_currency().amount(), dec!(0.33));
    }

    #[test]
    fn test_display_and_signed_format() {
        assert_eq!(Money::new(dec!(117.5), Currency::USD).to_string(), "$117.50");
        assert_eq!(Money::new(dec!(-11.75), Currency::USD).to_string(), "-$11.75");
        assert_eq!(Money::new(dec!(4.5), Currency::USD).format_signed(), "+$4.50");
        assert_eq!(Money::zero(Currency::USD).format_signed(), "$0.00");
    }

    #[test]
    fn test_rate_factors() {
        let rate = Rate::from_percentage(dec!(5.0));
        assert_eq!(rate.increase_factor(), dec!(1.05));
        assert_eq!(rate.decrease_factor(), dec!(0.95));
        assert_eq!(rate.to_string(), "5%");
    }

    #[test]
    fn test_parse_decimal_boundary_values() {
        assert_eq!(parse_decimal("price", " 0.025 ").unwrap(), dec!(0.025));
        assert_eq!(parse_decimal("area", "8,000").unwrap(), dec!(8000));
        assert_eq!(parse_decimal("price", "$12.50").unwrap(), dec!(12.50));
        assert!(parse_decimal("price", "").is_err());
        assert!(parse_decimal("price", "twelve").is_err());
    }

    #[test]
    fn test_checked_arithmetic_reports_overflow() {
        assert_eq!(checked_mul(dec!(2.5), dec!(4)), Ok(dec!(10)));
        assert_eq!(checked_mul(Decimal::MAX, dec!(2)), Err(MoneyError::Overflow));
        assert_eq!(checked_add(Decimal::MAX, Decimal::ONE), Err(MoneyError::Overflow));
        assert_eq!(checked_sub(Decimal::MIN, Decimal::ONE), Err(MoneyError::Overflow));
    }

    #[test]
    fn test_percent_of() {
        assert_eq!(percent_of(dec!(-11.75), dec!(117.50)), Ok(dec!(-10)));
        assert_eq!(percent_of(dec!(5), Decimal::ZERO), Ok(Decimal::ZERO));
        assert_eq!(percent_of(Decimal::MAX, dec!(0.0001)), Err(MoneyError::Overflow));
    }
}
