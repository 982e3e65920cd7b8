//! Type-safe price representation using decimal arithmetic.
//!
//! All amounts are US dollars. Formatting is always `"$X.XX"` with the
//! midpoint rounded away from zero.
//!
//! Deserialization is deliberately lenient: a price that is missing, `null`,
//! a numeric string, or garbage becomes a number or zero. Every entity (product,
//! cart line, order, order item) goes through the same path, so a bad price
//! never prevents a fragment from rendering.

use core::fmt;
use std::iter::Sum;
use std::ops::Add;
use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use thiserror::Error;

/// Error returned when a user-entered price cannot be parsed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid price: {0:?}")]
pub struct PriceParseError(pub String);

/// A dollar amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Price(Decimal);

impl Price {
    /// Zero dollars.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Create a price from a whole number of cents.
    #[must_use]
    pub fn from_cents(cents: i64) -> Self {
        Self(Decimal::new(cents, 2))
    }

    /// The raw decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Whether the amount is strictly greater than zero.
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Multiply by a quantity, saturating at the largest representable amount.
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        self.0
            .checked_mul(Decimal::from(quantity))
            .map_or_else(|| Self::saturated(self.0.is_sign_negative()), Self)
    }

    const fn saturated(negative: bool) -> Self {
        if negative {
            Self(Decimal::MIN)
        } else {
            Self(Decimal::MAX)
        }
    }

    /// Format for display (e.g., "$19.99").
    #[must_use]
    pub fn display(&self) -> String {
        self.to_string()
    }

    /// Interpret a loosely-typed JSON value as a price.
    ///
    /// Numbers and numeric strings parse; everything else is zero.
    #[must_use]
    pub fn from_json(value: &Value) -> Self {
        let parsed = match value {
            Value::Number(n) => parse_decimal(&n.to_string()),
            Value::String(s) => parse_decimal(s),
            _ => None,
        };
        parsed.map_or(Self::ZERO, Self)
    }
}

fn parse_decimal(text: &str) -> Option<Decimal> {
    let text = text.trim();
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rounded = self
            .0
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        write!(f, "${rounded:.2}")
    }
}

impl FromStr for Price {
    type Err = PriceParseError;

    /// Parse user input such as `"19.99"` or `"$19.99"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed.strip_prefix('$').unwrap_or(trimmed);
        parse_decimal(digits)
            .map(Self)
            .ok_or_else(|| PriceParseError(s.to_owned()))
    }
}

impl Add for Price {
    type Output = Self;

    /// Saturates instead of overflowing.
    fn add(self, rhs: Self) -> Self::Output {
        self.0
            .checked_add(rhs.0)
            .map_or_else(|| Self::saturated(rhs.0.is_sign_negative()), Self)
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl Serialize for Price {
    /// Prices go over the wire as JSON numbers.
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.0.to_f64().unwrap_or_default())
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<Value>::deserialize(deserializer)?;
        Ok(raw.as_ref().map_or(Self::ZERO, Self::from_json))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_display_pads_to_two_decimals() {
        assert_eq!(Price::from_cents(1999).to_string(), "$19.99");
        assert_eq!(Price::new(Decimal::from(5)).to_string(), "$5.00");
        assert_eq!(Price::ZERO.display(), "$0.00");
    }

    #[test]
    fn test_display_rounds_midpoint_away_from_zero() {
        let price: Price = "2.345".parse().unwrap();
        assert_eq!(price.to_string(), "$2.35");
    }

    #[test]
    fn test_lenient_deserialization() {
        let cases = [
            (json!(19.99), "$19.99"),
            (json!(10), "$10.00"),
            (json!("7.5"), "$7.50"),
            (json!(null), "$0.00"),
            (json!("abc"), "$0.00"),
            (json!({"amount": 1}), "$0.00"),
        ];
        for (value, expected) in cases {
            let price: Price = serde_json::from_value(value.clone()).unwrap();
            assert_eq!(price.to_string(), expected, "input {value}");
        }
    }

    #[test]
    fn test_serializes_as_number() {
        let value = serde_json::to_value(Price::from_cents(1250)).unwrap();
        assert_eq!(value, json!(12.5));
    }

    #[test]
    fn test_parse_user_input() {
        assert_eq!("$3.10".parse::<Price>().unwrap(), Price::from_cents(310));
        assert!("ten dollars".parse::<Price>().is_err());
    }

    #[test]
    fn test_sum_and_times() {
        let total: Price = [Price::from_cents(250).times(2), Price::from_cents(100)]
            .into_iter()
            .sum();
        assert_eq!(total, Price::from_cents(600));
        assert!(total.is_positive());
    }

    #[test]
    fn test_huge_amounts_saturate() {
        let huge: Price = serde_json::from_value(json!("50000000000000000000000000000")).unwrap();
        assert_eq!(huge.times(2), Price::new(Decimal::MAX));
        assert_eq!(huge + huge, Price::new(Decimal::MAX));

        let total: Price = [huge.times(2), Price::from_cents(1000)].into_iter().sum();
        assert_eq!(total, Price::new(Decimal::MAX));
        assert!(total.to_string().starts_with('$'));

        let debt = Price::new(Decimal::MIN);
        assert_eq!(debt + debt, Price::new(Decimal::MIN));
    }
}
