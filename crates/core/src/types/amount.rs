//! Monetary amounts using decimal arithmetic.
//!
//! WooCommerce sends money as decimal strings (`"120.00"`) while browsers tend
//! to send JSON numbers or free-form strings. Everything is normalized to
//! [`Decimal`] at the edge so no float arithmetic touches refund totals.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde_json::Value;
use thiserror::Error;

/// Errors that can occur when reading an amount from JSON.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    /// Value is missing, null or an empty string.
    #[error("amount is missing")]
    Missing,
    /// Value could not be interpreted as a decimal number.
    #[error("amount is not a number: {0}")]
    NotANumber(String),
    /// Value parsed but is zero or negative where a positive amount is required.
    #[error("amount must be greater than zero")]
    NotPositive,
}

/// Parse a decimal amount from a JSON number or string.
///
/// # Errors
///
/// Returns [`AmountError::Missing`] for null/empty input and
/// [`AmountError::NotANumber`] for anything that is not a finite number
/// (including `"NaN"`).
pub fn parse_amount(value: &Value) -> Result<Decimal, AmountError> {
    match value {
        Value::Null => Err(AmountError::Missing),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                return Ok(Decimal::from(i));
            }
            n.as_f64()
                .and_then(|f| Decimal::try_from(f).ok())
                .ok_or_else(|| AmountError::NotANumber(n.to_string()))
        }
        Value::String(s) => parse_amount_str(s),
        other => Err(AmountError::NotANumber(other.to_string())),
    }
}

/// Parse a decimal amount from a string such as `"120.00"` or `"1e2"`.
///
/// # Errors
///
/// See [`parse_amount`].
pub fn parse_amount_str(s: &str) -> Result<Decimal, AmountError> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(AmountError::Missing);
    }
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .map_err(|_| AmountError::NotANumber(trimmed.to_owned()))
}

/// Parse an amount that must be strictly positive.
///
/// # Errors
///
/// Returns [`AmountError::NotPositive`] for zero or negative values, in
/// addition to the errors of [`parse_amount`].
pub fn parse_positive_amount(value: &Value) -> Result<Decimal, AmountError> {
    let amount = parse_amount(value)?;
    if amount <= Decimal::ZERO {
        return Err(AmountError::NotPositive);
    }
    Ok(amount)
}

/// Format an amount the way WooCommerce expects it (two decimal places).
#[must_use]
pub fn format_amount(amount: Decimal) -> String {
    format!("{:.2}", amount.round_dp(2))
}
