use crate::error::WorkflowError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A non-negative monetary amount.
///
/// Wraps `rust_decimal::Decimal` so the exact decimal value survives every
/// round trip through storage and the request boundary.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
    pub const ZERO: Self = Self(Decimal::ZERO);

    pub fn new(value: Decimal) -> Result<Self, WorkflowError> {
        if value.is_sign_negative() && !value.is_zero() {
            Err(WorkflowError::ValidationError(
                "Amount must not be negative".to_string(),
            ))
        } else {
            Ok(Self(value))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = WorkflowError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Three-letter currency code, stored upper-case (`"UAH"`, `"EUR"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Currency(String);

impl Currency {
    pub fn new(code: &str) -> Result<Self, WorkflowError> {
        let code = code.trim();
        if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) {
            Ok(Self(code.to_ascii_uppercase()))
        } else {
            Err(WorkflowError::ValidationError(format!(
                "Invalid currency code: '{}'",
                code
            )))
        }
    }

    pub fn code(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Currency {
    type Error = WorkflowError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<Currency> for String {
    fn from(currency: Currency) -> Self {
        currency.0
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_amount_validation() {
        assert!(Amount::new(dec!(1.00)).is_ok());
        assert!(Amount::new(dec!(0.0)).is_ok());
        assert!(Amount::new(-Decimal::ZERO).is_ok());
        assert!(matches!(
            Amount::new(dec!(-0.01)),
            Err(WorkflowError::ValidationError(_))
        ));
    }

    #[test]
    fn test_amount_keeps_scale() {
        let amount = Amount::new(dec!(1.00)).unwrap();
        assert_eq!(amount.to_string(), "1.00");
        assert_eq!(Decimal::from(amount), dec!(1.00));
    }

    #[test]
    fn test_currency_normalisation() {
        assert_eq!(Currency::new("uah").unwrap().code(), "UAH");
        assert_eq!(Currency::new(" EUR ").unwrap().code(), "EUR");
        assert!(Currency::new("EURO").is_err());
        assert!(Currency::new("U1H").is_err());
        assert!(Currency::new("").is_err());
    }

    #[test]
    fn test_amount_rejects_negative_json() {
        assert!(serde_json::from_str::<Amount>("\"-5\"").is_err());
        let amount: Amount = serde_json::from_str("\"12.50\"").unwrap();
        assert_eq!(amount.value(), dec!(12.50));
    }
}
