//! Monetary amounts as exchanged with the processor.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An amount in the currency's major unit, carried exactly as a JSON number.
///
/// The gateway never does arithmetic on amounts, so the number is kept in its
/// original form (integer `10000` stays an integer, `12.5` stays `12.5`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(serde_json::Number);

impl Amount {
    /// Returns true when the amount is strictly greater than zero.
    pub fn is_positive(&self) -> bool {
        self.0.as_f64().is_some_and(|v| v > 0.0)
    }

    pub fn as_number(&self) -> &serde_json::Number {
        &self.0
    }
}

impl From<u64> for Amount {
    fn from(value: u64) -> Self {
        Self(value.into())
    }
}

impl From<i64> for Amount {
    fn from(value: i64) -> Self {
        Self(value.into())
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_amount_stays_integer() {
        let amount: Amount = serde_json::from_str("10000").unwrap();
        assert_eq!(serde_json::to_string(&amount).unwrap(), "10000");
        assert!(amount.is_positive());
    }

    #[test]
    fn test_fractional_amount() {
        let amount: Amount = serde_json::from_str("12.5").unwrap();
        assert_eq!(amount.to_string(), "12.5");
    }

    #[test]
    fn test_zero_and_negative_are_not_positive() {
        assert!(!Amount::from(0u64).is_positive());
        assert!(!Amount::from(-5i64).is_positive());
    }
}
