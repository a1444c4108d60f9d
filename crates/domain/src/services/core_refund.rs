//! Core-charge refund calculation.
//!
//! Remanufacturable parts (alternators, starters, calipers) are sold with a
//! refundable core charge. The refund paid when the old part comes back depends
//! on its condition.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::billing::round_money;

/// Errors from the refund calculator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreRefundError {
    #[error("Core charge cannot be negative")]
    NegativeCharge,

    #[error("Unknown core condition: {0}")]
    UnknownCondition(String),
}

/// Condition of a returned core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CoreCondition {
    New,
    Used,
    Damaged,
}

impl CoreCondition {
    pub fn as_str(&self) -> &'static str {
        match self {
            CoreCondition::New => "new",
            CoreCondition::Used => "used",
            CoreCondition::Damaged => "damaged",
        }
    }

    /// Share of the core charge refunded, in percent.
    pub fn refund_percentage(&self) -> u32 {
        match self {
            CoreCondition::New => 100,
            CoreCondition::Used => 75,
            CoreCondition::Damaged => 25,
        }
    }
}

impl FromStr for CoreCondition {
    type Err = CoreRefundError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "new" => Ok(CoreCondition::New),
            "used" => Ok(CoreCondition::Used),
            "damaged" => Ok(CoreCondition::Damaged),
            _ => Err(CoreRefundError::UnknownCondition(s.to_string())),
        }
    }
}

impl fmt::Display for CoreCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// Case-insensitive so "Used" from a form select parses the same as "used".
impl<'de> Deserialize<'de> for CoreCondition {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Refund for a core returned in `condition`, rounded to cents.
pub fn refund_amount(core_charge: Decimal, condition: CoreCondition) -> Result<Decimal, CoreRefundError> {
    if core_charge < Decimal::ZERO {
        return Err(CoreRefundError::NegativeCharge);
    }
    let pct = Decimal::from(condition.refund_percentage());
    Ok(round_money(core_charge * pct / Decimal::ONE_HUNDRED))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refund_percentages() {
        let charge = Decimal::new(10000, 2);
        assert_eq!(refund_amount(charge, CoreCondition::New).unwrap(), Decimal::new(10000, 2));
        assert_eq!(refund_amount(charge, CoreCondition::Used).unwrap(), Decimal::new(7500, 2));
        assert_eq!(refund_amount(charge, CoreCondition::Damaged).unwrap(), Decimal::new(2500, 2));
    }

    #[test]
    fn test_refund_rounds_to_cents() {
        // 33.33 * 0.75 = 24.9975
        let refund = refund_amount(Decimal::new(3333, 2), CoreCondition::Used).unwrap();
        assert_eq!(refund, Decimal::new(2500, 2));
        // 19.99 * 0.25 = 4.9975
        let refund = refund_amount(Decimal::new(1999, 2), CoreCondition::Damaged).unwrap();
        assert_eq!(refund, Decimal::new(500, 2));
    }

    #[test]
    fn test_zero_charge() {
        assert_eq!(
            refund_amount(Decimal::ZERO, CoreCondition::New).unwrap(),
            Decimal::ZERO
        );
    }

    #[test]
    fn test_negative_charge_rejected() {
        assert_eq!(
            refund_amount(Decimal::new(-100, 2), CoreCondition::New),
            Err(CoreRefundError::NegativeCharge)
        );
    }

    #[test]
    fn test_condition_parse_is_case_insensitive() {
        assert_eq!("USED".parse::<CoreCondition>(), Ok(CoreCondition::Used));
        assert_eq!(" Damaged ".parse::<CoreCondition>(), Ok(CoreCondition::Damaged));
        assert!("broken".parse::<CoreCondition>().is_err());

        let parsed: CoreCondition = serde_json::from_str(r#""New""#).unwrap();
        assert_eq!(parsed, CoreCondition::New);
        assert_eq!(serde_json::to_string(&parsed).unwrap(), r#""new""#);
    }
}
