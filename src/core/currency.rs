use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Supported currencies with their decimal precision rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// Pakistani Rupee (2 decimal places)
    #[default]
    PKR,
    /// US Dollar (2 decimal places)
    USD,
}

impl Currency {
    /// Returns the decimal scale for this currency
    pub fn scale(&self) -> u32 {
        match self {
            Currency::PKR | Currency::USD => 2,
        }
    }

    /// Rounds a decimal value to the appropriate scale for this currency
    pub fn round(&self, amount: Decimal) -> Decimal {
        amount.round_dp(self.scale())
    }

    /// Validates that a decimal value is a positive amount with the correct scale
    pub fn validate_amount(&self, amount: Decimal) -> Result<(), String> {
        let scale = amount.scale();
        let expected_scale = self.scale();

        if scale > expected_scale {
            return Err(format!(
                "{} amounts must have at most {} decimal places, got {}",
                self, expected_scale, scale
            ));
        }

        if amount <= Decimal::ZERO {
            return Err(format!("{} amount must be positive", self));
        }

        Ok(())
    }

    /// Formats an amount for display with the correct decimal places
    pub fn format_amount(&self, amount: Decimal) -> String {
        format!(
            "{} {:.width$}",
            self,
            amount,
            width = self.scale() as usize
        )
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Currency::PKR => write!(f, "PKR"),
            Currency::USD => write!(f, "USD"),
        }
    }
}

impl std::str::FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "PKR" => Ok(Currency::PKR),
            "USD" => Ok(Currency::USD),
            _ => Err(format!("Invalid currency: {}", s)),
        }
    }
}
