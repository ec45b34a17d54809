use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Currencies an invoice can be issued in, with their minor-unit rules.
///
/// Amounts are never converted between currencies; every figure on an
/// invoice is expressed in the invoice's own currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// Iranian Toman (no decimal places)
    IRT,
    /// US Dollar (2 decimal places)
    USD,
    /// Euro (2 decimal places)
    EUR,
    /// UAE Dirham (2 decimal places)
    AED,
}

impl Currency {
    /// Returns the decimal scale for this currency
    /// - IRT: 0 (no decimals)
    /// - USD/EUR/AED: 2
    pub fn scale(&self) -> u32 {
        match self {
            Currency::IRT => 0,
            Currency::USD | Currency::EUR | Currency::AED => 2,
        }
    }

    /// Rounds a decimal value to the appropriate scale for this currency
    pub fn round(&self, amount: Decimal) -> Decimal {
        amount.round_dp(self.scale())
    }

    /// Validates that a decimal value has the correct scale for this currency
    pub fn validate_amount(&self, amount: Decimal) -> Result<(), String> {
        if amount < Decimal::ZERO {
            return Err(format!("{} amount cannot be negative", self));
        }

        // `normalize` drops trailing zeros so 10.50 and 10.5 are judged alike
        let scale = amount.normalize().scale();
        let expected_scale = self.scale();
        if scale > expected_scale {
            return Err(format!(
                "{} amounts must have at most {} decimal places, got {}",
                self, expected_scale, scale
            ));
        }

        Ok(())
    }

    /// Returns the smallest unit for this currency. This is also the
    /// tolerance used when comparing payment sums against a total.
    pub fn smallest_unit(&self) -> Decimal {
        Decimal::new(1, self.scale())
    }

    /// True when `a` and `b` differ by at most one minor unit
    pub fn within_tolerance(&self, a: Decimal, b: Decimal) -> bool {
        (a - b).abs() <= self.smallest_unit()
    }

    /// Formats an amount for display with the correct decimal places
    pub fn format_amount(&self, amount: Decimal) -> String {
        let scale = self.scale();
        if scale == 0 {
            format!("{} {}", self, amount.round_dp(0))
        } else {
            format!("{} {:.width$}", self, amount, width = scale as usize)
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::IRT => "IRT",
            Currency::USD => "USD",
            Currency::EUR => "EUR",
            Currency::AED => "AED",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "IRT" => Ok(Currency::IRT),
            "USD" => Ok(Currency::USD),
            "EUR" => Ok(Currency::EUR),
            "AED" => Ok(Currency::AED),
            _ => Err(format!("Invalid currency: {}", s)),
        }
    }
}
