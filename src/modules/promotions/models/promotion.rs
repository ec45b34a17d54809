use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::{AppError, Currency, Result};

/// How a promotion's `discount_value` is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscountType {
    /// `discount_value` is a percentage (0-100) of the subtotal
    Percentage,
    /// `discount_value` is an absolute amount in the invoice currency
    Fixed,
}

impl DiscountType {
    /// Realized discount for `value` against the current `subtotal`.
    /// Percentage discounts are rounded to the currency's minor unit.
    pub fn discount_amount(
        &self,
        value: Decimal,
        subtotal: Decimal,
        currency: Currency,
    ) -> Result<Decimal> {
        match self {
            DiscountType::Percentage => {
                let scaled = subtotal.checked_mul(value).ok_or_else(|| {
                    AppError::validation(format!(
                        "{}% of {} is out of range",
                        value, subtotal
                    ))
                })?;
                Ok(currency.round(scaled / Decimal::ONE_HUNDRED))
            }
            DiscountType::Fixed => Ok(value),
        }
    }
}

impl std::fmt::Display for DiscountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiscountType::Percentage => write!(f, "percentage"),
            DiscountType::Fixed => write!(f, "fixed"),
        }
    }
}

/// A resolved promotion, as captured on an invoice.
///
/// This is a value, not a reference to the definition: once an invoice is
/// issued, later edits to the definition never reach it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Promotion {
    pub code: Option<String>,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    pub discount_amount: Decimal,
}

impl Promotion {
    /// A manual discount entered by the invoice author, not backed by a code
    pub fn manual(
        discount_type: DiscountType,
        discount_value: Decimal,
        subtotal: Decimal,
        currency: Currency,
    ) -> Result<Self> {
        PromotionDefinition::validate_value(discount_type, discount_value)?;
        PromotionDefinition::validate_for_currency(discount_type, discount_value, currency)?;
        Ok(Self {
            code: None,
            discount_type,
            discount_value,
            discount_amount: discount_type.discount_amount(discount_value, subtotal, currency)?,
        })
    }
}

/// A promotion code as configured by the business
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromotionDefinition {
    pub code: String,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub starts_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ends_at: Option<DateTime<Utc>>,
    /// Minimum subtotal the order must reach
    #[serde(default)]
    pub min_subtotal: Option<Decimal>,
    /// Minimum total quantity across all line items
    #[serde(default)]
    pub min_quantity: Option<u32>,
}

fn default_active() -> bool {
    true
}

impl PromotionDefinition {
    pub fn new(code: impl Into<String>, discount_type: DiscountType, discount_value: Decimal) -> Self {
        Self {
            code: code.into(),
            discount_type,
            discount_value,
            active: true,
            starts_at: None,
            ends_at: None,
            min_subtotal: None,
            min_quantity: None,
        }
    }

    /// Codes compare case-insensitively, ignoring surrounding whitespace
    pub fn normalize_code(code: &str) -> String {
        code.trim().to_uppercase()
    }

    pub fn validate_value(discount_type: DiscountType, discount_value: Decimal) -> Result<()> {
        if discount_value < Decimal::ZERO {
            return Err(AppError::validation(format!(
                "Discount value must be non-negative, got: {}",
                discount_value
            )));
        }
        if discount_type == DiscountType::Percentage && discount_value > Decimal::ONE_HUNDRED {
            return Err(AppError::validation(format!(
                "Percentage discount cannot exceed 100, got: {}",
                discount_value
            )));
        }
        Ok(())
    }

    /// A fixed discount is an amount in the invoice currency and must sit on
    /// its minor unit
    pub fn validate_for_currency(
        discount_type: DiscountType,
        discount_value: Decimal,
        currency: Currency,
    ) -> Result<()> {
        if discount_type == DiscountType::Fixed {
            currency
                .validate_amount(discount_value)
                .map_err(|e| AppError::validation(format!("Fixed discount: {}", e)))?;
        }
        Ok(())
    }
}
