// A line item is a single product or service on an invoice. Its subtotal
// is always derived (quantity × unit_price) and never stored separately,
// so an edited draft can never carry a stale figure.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::{AppError, Currency, Result};

/// Represents a single line item in an invoice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    /// Description of the product or service
    pub description: String,

    /// Quantity of items
    pub quantity: u32,

    /// Price per unit, in the invoice currency
    pub unit_price: Decimal,
}

impl LineItem {
    /// Create a new line item with validation
    ///
    /// # Arguments
    /// * `description` - Product/service description (max 255 chars)
    /// * `quantity` - Must be at least 1
    /// * `unit_price` - Must be non-negative
    pub fn new(description: impl Into<String>, quantity: u32, unit_price: Decimal) -> Result<Self> {
        let item = Self {
            description: description.into(),
            quantity,
            unit_price,
        };
        item.validate()?;
        Ok(item)
    }

    /// Checks the line item invariants. Items that arrive through
    /// deserialization bypass `new`, so callers re-check here.
    pub fn validate(&self) -> Result<()> {
        Self::validate_description(&self.description)?;
        Self::validate_quantity(self.quantity)?;
        Self::validate_unit_price(self.unit_price)?;
        Ok(())
    }

    /// Validates the unit price against the currency's minor unit
    pub fn validate_for_currency(&self, currency: Currency) -> Result<()> {
        currency.validate_amount(self.unit_price).map_err(|e| {
            AppError::validation(format!("Line item '{}': {}", self.description, e))
        })
    }

    /// Formula: subtotal = quantity × unit_price (exact, unrounded)
    ///
    /// # Errors
    /// * `Validation` - the product does not fit a decimal
    pub fn subtotal(&self) -> Result<Decimal> {
        Decimal::from(self.quantity)
            .checked_mul(self.unit_price)
            .ok_or_else(|| {
                AppError::validation(format!(
                    "Line item '{}': {} × {} is out of range",
                    self.description, self.quantity, self.unit_price
                ))
            })
    }

    fn validate_description(description: &str) -> Result<()> {
        if description.trim().is_empty() {
            return Err(AppError::validation("Line item description cannot be empty"));
        }

        if description.chars().count() > 255 {
            return Err(AppError::validation(
                "Line item description cannot exceed 255 characters",
            ));
        }

        Ok(())
    }

    fn validate_quantity(quantity: u32) -> Result<()> {
        if quantity < 1 {
            return Err(AppError::validation(format!(
                "Quantity must be at least 1, got: {}",
                quantity
            )));
        }

        Ok(())
    }

    fn validate_unit_price(unit_price: Decimal) -> Result<()> {
        if unit_price < Decimal::ZERO {
            return Err(AppError::validation(format!(
                "Unit price must be non-negative, got: {}",
                unit_price
            )));
        }

        Ok(())
    }
}
