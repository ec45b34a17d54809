use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::{AppError, Currency, Result};
use crate::modules::invoices::models::LineItem;
use crate::modules::promotions::models::Promotion;

/// Amounts derived from an invoice's items, tax rate and promotion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub discount_amount: Decimal,
    pub total: Decimal,
}

/// Pure totals computation. Holds no state; calling it twice with the same
/// inputs yields the same result.
pub struct TotalsCalculator;

impl TotalsCalculator {
    /// Compute subtotal, tax, discount and total
    ///
    /// Formula:
    /// * subtotal = Σ(quantity × unit_price), exact
    /// * tax_amount = subtotal × tax_rate / 100, rounded per currency
    /// * discount_amount = promotion discount, capped at subtotal + tax
    /// * total = max(0, subtotal + tax_amount − discount)
    ///
    /// # Errors
    /// * `Validation` - empty item list, an invalid item, tax rate outside [0, 100],
    ///   or amounts too large to represent
    pub fn compute(
        items: &[LineItem],
        tax_rate: Decimal,
        promotion: Option<&Promotion>,
        currency: Currency,
    ) -> Result<Totals> {
        let subtotal = Self::subtotal(items, currency)?;
        let tax_amount = Self::tax_amount(subtotal, tax_rate, currency)?;

        let gross = subtotal
            .checked_add(tax_amount)
            .ok_or_else(|| AppError::validation("Invoice amount is out of range"))?;
        let requested_discount = promotion.map(|p| p.discount_amount).unwrap_or(Decimal::ZERO);
        if requested_discount < Decimal::ZERO {
            return Err(AppError::validation(format!(
                "Discount amount must be non-negative, got: {}",
                requested_discount
            )));
        }

        // A discount may make an invoice free, never negative
        let discount_amount = requested_discount.min(gross);
        let total = (gross - requested_discount).max(Decimal::ZERO);

        Ok(Totals {
            subtotal,
            tax_amount,
            discount_amount,
            total,
        })
    }

    /// Sum of quantity × unit_price over all items
    pub fn subtotal(items: &[LineItem], currency: Currency) -> Result<Decimal> {
        if items.is_empty() {
            return Err(AppError::validation(
                "Invoice must have at least one line item",
            ));
        }

        let mut subtotal = Decimal::ZERO;
        for (idx, item) in items.iter().enumerate() {
            item.validate()
                .map_err(|e| AppError::validation(format!("Line item {}: {}", idx, e)))?;
            item.validate_for_currency(currency)?;
            subtotal = subtotal
                .checked_add(item.subtotal()?)
                .ok_or_else(|| AppError::validation("Invoice subtotal is out of range"))?;
        }

        Ok(subtotal)
    }

    /// tax_amount = subtotal × tax_rate / 100
    pub fn tax_amount(subtotal: Decimal, tax_rate: Decimal, currency: Currency) -> Result<Decimal> {
        Self::validate_tax_rate(tax_rate)?;
        let taxed = subtotal
            .checked_mul(tax_rate)
            .ok_or_else(|| AppError::validation("Tax amount is out of range"))?;
        Ok(currency.round(taxed / Decimal::ONE_HUNDRED))
    }

    /// Tax rate is a percentage in [0, 100]
    pub fn validate_tax_rate(tax_rate: Decimal) -> Result<()> {
        if tax_rate < Decimal::ZERO {
            return Err(AppError::validation("Tax rate cannot be negative"));
        }

        if tax_rate > Decimal::ONE_HUNDRED {
            return Err(AppError::validation("Tax rate cannot exceed 100"));
        }

        Ok(())
    }
}
