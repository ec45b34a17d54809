use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::debug;

use crate::core::{AppError, Currency, Result};
use crate::modules::invoices::models::LineItem;
use crate::modules::promotions::models::{Promotion, PromotionDefinition};
use crate::modules::promotions::repositories::PromotionCatalog;

/// Validates a discount code against an order and realizes its discount.
///
/// Percentage promotions are computed from the subtotal passed in at
/// resolution time, so a draft whose items change gets a new discount on
/// the next resolution. Fixed promotions are independent of the subtotal.
#[derive(Clone)]
pub struct PromotionResolver {
    catalog: Arc<dyn PromotionCatalog>,
}

impl PromotionResolver {
    pub fn new(catalog: Arc<dyn PromotionCatalog>) -> Self {
        Self { catalog }
    }

    /// Resolve `code` for an order
    ///
    /// # Errors
    /// * `PromotionEmpty` - blank code
    /// * `PromotionInvalid` - unknown, inactive, outside its window, or the
    ///   order does not meet the definition's minimums
    pub fn resolve(
        &self,
        code: &str,
        subtotal: Decimal,
        items: &[LineItem],
        currency: Currency,
        now: DateTime<Utc>,
    ) -> Result<Promotion> {
        let normalized = PromotionDefinition::normalize_code(code);
        if normalized.is_empty() {
            return Err(AppError::PromotionEmpty);
        }

        let definition = self.catalog.find_by_code(&normalized).ok_or_else(|| {
            AppError::promotion_invalid(format!("Unknown promotion code '{}'", normalized))
        })?;

        Self::check_applicable(&definition, &normalized, subtotal, items, currency, now)?;

        let discount_amount =
            definition
                .discount_type
                .discount_amount(definition.discount_value, subtotal, currency)?;

        debug!(
            code = %normalized,
            discount_type = %definition.discount_type,
            discount_value = %definition.discount_value,
            discount_amount = %discount_amount,
            "Resolved promotion"
        );

        Ok(Promotion {
            code: Some(normalized),
            discount_type: definition.discount_type,
            discount_value: definition.discount_value,
            discount_amount,
        })
    }

    fn check_applicable(
        definition: &PromotionDefinition,
        code: &str,
        subtotal: Decimal,
        items: &[LineItem],
        currency: Currency,
        now: DateTime<Utc>,
    ) -> Result<()> {
        PromotionDefinition::validate_value(definition.discount_type, definition.discount_value)
            .and_then(|_| {
                PromotionDefinition::validate_for_currency(
                    definition.discount_type,
                    definition.discount_value,
                    currency,
                )
            })
            .map_err(|e| AppError::promotion_invalid(format!("Promotion '{}' is misconfigured: {}", code, e)))?;

        if !definition.active {
            return Err(AppError::promotion_invalid(format!(
                "Promotion '{}' is not active",
                code
            )));
        }

        if let Some(starts_at) = definition.starts_at {
            if now < starts_at {
                return Err(AppError::promotion_invalid(format!(
                    "Promotion '{}' starts at {}",
                    code,
                    starts_at.to_rfc3339()
                )));
            }
        }

        if let Some(ends_at) = definition.ends_at {
            if now > ends_at {
                return Err(AppError::promotion_invalid(format!(
                    "Promotion '{}' expired at {}",
                    code,
                    ends_at.to_rfc3339()
                )));
            }
        }

        if let Some(min_subtotal) = definition.min_subtotal {
            if subtotal < min_subtotal {
                return Err(AppError::promotion_invalid(format!(
                    "Promotion '{}' requires a subtotal of at least {}, got {}",
                    code, min_subtotal, subtotal
                )));
            }
        }

        if let Some(min_quantity) = definition.min_quantity {
            let quantity: u64 = items.iter().map(|item| u64::from(item.quantity)).sum();
            if quantity < u64::from(min_quantity) {
                return Err(AppError::promotion_invalid(format!(
                    "Promotion '{}' requires at least {} items, got {}",
                    code, min_quantity, quantity
                )));
            }
        }

        Ok(())
    }
}
