use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::core::{AppError, Currency, Result};
use crate::modules::installments::models::{InstallmentPeriod, PaymentPlan, PaymentPlanRequest};

/// Validates installment plans against a computed invoice total.
///
/// A plan whose figures do not add up is rejected rather than adjusted:
/// the figures are what the client agreed to pay.
pub struct InstallmentPlanner;

impl InstallmentPlanner {
    /// Build a validated plan for `total`
    ///
    /// Rule: |down_payment + count × installment_amount − total| ≤ one minor unit
    ///
    /// # Errors
    /// * `PlanInvalid` - count below 1, negative figures, off-scale amounts, or a sum mismatch
    pub fn build_plan(
        total: Decimal,
        request: &PaymentPlanRequest,
        currency: Currency,
    ) -> Result<PaymentPlan> {
        if !request.is_installment {
            return Ok(PaymentPlan::lump_sum());
        }

        let plan = PaymentPlan {
            is_installment: true,
            down_payment: request.down_payment,
            installments_count: request.installments_count,
            installment_amount: request.installment_amount,
            period: request.period,
        };
        Self::validate(&plan, total, currency)?;

        debug!(
            total = %total,
            down_payment = %plan.down_payment,
            installments_count = plan.installments_count,
            installment_amount = %plan.installment_amount,
            period = %plan.period,
            "Validated installment plan"
        );

        Ok(plan)
    }

    /// Derive the per-installment amount for a down payment and count,
    /// then validate the result with the same rule as `build_plan`
    pub fn suggest(
        total: Decimal,
        down_payment: Decimal,
        installments_count: u32,
        period: InstallmentPeriod,
        currency: Currency,
    ) -> Result<PaymentPlan> {
        if installments_count < 1 {
            return Err(AppError::plan_invalid(
                "Installments count must be at least 1",
            ));
        }
        if down_payment > total {
            return Err(AppError::plan_invalid(format!(
                "Down payment ({}) exceeds invoice total ({})",
                down_payment, total
            )));
        }

        let remainder = total.checked_sub(down_payment).ok_or_else(|| {
            AppError::plan_invalid(format!(
                "Down payment ({}) is out of range for total ({})",
                down_payment, total
            ))
        })?;
        let installment_amount = currency.round(remainder / Decimal::from(installments_count));

        Self::build_plan(
            total,
            &PaymentPlanRequest {
                is_installment: true,
                down_payment,
                installments_count,
                installment_amount,
                period,
            },
            currency,
        )
    }

    /// Check an existing plan against a (possibly recomputed) total
    pub fn validate(plan: &PaymentPlan, total: Decimal, currency: Currency) -> Result<()> {
        if !plan.is_installment {
            return Ok(());
        }

        if plan.installments_count < 1 {
            return Err(AppError::plan_invalid(format!(
                "Installments count must be at least 1, got {}",
                plan.installments_count
            )));
        }

        if plan.down_payment < Decimal::ZERO {
            return Err(AppError::plan_invalid("Down payment cannot be negative"));
        }

        if plan.installment_amount < Decimal::ZERO {
            return Err(AppError::plan_invalid("Installment amount cannot be negative"));
        }

        for (label, amount) in [
            ("Down payment", plan.down_payment),
            ("Installment amount", plan.installment_amount),
        ] {
            currency
                .validate_amount(amount)
                .map_err(|e| AppError::plan_invalid(format!("{}: {}", label, e)))?;
        }

        let scheduled = plan.scheduled_total()?;
        if !currency.within_tolerance(scheduled, total) {
            warn!(
                scheduled = %scheduled,
                total = %total,
                "Installment plan does not match invoice total"
            );
            return Err(AppError::plan_invalid(format!(
                "Down payment ({}) + {} × {} = {} does not match invoice total ({})",
                plan.down_payment,
                plan.installments_count,
                plan.installment_amount,
                scheduled,
                total
            )));
        }

        Ok(())
    }
}
