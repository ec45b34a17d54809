use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::{AppError, Result};

/// Cadence label attached to an installment schedule
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstallmentPeriod {
    Weekly,
    #[default]
    Monthly,
    Quarterly,
}

impl std::fmt::Display for InstallmentPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InstallmentPeriod::Weekly => write!(f, "weekly"),
            InstallmentPeriod::Monthly => write!(f, "monthly"),
            InstallmentPeriod::Quarterly => write!(f, "quarterly"),
        }
    }
}

/// Requested plan terms, as entered by the invoice author
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentPlanRequest {
    pub is_installment: bool,
    #[serde(default)]
    pub down_payment: Decimal,
    #[serde(default)]
    pub installments_count: u32,
    #[serde(default)]
    pub installment_amount: Decimal,
    #[serde(default)]
    pub period: InstallmentPeriod,
}

/// A validated payment plan: a down payment followed by equal installments.
///
/// The plan carries counts and amounts only; dated due-entries are not
/// generated here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentPlan {
    pub is_installment: bool,
    pub down_payment: Decimal,
    pub installments_count: u32,
    pub installment_amount: Decimal,
    pub period: InstallmentPeriod,
}

/// How far a cumulative payment has progressed through a plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanProgress {
    pub down_payment_covered: bool,
    pub installments_covered: u32,
    pub installments_remaining: u32,
    /// Amount still owed on the next unpaid step, if any
    pub next_amount_due: Option<Decimal>,
}

impl PaymentPlan {
    /// Full amount due at once, no schedule
    pub fn lump_sum() -> Self {
        Self {
            is_installment: false,
            down_payment: Decimal::ZERO,
            installments_count: 0,
            installment_amount: Decimal::ZERO,
            period: InstallmentPeriod::default(),
        }
    }

    /// down_payment + installments_count × installment_amount
    ///
    /// # Errors
    /// * `PlanInvalid` - the schedule does not fit a decimal
    pub fn scheduled_total(&self) -> Result<Decimal> {
        Decimal::from(self.installments_count)
            .checked_mul(self.installment_amount)
            .and_then(|installments| installments.checked_add(self.down_payment))
            .ok_or_else(|| {
                AppError::plan_invalid(format!(
                    "Down payment ({}) + {} × {} is out of range",
                    self.down_payment, self.installments_count, self.installment_amount
                ))
            })
    }

    /// Progress of `amount_paid` through the plan. Payments fill the down
    /// payment first, then installments in order.
    pub fn progress(&self, amount_paid: Decimal) -> PlanProgress {
        if !self.is_installment {
            return PlanProgress {
                down_payment_covered: true,
                installments_covered: 0,
                installments_remaining: 0,
                next_amount_due: None,
            };
        }

        let paid = amount_paid.max(Decimal::ZERO);
        if paid < self.down_payment {
            return PlanProgress {
                down_payment_covered: false,
                installments_covered: 0,
                installments_remaining: self.installments_count,
                next_amount_due: Some(self.down_payment - paid),
            };
        }

        let towards_installments = paid - self.down_payment;
        // Zero-amount installments, or a quotient too large to represent,
        // count as fully covered
        let covered = towards_installments
            .checked_div(self.installment_amount)
            .and_then(|quotient| quotient.floor().to_u32())
            .unwrap_or(u32::MAX)
            .min(self.installments_count);
        let remaining = self.installments_count - covered;

        let next_amount_due = if remaining == 0 {
            None
        } else {
            let applied = Decimal::from(covered) * self.installment_amount;
            Some(self.installment_amount - (towards_installments - applied))
        };

        PlanProgress {
            down_payment_covered: true,
            installments_covered: covered,
            installments_remaining: remaining,
            next_amount_due,
        }
    }
}
