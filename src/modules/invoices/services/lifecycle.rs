use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::{AppError, Result};
use crate::modules::installments::services::InstallmentPlanner;
use crate::modules::invoices::models::{Invoice, InvoiceStatus, PaymentMethod, PaymentRecord};
use crate::modules::invoices::services::totals_calculator::TotalsCalculator;

/// Events that drive an invoice through its lifecycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum InvoiceEvent {
    /// draft -> sent
    Issue,
    /// sent/overdue/partial -> partial or paid
    RecordPayment {
        amount: Decimal,
        #[serde(default)]
        gateway_ref: Option<String>,
    },
    /// sent -> overdue, time-based
    MarkOverdue,
    /// any non-terminal -> cancelled
    Cancel,
}

impl InvoiceEvent {
    pub fn name(&self) -> &'static str {
        match self {
            InvoiceEvent::Issue => "issue",
            InvoiceEvent::RecordPayment { .. } => "record a payment on",
            InvoiceEvent::MarkOverdue => "mark overdue",
            InvoiceEvent::Cancel => "cancel",
        }
    }
}

/// The invoice status state machine.
///
/// `transition` never mutates its input: it returns the next invoice or an
/// error, so a rejected event leaves the caller's copy untouched.
pub struct InvoiceLifecycle;

impl InvoiceLifecycle {
    pub fn transition(invoice: &Invoice, event: &InvoiceEvent, now: DateTime<Utc>) -> Result<Invoice> {
        let from = invoice.status;
        let next = match event {
            InvoiceEvent::Issue => Self::issue(invoice, now)?,
            InvoiceEvent::RecordPayment {
                amount,
                gateway_ref,
            } => Self::record_payment(invoice, *amount, gateway_ref.as_deref(), now)?,
            InvoiceEvent::MarkOverdue => Self::mark_overdue(invoice, now)?,
            InvoiceEvent::Cancel => Self::cancel(invoice, now)?,
        };

        info!(
            invoice_id = %invoice.id,
            from = %from,
            to = %next.status,
            event = event.name(),
            "Invoice transitioned"
        );

        Ok(next)
    }

    /// Record payment intent. Never changes status; ignored once paid.
    pub fn select_payment_method(
        invoice: &Invoice,
        method: PaymentMethod,
        now: DateTime<Utc>,
    ) -> Result<Invoice> {
        match invoice.status {
            InvoiceStatus::Paid => Ok(invoice.clone()),
            InvoiceStatus::Cancelled => Err(AppError::illegal_transition(
                invoice.status,
                "select a payment method for",
            )),
            _ => {
                let mut next = invoice.clone();
                next.payment_method = Some(method);
                next.updated_at = now;
                Ok(next)
            }
        }
    }

    fn issue(invoice: &Invoice, now: DateTime<Utc>) -> Result<Invoice> {
        if invoice.status != InvoiceStatus::Draft {
            return Err(AppError::illegal_transition(invoice.status, "issue"));
        }

        // Re-derive the amounts being frozen so a draft with stale figures
        // can never be issued
        let totals = TotalsCalculator::compute(
            &invoice.line_items,
            invoice.tax_rate,
            invoice.promotion.as_ref(),
            invoice.currency,
        )?;
        if totals != invoice.totals() {
            return Err(AppError::validation(
                "Invoice amounts are stale; recompute the draft before issuing",
            ));
        }
        if totals.total < Decimal::ZERO {
            return Err(AppError::validation("Invoice total cannot be negative"));
        }

        if let Some(plan) = &invoice.payment_plan {
            InstallmentPlanner::validate(plan, totals.total, invoice.currency)?;
        }

        if invoice.due_date < invoice.issue_date {
            return Err(AppError::validation(format!(
                "Due date {} is before issue date {}",
                invoice.due_date, invoice.issue_date
            )));
        }

        let mut next = invoice.clone();
        next.status = InvoiceStatus::Sent;
        next.issued_at = Some(now);
        next.updated_at = now;
        Ok(next)
    }

    fn record_payment(
        invoice: &Invoice,
        amount: Decimal,
        gateway_ref: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Invoice> {
        if !invoice.status.accepts_payment() {
            return Err(AppError::illegal_transition(
                invoice.status,
                "record a payment on",
            ));
        }

        if amount <= Decimal::ZERO {
            return Err(AppError::validation(format!(
                "Payment amount must be positive, got: {}",
                amount
            )));
        }
        invoice
            .currency
            .validate_amount(amount)
            .map_err(AppError::validation)?;

        if let Some(reference) = gateway_ref {
            if reference.trim().is_empty() {
                return Err(AppError::validation("Payment reference cannot be blank"));
            }
            if invoice.has_payment_ref(reference) {
                return Err(AppError::validation(format!(
                    "Payment '{}' is already recorded on this invoice",
                    reference
                )));
            }
        }

        let mut next = invoice.clone();
        next.amount_paid = invoice.amount_paid.checked_add(amount).ok_or_else(|| {
            AppError::validation(format!("Payment of {} is out of range", amount))
        })?;
        next.payments.push(PaymentRecord {
            amount,
            gateway_ref: gateway_ref.map(str::to_string),
            recorded_at: now,
        });

        let settled = next.amount_paid >= next.total
            || next.currency.within_tolerance(next.amount_paid, next.total);
        if settled {
            next.status = InvoiceStatus::Paid;
            next.payment_method = None;
        } else {
            next.status = InvoiceStatus::Partial;
        }
        next.updated_at = now;
        Ok(next)
    }

    fn mark_overdue(invoice: &Invoice, now: DateTime<Utc>) -> Result<Invoice> {
        if invoice.status != InvoiceStatus::Sent {
            return Err(AppError::illegal_transition(invoice.status, "mark overdue"));
        }
        if !invoice.is_past_due(now) {
            return Err(AppError::illegal_transition(
                invoice.status,
                format!("mark overdue before its due date {}", invoice.due_date),
            ));
        }
        if invoice.amount_paid > Decimal::ZERO {
            return Err(AppError::illegal_transition(
                invoice.status,
                "mark overdue after a payment was recorded on",
            ));
        }

        let mut next = invoice.clone();
        next.status = InvoiceStatus::Overdue;
        next.updated_at = now;
        Ok(next)
    }

    fn cancel(invoice: &Invoice, now: DateTime<Utc>) -> Result<Invoice> {
        if invoice.status.is_terminal() {
            return Err(AppError::illegal_transition(invoice.status, "cancel"));
        }

        let mut next = invoice.clone();
        next.status = InvoiceStatus::Cancelled;
        next.updated_at = now;
        Ok(next)
    }
}
