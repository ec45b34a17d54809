// An invoice owns its line items and value snapshots of its promotion and
// payment plan. Amounts are recomputed on every edit while in draft and
// frozen once the invoice is issued; from then on only the status, payment
// method and reconciliation fields change.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::line_item::LineItem;
use crate::core::{AppError, Currency};
use crate::modules::installments::models::{PaymentPlan, PaymentPlanRequest, PlanProgress};
use crate::modules::invoices::services::totals_calculator::Totals;
use crate::modules::promotions::models::{DiscountType, Promotion};

/// Invoice status lifecycle
///
/// ```text
/// draft -> sent -> {partial, paid, overdue}
/// overdue -> {partial, paid}
/// partial -> {partial, paid}
/// any non-terminal -> cancelled
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    /// Being edited; amounts recomputed on every change
    #[default]
    Draft,
    /// Issued to the client, awaiting payment
    Sent,
    /// Some payment recorded, balance remaining
    Partial,
    /// Due date elapsed with nothing paid
    Overdue,
    /// Fully paid (terminal)
    Paid,
    /// Cancelled (terminal)
    Cancelled,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "draft",
            InvoiceStatus::Sent => "sent",
            InvoiceStatus::Partial => "partial",
            InvoiceStatus::Overdue => "overdue",
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, InvoiceStatus::Paid | InvoiceStatus::Cancelled)
    }

    /// Statuses that accept a recorded payment
    pub fn accepts_payment(&self) -> bool {
        matches!(
            self,
            InvoiceStatus::Sent | InvoiceStatus::Partial | InvoiceStatus::Overdue
        )
    }
}

impl std::fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for InvoiceStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "draft" => Ok(InvoiceStatus::Draft),
            "sent" => Ok(InvoiceStatus::Sent),
            "partial" => Ok(InvoiceStatus::Partial),
            "overdue" => Ok(InvoiceStatus::Overdue),
            "paid" => Ok(InvoiceStatus::Paid),
            "cancelled" => Ok(InvoiceStatus::Cancelled),
            _ => Err(format!("Invalid invoice status: {}", s)),
        }
    }
}

/// How the client intends to pay. Recording intent never changes status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    BankTransfer,
    Cash,
    Card,
    Zarinpal,
    Stripe,
    Paypal,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::BankTransfer => "bank_transfer",
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::Zarinpal => "zarinpal",
            PaymentMethod::Stripe => "stripe",
            PaymentMethod::Paypal => "paypal",
        }
    }

    /// Online gateways that settle through webhook callbacks
    pub fn is_gateway(&self) -> bool {
        matches!(
            self,
            PaymentMethod::Zarinpal | PaymentMethod::Stripe | PaymentMethod::Paypal
        )
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = AppError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "bank_transfer" => Ok(PaymentMethod::BankTransfer),
            "cash" => Ok(PaymentMethod::Cash),
            "card" => Ok(PaymentMethod::Card),
            "zarinpal" => Ok(PaymentMethod::Zarinpal),
            "stripe" => Ok(PaymentMethod::Stripe),
            "paypal" => Ok(PaymentMethod::Paypal),
            _ => Err(AppError::validation(format!("Unknown payment method: {}", s))),
        }
    }
}

/// A payment recorded against an invoice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub amount: Decimal,
    /// Gateway reference; present for gateway settlements, used for idempotency
    pub gateway_ref: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

/// Represents an invoice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: Uuid,

    /// Client this invoice is addressed to
    pub client_id: String,

    /// Currency for every amount on the invoice
    pub currency: Currency,

    /// Ordered line items
    pub line_items: Vec<LineItem>,

    /// Tax rate as a percentage in [0, 100]
    pub tax_rate: Decimal,

    pub promotion: Option<Promotion>,

    pub payment_plan: Option<PaymentPlan>,

    pub status: InvoiceStatus,

    pub payment_method: Option<PaymentMethod>,

    pub issue_date: NaiveDate,

    pub due_date: NaiveDate,

    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub discount_amount: Decimal,
    pub total: Decimal,

    /// Cumulative recorded payments
    pub amount_paid: Decimal,

    pub payments: Vec<PaymentRecord>,

    /// Incremented by the repository on every successful write
    pub version: i64,

    pub issued_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Invoice {
    /// remaining_balance = max(0, total − amount_paid); zero once paid, even
    /// when settlement came within the minor-unit tolerance
    pub fn remaining_balance(&self) -> Decimal {
        if self.status == InvoiceStatus::Paid {
            return Decimal::ZERO;
        }
        (self.total - self.amount_paid).max(Decimal::ZERO)
    }

    /// Line items, promotion and plan can only change while in draft
    pub fn is_mutable(&self) -> bool {
        self.status == InvoiceStatus::Draft
    }

    pub fn totals(&self) -> Totals {
        Totals {
            subtotal: self.subtotal,
            tax_amount: self.tax_amount,
            discount_amount: self.discount_amount,
            total: self.total,
        }
    }

    pub fn apply_totals(&mut self, totals: Totals) {
        self.subtotal = totals.subtotal;
        self.tax_amount = totals.tax_amount;
        self.discount_amount = totals.discount_amount;
        self.total = totals.total;
    }

    /// Whether a payment with this gateway reference was already recorded
    pub fn has_payment_ref(&self, gateway_ref: &str) -> bool {
        self.payments
            .iter()
            .any(|p| p.gateway_ref.as_deref() == Some(gateway_ref))
    }

    /// Whether the due date lies strictly before `now`'s date
    pub fn is_past_due(&self, now: DateTime<Utc>) -> bool {
        self.due_date < now.date_naive()
    }

    pub fn plan_progress(&self) -> Option<PlanProgress> {
        self.payment_plan
            .as_ref()
            .filter(|plan| plan.is_installment)
            .map(|plan| plan.progress(self.amount_paid))
    }
}

/// Author-entered discount not backed by a promotion code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManualDiscount {
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
}

/// Request body for creating or revising a draft invoice
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceDraftRequest {
    pub client_id: String,
    pub currency: Currency,
    pub line_items: Vec<LineItem>,
    #[serde(default)]
    pub tax_rate: Decimal,
    #[serde(default)]
    pub promotion_code: Option<String>,
    #[serde(default)]
    pub manual_discount: Option<ManualDiscount>,
    #[serde(default)]
    pub payment_plan: Option<PaymentPlanRequest>,
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
    #[serde(default)]
    pub issue_date: Option<NaiveDate>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    /// Version read by the caller; revisions are rejected if it is stale
    #[serde(default)]
    pub expected_version: Option<i64>,
}

/// Request body for a totals preview; nothing is stored
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TotalsRequest {
    pub currency: Currency,
    pub line_items: Vec<LineItem>,
    #[serde(default)]
    pub tax_rate: Decimal,
    #[serde(default)]
    pub promotion_code: Option<String>,
    #[serde(default)]
    pub manual_discount: Option<ManualDiscount>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TotalsResponse {
    pub currency: Currency,
    #[serde(flatten)]
    pub totals: Totals,
    pub promotion: Option<Promotion>,
    pub formatted_total: String,
}

/// Request body for issue and cancel
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransitionRequest {
    #[serde(default)]
    pub expected_version: Option<i64>,
}

/// Request body for recording a manual payment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordPaymentRequest {
    pub amount: Decimal,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub expected_version: Option<i64>,
}

/// Request body for selecting a payment method
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentMethodRequest {
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub expected_version: Option<i64>,
}

/// Invoice as returned by the API, with derived balance information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceResponse {
    #[serde(flatten)]
    pub invoice: Invoice,
    pub remaining_balance: Decimal,
    pub formatted_total: String,
    pub is_mutable: bool,
    pub plan_progress: Option<PlanProgress>,
}

impl From<Invoice> for InvoiceResponse {
    fn from(invoice: Invoice) -> Self {
        Self {
            remaining_balance: invoice.remaining_balance(),
            formatted_total: invoice.currency.format_amount(invoice.total),
            is_mutable: invoice.is_mutable(),
            plan_progress: invoice.plan_progress(),
            invoice,
        }
    }
}
