use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use tracing::{debug, info};
use uuid::Uuid;

use crate::core::{AppError, Currency, Result};
use crate::modules::installments::services::InstallmentPlanner;
use crate::modules::invoices::models::{
    Invoice, InvoiceDraftRequest, InvoiceStatus, LineItem, ManualDiscount, PaymentMethod,
    TotalsRequest, TotalsResponse,
};
use crate::modules::invoices::repositories::{InvoiceFilter, InvoiceRepository};
use crate::modules::invoices::services::lifecycle::{InvoiceEvent, InvoiceLifecycle};
use crate::modules::invoices::services::totals_calculator::{Totals, TotalsCalculator};
use crate::modules::promotions::models::Promotion;
use crate::modules::promotions::services::PromotionResolver;

/// Service for invoice business logic
///
/// Every write follows the same shape: load, run the pure computation or
/// transition, then store with the version that was loaded. Nothing is
/// written when any step fails.
pub struct InvoiceService {
    invoice_repo: Arc<dyn InvoiceRepository>,
    resolver: PromotionResolver,
    default_due_days: i64,
}

impl InvoiceService {
    pub fn new(
        invoice_repo: Arc<dyn InvoiceRepository>,
        resolver: PromotionResolver,
        default_due_days: i64,
    ) -> Self {
        Self {
            invoice_repo,
            resolver,
            default_due_days,
        }
    }

    /// Compute totals for a prospective invoice without storing anything
    pub fn preview_totals(&self, request: &TotalsRequest) -> Result<TotalsResponse> {
        let (promotion, totals) = self.price(
            request.currency,
            &request.line_items,
            request.tax_rate,
            request.promotion_code.as_deref(),
            request.manual_discount.as_ref(),
            Utc::now(),
        )?;

        Ok(TotalsResponse {
            currency: request.currency,
            formatted_total: request.currency.format_amount(totals.total),
            totals,
            promotion,
        })
    }

    /// Create a draft invoice
    pub async fn create_draft(&self, request: InvoiceDraftRequest) -> Result<Invoice> {
        let now = Utc::now();
        let draft = Invoice {
            id: Uuid::new_v4(),
            client_id: String::new(),
            currency: request.currency,
            line_items: Vec::new(),
            tax_rate: Decimal::ZERO,
            promotion: None,
            payment_plan: None,
            status: InvoiceStatus::Draft,
            payment_method: None,
            issue_date: now.date_naive(),
            due_date: now.date_naive(),
            subtotal: Decimal::ZERO,
            tax_amount: Decimal::ZERO,
            discount_amount: Decimal::ZERO,
            total: Decimal::ZERO,
            amount_paid: Decimal::ZERO,
            payments: Vec::new(),
            version: 0,
            issued_at: None,
            created_at: now,
            updated_at: now,
        };
        let draft = self.apply_draft(draft, request, now)?;

        let created = self.invoice_repo.create(&draft).await?;

        info!(
            invoice_id = %created.id,
            client_id = %created.client_id,
            total = %created.total,
            currency = %created.currency,
            "Draft invoice created"
        );

        Ok(created)
    }

    /// Replace the editable content of a draft and recompute its amounts
    pub async fn revise_draft(&self, id: Uuid, request: InvoiceDraftRequest) -> Result<Invoice> {
        let loaded = self.load(id).await?;
        Self::check_version(&loaded, request.expected_version)?;

        if !loaded.is_mutable() {
            return Err(AppError::illegal_transition(loaded.status, "revise"));
        }

        let now = Utc::now();
        let revised = self.apply_draft(loaded.clone(), request, now)?;
        let stored = self.invoice_repo.update(&revised, loaded.version).await?;

        debug!(invoice_id = %stored.id, version = stored.version, "Draft invoice revised");
        Ok(stored)
    }

    /// Freeze a draft and send it.
    ///
    /// The promotion is re-resolved and the amounts recomputed first, so the
    /// snapshot taken is the one valid at issuance.
    pub async fn issue(&self, id: Uuid, expected_version: Option<i64>) -> Result<Invoice> {
        let loaded = self.load(id).await?;
        Self::check_version(&loaded, expected_version)?;

        let now = Utc::now();
        let candidate = if loaded.status == InvoiceStatus::Draft {
            self.refresh_draft(&loaded, now)?
        } else {
            loaded.clone()
        };

        let issued = InvoiceLifecycle::transition(&candidate, &InvoiceEvent::Issue, now)?;
        self.invoice_repo.update(&issued, loaded.version).await
    }

    /// Record a payment against an issued invoice
    pub async fn record_payment(
        &self,
        id: Uuid,
        amount: Decimal,
        gateway_ref: Option<String>,
        expected_version: Option<i64>,
    ) -> Result<Invoice> {
        self.apply_event(
            id,
            InvoiceEvent::RecordPayment {
                amount,
                gateway_ref,
            },
            expected_version,
            Utc::now(),
        )
        .await
    }

    pub async fn cancel(&self, id: Uuid, expected_version: Option<i64>) -> Result<Invoice> {
        self.apply_event(id, InvoiceEvent::Cancel, expected_version, Utc::now())
            .await
    }

    /// Mark a sent invoice overdue as of `now`
    pub async fn mark_overdue(&self, id: Uuid, now: DateTime<Utc>) -> Result<Invoice> {
        self.apply_event(id, InvoiceEvent::MarkOverdue, None, now)
            .await
    }

    /// Record the client's intended payment method. Never changes status.
    pub async fn select_payment_method(
        &self,
        id: Uuid,
        method: PaymentMethod,
        expected_version: Option<i64>,
    ) -> Result<Invoice> {
        let loaded = self.load(id).await?;
        Self::check_version(&loaded, expected_version)?;

        let next = InvoiceLifecycle::select_payment_method(&loaded, method, Utc::now())?;
        if next == loaded {
            debug!(invoice_id = %id, "Payment method selection ignored on paid invoice");
            return Ok(loaded);
        }

        self.invoice_repo.update(&next, loaded.version).await
    }

    /// Run one lifecycle event against the stored invoice
    pub async fn apply_event(
        &self,
        id: Uuid,
        event: InvoiceEvent,
        expected_version: Option<i64>,
        now: DateTime<Utc>,
    ) -> Result<Invoice> {
        let loaded = self.load(id).await?;
        Self::check_version(&loaded, expected_version)?;

        let next = InvoiceLifecycle::transition(&loaded, &event, now)?;
        self.invoice_repo.update(&next, loaded.version).await
    }

    pub async fn get(&self, id: Uuid) -> Result<Invoice> {
        self.load(id).await
    }

    pub async fn list(&self, filter: &InvoiceFilter) -> Result<Vec<Invoice>> {
        self.invoice_repo.list(filter).await
    }

    /// Sent invoices that are past due with nothing paid
    pub async fn overdue_candidates(&self, now: DateTime<Utc>) -> Result<Vec<Invoice>> {
        self.invoice_repo
            .find_overdue_candidates(now.date_naive())
            .await
    }

    async fn load(&self, id: Uuid) -> Result<Invoice> {
        self.invoice_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Invoice with id '{}'", id)))
    }

    fn check_version(invoice: &Invoice, expected_version: Option<i64>) -> Result<()> {
        match expected_version {
            Some(expected) if expected != invoice.version => Err(AppError::conflict(format!(
                "Invoice '{}' is at version {}, request expected {}",
                invoice.id, invoice.version, expected
            ))),
            _ => Ok(()),
        }
    }

    /// Resolve the discount and compute totals for a set of items
    fn price(
        &self,
        currency: Currency,
        items: &[LineItem],
        tax_rate: Decimal,
        promotion_code: Option<&str>,
        manual_discount: Option<&ManualDiscount>,
        now: DateTime<Utc>,
    ) -> Result<(Option<Promotion>, Totals)> {
        let subtotal = TotalsCalculator::subtotal(items, currency)?;

        let promotion = match (promotion_code, manual_discount) {
            (Some(_), Some(_)) => {
                return Err(AppError::validation(
                    "Provide either a promotion code or a manual discount, not both",
                ))
            }
            (Some(code), None) => Some(self.resolver.resolve(code, subtotal, items, currency, now)?),
            (None, Some(manual)) => Some(Promotion::manual(
                manual.discount_type,
                manual.discount_value,
                subtotal,
                currency,
            )?),
            (None, None) => None,
        };

        let totals = TotalsCalculator::compute(items, tax_rate, promotion.as_ref(), currency)?;
        Ok((promotion, totals))
    }

    fn apply_draft(
        &self,
        mut invoice: Invoice,
        request: InvoiceDraftRequest,
        now: DateTime<Utc>,
    ) -> Result<Invoice> {
        let client_id = request.client_id.trim();
        if client_id.is_empty() {
            return Err(AppError::validation("Client id cannot be empty"));
        }

        let (promotion, totals) = self.price(
            request.currency,
            &request.line_items,
            request.tax_rate,
            request.promotion_code.as_deref(),
            request.manual_discount.as_ref(),
            now,
        )?;

        let payment_plan = match &request.payment_plan {
            Some(plan) if plan.is_installment => Some(InstallmentPlanner::build_plan(
                totals.total,
                plan,
                request.currency,
            )?),
            _ => None,
        };

        let issue_date = request.issue_date.unwrap_or_else(|| now.date_naive());
        let due_date = request
            .due_date
            .unwrap_or_else(|| issue_date + Duration::days(self.default_due_days));
        if due_date < issue_date {
            return Err(AppError::validation(format!(
                "Due date {} is before issue date {}",
                due_date, issue_date
            )));
        }

        invoice.client_id = client_id.to_string();
        invoice.currency = request.currency;
        invoice.line_items = request.line_items;
        invoice.tax_rate = request.tax_rate;
        invoice.promotion = promotion;
        invoice.payment_plan = payment_plan;
        invoice.payment_method = request.payment_method;
        invoice.issue_date = issue_date;
        invoice.due_date = due_date;
        invoice.apply_totals(totals);
        invoice.updated_at = now;
        Ok(invoice)
    }

    /// Re-resolve a coded promotion and recompute amounts as of `now`
    fn refresh_draft(&self, draft: &Invoice, now: DateTime<Utc>) -> Result<Invoice> {
        let subtotal = TotalsCalculator::subtotal(&draft.line_items, draft.currency)?;

        let promotion = match &draft.promotion {
            Some(Promotion {
                code: Some(code), ..
            }) => Some(self.resolver.resolve(
                code,
                subtotal,
                &draft.line_items,
                draft.currency,
                now,
            )?),
            Some(manual) => Some(Promotion::manual(
                manual.discount_type,
                manual.discount_value,
                subtotal,
                draft.currency,
            )?),
            None => None,
        };

        let totals = TotalsCalculator::compute(
            &draft.line_items,
            draft.tax_rate,
            promotion.as_ref(),
            draft.currency,
        )?;

        let mut refreshed = draft.clone();
        refreshed.promotion = promotion;
        refreshed.apply_totals(totals);
        Ok(refreshed)
    }
}
