use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use crate::core::{AppError, Result};
use crate::modules::invoices::models::PaymentMethod;
use crate::modules::invoices::services::{InvoiceEvent, InvoiceService};
use crate::modules::transactions::models::{
    GatewayWebhookPayload, ReconciliationEvent, ReconciliationOutcome,
};

/// Applies gateway settlements to invoices.
///
/// Gateways deliver at least once, so a reference already recorded on the
/// invoice is acknowledged as a duplicate instead of being applied again.
pub struct ReconciliationService {
    invoice_service: Arc<InvoiceService>,
}

impl ReconciliationService {
    pub fn new(invoice_service: Arc<InvoiceService>) -> Self {
        Self { invoice_service }
    }

    /// Handle a verified webhook from `gateway`
    pub async fn handle_webhook(
        &self,
        gateway: PaymentMethod,
        payload: &GatewayWebhookPayload,
    ) -> Result<ReconciliationOutcome> {
        let Some(event) = payload.to_event() else {
            info!(
                gateway = %gateway,
                invoice_id = %payload.invoice_id,
                reference = %payload.reference,
                "Gateway reported a failed settlement"
            );
            return Ok(ReconciliationOutcome::Ignored {
                invoice_id: payload.invoice_id,
                reason: "settlement failed".to_string(),
            });
        };

        if let Some(currency) = payload.currency {
            let invoice = self.invoice_service.get(payload.invoice_id).await?;
            if invoice.currency != currency {
                return Err(AppError::validation(format!(
                    "Settlement currency {} does not match invoice currency {}",
                    currency, invoice.currency
                )));
            }
        }

        info!(
            gateway = %gateway,
            invoice_id = %event.invoice_id,
            reference = %event.gateway_ref,
            amount = %event.amount_settled,
            "Reconciling gateway settlement"
        );

        self.reconcile(&event).await
    }

    /// Record a settlement unless its reference is already on the invoice
    pub async fn reconcile(&self, event: &ReconciliationEvent) -> Result<ReconciliationOutcome> {
        if event.gateway_ref.is_empty() {
            return Err(AppError::validation("Settlement reference cannot be empty"));
        }

        let invoice = self.invoice_service.get(event.invoice_id).await?;
        if invoice.has_payment_ref(&event.gateway_ref) {
            info!(
                invoice_id = %invoice.id,
                reference = %event.gateway_ref,
                "Settlement already recorded"
            );
            return Ok(ReconciliationOutcome::Duplicate {
                invoice_id: invoice.id,
                gateway_ref: event.gateway_ref.clone(),
            });
        }

        // Pinned to the version checked above: a concurrent delivery of the
        // same reference loses with ConcurrencyConflict and is seen as a
        // duplicate when the gateway retries
        let updated = self
            .invoice_service
            .apply_event(
                invoice.id,
                InvoiceEvent::RecordPayment {
                    amount: event.amount_settled,
                    gateway_ref: Some(event.gateway_ref.clone()),
                },
                Some(invoice.version),
                Utc::now(),
            )
            .await?;

        Ok(ReconciliationOutcome::Applied {
            invoice_id: updated.id,
            gateway_ref: event.gateway_ref.clone(),
            status: updated.status,
            remaining_balance: updated.remaining_balance(),
        })
    }
}
