use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::Currency;
use crate::modules::invoices::models::InvoiceStatus;

/// A gateway settlement as seen by the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationEvent {
    pub invoice_id: Uuid,
    pub amount_settled: Decimal,
    pub gateway_ref: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettlementStatus {
    Settled,
    Failed,
}

/// Webhook body posted by a payment gateway
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayWebhookPayload {
    pub invoice_id: Uuid,
    pub amount: Decimal,
    pub reference: String,
    pub status: SettlementStatus,
    #[serde(default)]
    pub currency: Option<Currency>,
}

impl GatewayWebhookPayload {
    /// Settled payloads become reconciliation events; failed ones carry nothing to apply
    pub fn to_event(&self) -> Option<ReconciliationEvent> {
        match self.status {
            SettlementStatus::Settled => Some(ReconciliationEvent {
                invoice_id: self.invoice_id,
                amount_settled: self.amount,
                gateway_ref: self.reference.trim().to_string(),
            }),
            SettlementStatus::Failed => None,
        }
    }
}

/// What happened to a webhook delivery
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum ReconciliationOutcome {
    /// Payment recorded
    Applied {
        invoice_id: Uuid,
        gateway_ref: String,
        status: InvoiceStatus,
        remaining_balance: Decimal,
    },
    /// This reference was already recorded on the invoice
    Duplicate { invoice_id: Uuid, gateway_ref: String },
    /// Acknowledged without effect
    Ignored { invoice_id: Uuid, reason: String },
}
