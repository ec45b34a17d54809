mod reconciliation;

pub use reconciliation::{
    GatewayWebhookPayload, ReconciliationEvent, ReconciliationOutcome, SettlementStatus,
};
