pub mod reconciliation_service;
pub mod webhook_verifier;

pub use reconciliation_service::ReconciliationService;
pub use webhook_verifier::WebhookVerifier;
