// Gateway reconciliation module

pub mod controllers;
pub mod models;
pub mod services;

pub use models::{GatewayWebhookPayload, ReconciliationEvent, ReconciliationOutcome};
pub use services::{ReconciliationService, WebhookVerifier};
