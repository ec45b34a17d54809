use std::str::FromStr;
use std::sync::Arc;

use actix_web::{post, web, HttpRequest, HttpResponse};
use tracing::info;

use crate::core::{AppError, Result};
use crate::modules::invoices::models::PaymentMethod;
use crate::modules::transactions::models::GatewayWebhookPayload;
use crate::modules::transactions::services::webhook_verifier::SIGNATURE_HEADER;
use crate::modules::transactions::services::{ReconciliationService, WebhookVerifier};

/// Configure webhook routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/webhooks").service(process_webhook));
}

/// Process a payment gateway webhook
///
/// POST /webhooks/{gateway}
///
/// # Path Parameters
/// * `gateway` - One of the gateway payment methods (zarinpal, stripe, paypal)
///
/// # Headers
/// * `X-Signature` - Hex HMAC-SHA256 of the raw body with the shared secret
///
/// # Returns
/// * `200 OK` - Settlement applied, duplicate, or failed settlement acknowledged
/// * `400 Bad Request` - Unknown gateway, malformed payload or currency mismatch
/// * `401 Unauthorized` - Missing or invalid signature
/// * `409 Conflict` - Invoice cannot take the payment, or was modified concurrently
#[post("/{gateway}")]
async fn process_webhook(
    req: HttpRequest,
    path: web::Path<String>,
    body: web::Bytes,
    verifier: web::Data<WebhookVerifier>,
    service: web::Data<Arc<ReconciliationService>>,
) -> Result<HttpResponse> {
    let gateway = parse_gateway(&path)?;

    info!(gateway = %gateway, "Received webhook request");

    let signature = req
        .headers()
        .get(SIGNATURE_HEADER)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::unauthorized(format!("Missing {} header", SIGNATURE_HEADER)))?;
    verifier.verify(&body, signature)?;

    let payload: GatewayWebhookPayload = serde_json::from_slice(&body)?;
    let outcome = service.handle_webhook(gateway, &payload).await?;

    Ok(HttpResponse::Ok().json(outcome))
}

fn parse_gateway(segment: &str) -> Result<PaymentMethod> {
    let method = PaymentMethod::from_str(segment)?;
    if !method.is_gateway() {
        return Err(AppError::validation(format!(
            "'{}' is not a payment gateway",
            segment
        )));
    }
    Ok(method)
}
