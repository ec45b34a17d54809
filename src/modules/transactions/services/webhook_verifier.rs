use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::warn;

use crate::core::{AppError, Result};

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the hex HMAC-SHA256 of the raw request body
pub const SIGNATURE_HEADER: &str = "X-Signature";

/// Verifies gateway webhook signatures against the shared secret
#[derive(Clone)]
pub struct WebhookVerifier {
    secret: String,
}

impl WebhookVerifier {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Check `signature` (hex) against the body. Comparison is constant-time.
    pub fn verify(&self, body: &[u8], signature: &str) -> Result<()> {
        let expected = hex::decode(signature.trim())
            .map_err(|_| AppError::unauthorized("Signature is not valid hex"))?;

        let mut mac = self.mac()?;
        mac.update(body);
        mac.verify_slice(&expected).map_err(|_| {
            warn!("Webhook signature mismatch");
            AppError::unauthorized("Invalid webhook signature")
        })
    }

    /// Hex signature for `body`
    pub fn sign(&self, body: &[u8]) -> Result<String> {
        let mut mac = self.mac()?;
        mac.update(body);
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    fn mac(&self) -> Result<HmacSha256> {
        HmacSha256::new_from_slice(self.secret.as_bytes())
            .map_err(|e| AppError::internal(format!("Invalid webhook key: {}", e)))
    }
}
