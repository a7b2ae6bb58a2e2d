//! Identity webhook signatures.
//!
//! The identity provider signs each webhook delivery with HMAC-SHA256 over the raw request
//! body and sends the lowercase hex digest in a header.

use std::fmt;

use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;
use zeroize::Zeroize;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WebhookSecretError {
    #[error("webhook secret must not be empty")]
    Empty,

    #[error("webhook secret is not a valid HMAC key")]
    Invalid,
}

/// Shared secret used to verify identity webhook deliveries.
#[derive(Clone)]
pub struct WebhookSecret {
    mac: HmacSha256,
}

impl WebhookSecret {
    /// Build a secret from raw bytes, wiping the input afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`WebhookSecretError::Empty`] when `secret` is empty.
    pub fn new(secret: impl Into<Vec<u8>>) -> Result<Self, WebhookSecretError> {
        let mut secret = secret.into();

        if secret.is_empty() {
            return Err(WebhookSecretError::Empty);
        }

        let mac = HmacSha256::new_from_slice(&secret);

        secret.zeroize();

        mac.map(|mac| Self { mac })
            .map_err(|_invalid_length| WebhookSecretError::Invalid)
    }

    /// Hex HMAC-SHA256 of `body`.
    pub fn sign(&self, body: &[u8]) -> String {
        let mut mac = self.mac.clone();

        mac.update(body);

        hex::encode(mac.finalize().into_bytes())
    }

    /// Check `signature` (hex) against `body` in constant time.
    pub fn verify(&self, body: &[u8], signature: &str) -> bool {
        let Ok(signature) = hex::decode(signature.trim()) else {
            return false;
        };

        let mut mac = self.mac.clone();

        mac.update(body);

        mac.verify_slice(&signature).is_ok()
    }
}

impl fmt::Debug for WebhookSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("WebhookSecret(<redacted>)")
    }
}
