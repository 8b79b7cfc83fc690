//! GitHub webhook signature verification (`X-Hub-Signature-256`).

use axum::{
    body::Body,
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::warn;

use crate::{AppState, ListenerError};

#[cfg(test)]
#[path = "signature_tests.rs"]
mod tests;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "x-hub-signature-256";

const SIGNATURE_PREFIX: &str = "sha256=";

/// Largest body buffered for verification. Matches axum's default `Json` limit.
pub const MAX_PAYLOAD_BYTES: usize = 2 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum SignatureError {
    #[error("Missing X-Hub-Signature-256 header")]
    Missing,

    #[error("Malformed signature: {message}")]
    Malformed { message: String },

    #[error("Signature does not match payload")]
    Mismatch,
}

/// Shared secret configured on the GitHub webhook.
#[derive(Clone)]
pub struct WebhookSecret(String);

impl WebhookSecret {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Checks a `sha256=<hex>` header value against `payload` in constant time.
    pub fn verify(&self, payload: &[u8], signature: &str) -> Result<(), SignatureError> {
        let hex_signature =
            signature
                .strip_prefix(SIGNATURE_PREFIX)
                .ok_or_else(|| SignatureError::Malformed {
                    message: format!("expected '{SIGNATURE_PREFIX}' prefix"),
                })?;
        let expected = hex::decode(hex_signature).map_err(|e| SignatureError::Malformed {
            message: e.to_string(),
        })?;

        let mut mac = HmacSha256::new_from_slice(self.0.as_bytes()).map_err(|e| {
            SignatureError::Malformed {
                message: e.to_string(),
            }
        })?;
        mac.update(payload);
        mac.verify_slice(&expected)
            .map_err(|_| SignatureError::Mismatch)
    }
}

impl std::fmt::Debug for WebhookSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("WebhookSecret(<REDACTED>)")
    }
}

/// Rejects requests whose body is not signed with the configured secret.
/// A no-op when no secret is configured.
pub async fn require_signature(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ListenerError> {
    let Some(secret) = state.webhook_secret() else {
        return Ok(next.run(request).await);
    };

    let (parts, body) = request.into_parts();
    let payload = axum::body::to_bytes(body, MAX_PAYLOAD_BYTES)
        .await
        .map_err(|_| ListenerError::PayloadTooLarge {
            limit: MAX_PAYLOAD_BYTES,
        })?;

    let signature = parts
        .headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or(SignatureError::Missing)?;

    if let Err(e) = secret.verify(&payload, signature) {
        warn!(error = %e, path = %parts.uri.path(), "Rejected webhook with bad signature");
        return Err(e.into());
    }

    Ok(next.run(Request::from_parts(parts, Body::from(payload))).await)
}
