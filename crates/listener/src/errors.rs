//! Failures surfaced by the HTTP layer and their status codes.
//!
//! | Failure | Status |
//! |---------|--------|
//! | Missing or wrong signature | `401 Unauthorized` |
//! | Body over the buffering limit | `413 Payload Too Large` |
//! | Retryable notification failure | `503 Service Unavailable` (+ `Retry-After` when known) |
//! | Permanent notification failure | `502 Bad Gateway` |
//!
//! Malformed JSON never reaches this type: axum's `Json` rejection answers
//! with `400` or `422` on its own.

use std::time::Duration;

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
};
use pipeline::{NotificationError, RetryPolicy};
use tracing::{error, warn};

use crate::signature::SignatureError;

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

#[derive(Debug, thiserror::Error)]
pub enum ListenerError {
    #[error(transparent)]
    Signature(#[from] SignatureError),

    #[error("Request body exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    #[error("Notification failed: {0}")]
    Notification(#[from] NotificationError),
}

impl IntoResponse for ListenerError {
    fn into_response(self) -> Response {
        let (status, retry_after) = match &self {
            Self::Signature(_) => (StatusCode::UNAUTHORIZED, None),
            Self::PayloadTooLarge { limit } => {
                warn!(limit, "Webhook payload too large");
                (StatusCode::PAYLOAD_TOO_LARGE, None)
            }
            Self::Notification(e) => match e.retry_policy() {
                RetryPolicy::Retryable { after } => {
                    warn!(error = %e, ?after, "Notification failed transiently");
                    (StatusCode::SERVICE_UNAVAILABLE, after)
                }
                RetryPolicy::NonRetryable => {
                    error!(error = %e, "Notification failed permanently");
                    (StatusCode::BAD_GATEWAY, None)
                }
            },
        };

        let body = serde_json::json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        });
        let mut response = (status, Json(body)).into_response();

        if let Some(after) = retry_after {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(retry_after_seconds(after)));
        }

        response
    }
}

/// Whole seconds, rounded up so a client never retries early.
fn retry_after_seconds(after: Duration) -> u64 {
    after.as_secs() + u64::from(after.subsec_nanos() > 0)
}
