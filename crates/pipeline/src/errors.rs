//! Error and retry-policy types for the Herald notification pipeline.
//!
//! Each port has its own error type ([`MessageSinkError`],
//! [`SourceRepositoryError`]); adapters translate their transport failures into
//! these. Command handlers wrap them in [`NotificationError`] and never recover
//! locally: every failure travels to the HTTP boundary, which decides the
//! response status.
//!
//! [`RetryPolicy`] is a cross-cutting concern: every error can say whether the
//! webhook sender should redeliver and, if known, how long it should wait.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

// ---------------------------------------------------------------------------
// Retry semantics
// ---------------------------------------------------------------------------

/// Whether an error condition is worth redelivering and, if so, after what delay.
///
/// Herald never retries on its own. The policy is surfaced to the webhook
/// sender through the HTTP response (`503` + `Retry-After` versus `502`).
///
/// - `Retryable` errors: network failures, rate limits, upstream 5xx.
/// - `NonRetryable` errors: bad credentials, unknown channel or repository,
///   a payload the upstream rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RetryPolicy {
    /// The operation may be retried.
    Retryable {
        /// Minimum back-off before the next attempt. `None` means the caller
        /// applies its own schedule.
        after: Option<Duration>,
    },
    /// Redelivering the same event will fail the same way.
    NonRetryable,
}

impl RetryPolicy {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Retryable { .. })
    }
}

fn status_policy(status: u16) -> RetryPolicy {
    if status >= 500 {
        RetryPolicy::Retryable { after: None }
    } else {
        RetryPolicy::NonRetryable
    }
}

// ---------------------------------------------------------------------------
// Message sink
// ---------------------------------------------------------------------------

/// Failures reported by a [`crate::MessageSink`].
#[derive(Debug, Error)]
pub enum MessageSinkError {
    /// The sink rejected the configured credentials.
    #[error("Chat platform rejected the credentials")]
    Unauthorized,

    /// The destination channel does not exist or is not visible to the bot.
    #[error("Chat channel '{channel_id}' not found")]
    ChannelNotFound {
        /// The channel the message was addressed to.
        channel_id: String,
    },

    /// The sink is throttling requests.
    #[error("Chat platform rate limit hit")]
    RateLimited {
        /// Delay requested by the platform, when it sent one.
        retry_after: Option<Duration>,
    },

    /// The sink considered the message itself malformed.
    #[error("Chat platform rejected the message: {message}")]
    InvalidPayload { message: String },

    /// Any other non-success response.
    #[error("Chat platform returned {status}: {message}")]
    Rejected { status: u16, message: String },

    /// The request never produced a response (DNS, TLS, connection reset, timeout).
    #[error("Chat platform unreachable: {message}")]
    Transport { message: String },
}

impl MessageSinkError {
    pub fn retry_policy(&self) -> RetryPolicy {
        match self {
            Self::RateLimited { retry_after } => RetryPolicy::Retryable {
                after: *retry_after,
            },
            Self::Transport { .. } => RetryPolicy::Retryable { after: None },
            Self::Rejected { status, .. } => status_policy(*status),
            Self::Unauthorized | Self::ChannelNotFound { .. } | Self::InvalidPayload { .. } => {
                RetryPolicy::NonRetryable
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Source repository
// ---------------------------------------------------------------------------

/// Failures reported by a [`crate::SourceRepository`].
#[derive(Debug, Error)]
pub enum SourceRepositoryError {
    /// The repository, pull request, or issue does not exist (or is private).
    #[error("Resource not found: {resource}")]
    NotFound { resource: String },

    /// The hosting platform's rate limit is exhausted until `reset_at`.
    #[error("Source repository rate limit exceeded. Reset at: {reset_at:?}")]
    RateLimited { reset_at: Option<DateTime<Utc>> },

    /// The configured token was rejected.
    #[error("Source repository rejected the credentials")]
    Unauthorized,

    /// Any other non-success response.
    #[error("Source repository returned {status}: {message}")]
    Http { status: u16, message: String },

    /// The request never produced a response.
    #[error("Source repository unreachable: {message}")]
    Transport { message: String },

    /// The response body did not have the expected shape.
    #[error("Could not decode source repository response: {message}")]
    Decode { message: String },
}

impl SourceRepositoryError {
    pub fn retry_policy(&self) -> RetryPolicy {
        match self {
            Self::RateLimited { reset_at } => RetryPolicy::Retryable {
                after: reset_at.and_then(|reset| (reset - Utc::now()).to_std().ok()),
            },
            Self::Transport { .. } => RetryPolicy::Retryable { after: None },
            Self::Http { status, .. } => status_policy(*status),
            Self::NotFound { .. } | Self::Unauthorized | Self::Decode { .. } => {
                RetryPolicy::NonRetryable
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Notification errors
// ---------------------------------------------------------------------------

/// Errors returned by a command handler or the ingestion controller.
///
/// Filtering out a non-`opened` action is not an error and never produces one
/// of these.
#[derive(Debug, Error)]
pub enum NotificationError {
    /// Fetching auxiliary data for the message failed; nothing was sent.
    #[error("Enrichment failed: {0}")]
    Enrichment(#[from] SourceRepositoryError),

    /// The message could not be delivered.
    #[error("Delivery failed: {0}")]
    Delivery(#[from] MessageSinkError),
}

impl NotificationError {
    pub fn retry_policy(&self) -> RetryPolicy {
        match self {
            Self::Enrichment(e) => e.retry_policy(),
            Self::Delivery(e) => e.retry_policy(),
        }
    }
}
