//! The capability shared by every notification use case.

use async_trait::async_trait;
use pipeline::NotificationError;

/// One notification use case, invoked with its own normalised payload.
///
/// Implementations are independent types; each owns its payload shape and
/// message template.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    type Payload: Send + 'static;

    /// Runs the use case to completion. Any port failure is returned
    /// unchanged, wrapped in [`NotificationError`].
    async fn execute(&self, payload: Self::Payload) -> Result<(), NotificationError>;
}
