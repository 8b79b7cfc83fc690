//! Core notification domain for Herald.
//!
//! Herald turns repository webhook events (issues and pull requests being
//! opened) into rich chat messages. This crate holds every value type that
//! flows through that pipeline, the shapes of the inbound webhook bodies, the
//! port traits the orchestration layer calls, and the error taxonomy shared by
//! all adapters.
//!
//! ## Architectural Layer
//!
//! **Domain + port definitions.** This crate has no I/O dependencies.
//! It defines *what* is needed; infrastructure crates define *how* to supply it.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`ChannelId`, `RepositoryName`, etc.) |
//! | [`types`] | Value types (`Actor`, `RichMessage`, `CommitSummary`, etc.) |
//! | [`events`] | Inbound webhook body shapes and their projections |
//! | [`ports`] | `MessageSink`, `SourceRepository`, `NotificationConfig` traits |
//! | [`errors`] | Port errors, `NotificationError`, and `RetryPolicy` |

pub mod errors;
pub mod events;
pub mod identifiers;
pub mod ports;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use errors::{MessageSinkError, NotificationError, RetryPolicy, SourceRepositoryError};
pub use events::{
    EventAction, IssueEventBody, IssueObject, LabelObject, PullRequestEventBody,
    PullRequestObject, RefObject, SenderObject,
};
pub use identifiers::{
    BranchName, ChannelId, CommitSha, DeliveryId, IssueNumber, PullRequestNumber, RepositoryName,
};
pub use ports::{MessageSink, NotificationConfig, SourceRepository, StaticNotificationConfig};
pub use types::{
    AccentColor, Actor, Assignee, CommitSummary, CustomField, IssueSubject, IssueSummary,
    MessageAuthor, PullRequestSubject, RichMessage, SendEmbedMessage, SendTextMessage,
};
