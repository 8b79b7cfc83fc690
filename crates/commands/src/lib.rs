//! Herald notification command handlers and event ingestion.
//!
//! A webhook body enters through the [`EventController`], which drops every
//! action other than `opened`, projects the body into a flat command payload,
//! and awaits the matching [`CommandHandler`]. Each handler resolves its
//! destination from [`pipeline::NotificationConfig`], optionally enriches the
//! payload through [`pipeline::SourceRepository`], builds a
//! [`pipeline::RichMessage`], and hands it to [`pipeline::MessageSink`].
//!
//! ## Architectural Layer
//!
//! **Orchestration layer.** Handlers sequence calls between the domain types in
//! [`pipeline`] and the port traits. They hold no state between invocations.

pub mod controller;
pub mod handler;
pub mod issue_created;
pub mod pull_request_created;

#[cfg(test)]
mod testing;

pub use controller::{EventController, EventOutcome};
pub use handler::CommandHandler;
pub use issue_created::{IssueCreatedHandler, IssueCreatedPayload, ISSUE_COLOR};
pub use pull_request_created::{
    PullRequestCreatedHandler, PullRequestCreatedPayload, PULL_REQUEST_COLOR,
};
