//! Webhook event ingestion: action filtering and payload projection.

use std::sync::Arc;

use pipeline::{
    Actor, IssueEventBody, IssueSubject, NotificationError, PullRequestEventBody,
    PullRequestSubject,
};
use tracing::{debug, instrument};

use crate::{CommandHandler, IssueCreatedPayload, PullRequestCreatedPayload};

#[cfg(test)]
#[path = "controller_tests.rs"]
mod tests;

/// What the controller did with one webhook body.
///
/// Both outcomes are a success as far as the webhook sender is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    /// The action was `opened` and the handler completed.
    Notified,
    /// The action was anything else; nothing was sent.
    Ignored,
}

/// Entry point for the two tracked webhook topics.
///
/// Bodies are assumed to be schema-valid already. Handler failures are
/// returned to the caller untouched.
#[derive(Clone)]
pub struct EventController {
    issue_created: Arc<dyn CommandHandler<Payload = IssueCreatedPayload>>,
    pull_request_created: Arc<dyn CommandHandler<Payload = PullRequestCreatedPayload>>,
}

impl EventController {
    pub fn new(
        issue_created: Arc<dyn CommandHandler<Payload = IssueCreatedPayload>>,
        pull_request_created: Arc<dyn CommandHandler<Payload = PullRequestCreatedPayload>>,
    ) -> Self {
        Self {
            issue_created,
            pull_request_created,
        }
    }

    /// Handles an `issues` webhook body.
    #[instrument(skip_all, fields(action = %body.action, issue_number = %body.issue.number))]
    pub async fn process_issue_event(
        &self,
        body: IssueEventBody,
    ) -> Result<EventOutcome, NotificationError> {
        if !body.action.is_opened() {
            debug!("Ignoring issue event");
            return Ok(EventOutcome::Ignored);
        }

        self.issue_created
            .execute(issue_created_payload(body))
            .await?;

        Ok(EventOutcome::Notified)
    }

    /// Handles a `pull_request` webhook body.
    #[instrument(
        skip_all,
        fields(action = %body.action, pull_request_number = %body.pull_request.number)
    )]
    pub async fn process_pull_request_event(
        &self,
        body: PullRequestEventBody,
    ) -> Result<EventOutcome, NotificationError> {
        if !body.action.is_opened() {
            debug!("Ignoring pull request event");
            return Ok(EventOutcome::Ignored);
        }

        self.pull_request_created
            .execute(pull_request_created_payload(body))
            .await?;

        Ok(EventOutcome::Notified)
    }
}

/// Flattens an issue webhook body into the issue handler's payload.
pub fn issue_created_payload(body: IssueEventBody) -> IssueCreatedPayload {
    let issue = IssueSubject::from(body.issue);
    let creator = Actor::from(body.sender);

    IssueCreatedPayload {
        issue_title: issue.title,
        issue_url: issue.url,
        issue_number: issue.number,
        issue_labels: issue.labels,
        creator_name: creator.name,
        creator_avatar_url: creator.avatar_url,
        creator_html_url: creator.profile_url,
    }
}

/// Projects a pull-request webhook body into the pull-request handler's payload.
pub fn pull_request_created_payload(body: PullRequestEventBody) -> PullRequestCreatedPayload {
    PullRequestCreatedPayload {
        pull_request: PullRequestSubject::from(body.pull_request),
        creator: Actor::from(body.sender),
    }
}
