//! Posts a rich message, with the commit list, when a pull request is opened.

use std::sync::Arc;

use async_trait::async_trait;
use pipeline::{
    AccentColor, Actor, CommitSummary, CustomField, MessageAuthor, MessageSink,
    NotificationConfig, NotificationError, PullRequestSubject, RichMessage, SendEmbedMessage,
    SourceRepository,
};
use tracing::{debug, info, instrument};

use crate::CommandHandler;

#[cfg(test)]
#[path = "pull_request_created_tests.rs"]
mod tests;

/// Accent colour of pull-request messages.
pub const PULL_REQUEST_COLOR: AccentColor = AccentColor::from_rgb(0x00_CD_2D);

/// Input of [`PullRequestCreatedHandler`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestCreatedPayload {
    pub pull_request: PullRequestSubject,
    pub creator: Actor,
}

/// Fetches the commits of an opened pull request and sends one embed listing
/// them to the pull-requests channel.
pub struct PullRequestCreatedHandler {
    message_sink: Arc<dyn MessageSink>,
    source_repository: Arc<dyn SourceRepository>,
    config: Arc<dyn NotificationConfig>,
}

impl PullRequestCreatedHandler {
    pub fn new(
        message_sink: Arc<dyn MessageSink>,
        source_repository: Arc<dyn SourceRepository>,
        config: Arc<dyn NotificationConfig>,
    ) -> Self {
        Self {
            message_sink,
            source_repository,
            config,
        }
    }
}

/// Builds the message for an opened pull request.
///
/// Each commit becomes one custom field named by its short SHA, in the order
/// given.
pub fn build_pull_request_message(
    payload: &PullRequestCreatedPayload,
    commits: &[CommitSummary],
) -> RichMessage {
    let pull_request = &payload.pull_request;

    RichMessage {
        color: PULL_REQUEST_COLOR,
        title: format!("#{}: {}", pull_request.number, pull_request.title),
        url: pull_request.url.clone(),
        author: MessageAuthor {
            name: payload.creator.name.clone(),
            url: payload.creator.profile_url.clone(),
        },
        thumbnail: payload.creator.avatar_url.clone(),
        description: Some(format!(
            "Merge {} commits from `{}` into `{}`",
            pull_request.number_of_commits, pull_request.source_branch, pull_request.target_branch
        )),
        custom_fields: commits
            .iter()
            .map(|commit| CustomField {
                name: commit.sha.short().to_string(),
                value: commit.message.clone(),
            })
            .collect(),
    }
}

#[async_trait]
impl CommandHandler for PullRequestCreatedHandler {
    type Payload = PullRequestCreatedPayload;

    #[instrument(skip_all, fields(pull_request_number = %payload.pull_request.number))]
    async fn execute(&self, payload: PullRequestCreatedPayload) -> Result<(), NotificationError> {
        let pull_requests_channel_id = self.config.pull_requests_channel_id();
        let repository = self.config.repository_name();

        debug!(
            title = %payload.pull_request.title,
            url = %payload.pull_request.url,
            creator = %payload.creator.name,
            channel_id = %pull_requests_channel_id,
            "Sending message about created pull request..."
        );

        let commits = self
            .source_repository
            .get_pull_request_commits(repository, payload.pull_request.number)
            .await?;

        debug!(
            repository = %repository,
            commit_count = commits.len(),
            "Fetched pull request commits"
        );

        let message = build_pull_request_message(&payload, &commits);

        self.message_sink
            .send_embed_message(SendEmbedMessage {
                message,
                channel_id: pull_requests_channel_id.clone(),
            })
            .await?;

        info!(
            title = %payload.pull_request.title,
            url = %payload.pull_request.url,
            creator = %payload.creator.name,
            channel_id = %pull_requests_channel_id,
            "Message about created pull request sent."
        );

        Ok(())
    }
}
