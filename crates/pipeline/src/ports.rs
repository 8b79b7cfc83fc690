//! Port traits: the capabilities the notification pipeline calls out to.
//!
//! The orchestration layer depends only on these traits. Each has one
//! production adapter (`discord::DiscordClient`, `github::GithubClient`,
//! [`StaticNotificationConfig`]) and is replaced by test doubles in unit tests.

use async_trait::async_trait;

use crate::{
    ChannelId, CommitSummary, IssueSummary, MessageSinkError, PullRequestNumber, RepositoryName,
    SendEmbedMessage, SendTextMessage, SourceRepositoryError,
};

/// Delivers chat messages to a named channel.
///
/// Both operations resolve once the platform has accepted the message.
/// Implementations do not retry beyond what their HTTP client does.
#[async_trait]
pub trait MessageSink: Send + Sync {
    async fn send_text_message(&self, payload: SendTextMessage) -> Result<(), MessageSinkError>;

    async fn send_embed_message(&self, payload: SendEmbedMessage)
        -> Result<(), MessageSinkError>;
}

/// Read access to the source-hosting platform.
#[async_trait]
pub trait SourceRepository: Send + Sync {
    /// Lists the commits of a pull request in the order the platform returns
    /// them (oldest first on GitHub).
    async fn get_pull_request_commits(
        &self,
        repository: &RepositoryName,
        pull_request: PullRequestNumber,
    ) -> Result<Vec<CommitSummary>, SourceRepositoryError>;

    /// Lists the open issues that carry `label`, pull requests excluded.
    ///
    /// Implementations page through the listing and may stop at a fixed page
    /// limit, so very large backlogs can come back truncated.
    async fn get_issues_by_label(
        &self,
        repository: &RepositoryName,
        label: &str,
    ) -> Result<Vec<IssueSummary>, SourceRepositoryError>;
}

/// Destination channels and the tracked repository.
///
/// Accessors are synchronous and infallible: configuration is validated once
/// at startup, so by the time a handler asks, the values exist.
pub trait NotificationConfig: Send + Sync {
    fn issues_channel_id(&self) -> &ChannelId;

    fn pull_requests_channel_id(&self) -> &ChannelId;

    fn repository_name(&self) -> &RepositoryName;
}

/// A [`NotificationConfig`] holding fixed values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticNotificationConfig {
    issues_channel_id: ChannelId,
    pull_requests_channel_id: ChannelId,
    repository_name: RepositoryName,
}

impl StaticNotificationConfig {
    pub fn new(
        issues_channel_id: ChannelId,
        pull_requests_channel_id: ChannelId,
        repository_name: RepositoryName,
    ) -> Self {
        Self {
            issues_channel_id,
            pull_requests_channel_id,
            repository_name,
        }
    }
}

impl NotificationConfig for StaticNotificationConfig {
    fn issues_channel_id(&self) -> &ChannelId {
        &self.issues_channel_id
    }

    fn pull_requests_channel_id(&self) -> &ChannelId {
        &self.pull_requests_channel_id
    }

    fn repository_name(&self) -> &RepositoryName {
        &self.repository_name
    }
}
