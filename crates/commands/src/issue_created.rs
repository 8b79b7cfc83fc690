//! Posts a rich message when an issue is opened.

use std::sync::Arc;

use async_trait::async_trait;
use pipeline::{
    AccentColor, CustomField, IssueNumber, MessageAuthor, MessageSink, NotificationConfig,
    NotificationError, RichMessage, SendEmbedMessage,
};
use tracing::{debug, info, instrument};

use crate::CommandHandler;

#[cfg(test)]
#[path = "issue_created_tests.rs"]
mod tests;

/// Accent colour of issue messages.
pub const ISSUE_COLOR: AccentColor = AccentColor::from_rgb(0xE5_A5_0A);

/// Field name used for every label entry.
const LABEL_FIELD_NAME: &str = "Label";

/// Input of [`IssueCreatedHandler`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueCreatedPayload {
    pub issue_title: String,
    pub issue_url: String,
    pub issue_number: IssueNumber,
    pub issue_labels: Vec<String>,
    pub creator_name: String,
    pub creator_avatar_url: String,
    pub creator_html_url: String,
}

/// Sends one embed per opened issue to the issues channel.
pub struct IssueCreatedHandler {
    message_sink: Arc<dyn MessageSink>,
    config: Arc<dyn NotificationConfig>,
}

impl IssueCreatedHandler {
    pub fn new(message_sink: Arc<dyn MessageSink>, config: Arc<dyn NotificationConfig>) -> Self {
        Self {
            message_sink,
            config,
        }
    }
}

/// Builds the message for an opened issue: one custom field per label, in
/// label order.
pub fn build_issue_message(payload: &IssueCreatedPayload) -> RichMessage {
    RichMessage {
        color: ISSUE_COLOR,
        title: format!("#{}: {}", payload.issue_number, payload.issue_title),
        url: payload.issue_url.clone(),
        author: MessageAuthor {
            name: payload.creator_name.clone(),
            url: payload.creator_html_url.clone(),
        },
        thumbnail: payload.creator_avatar_url.clone(),
        description: None,
        custom_fields: payload
            .issue_labels
            .iter()
            .map(|label| CustomField {
                name: LABEL_FIELD_NAME.to_string(),
                value: label.clone(),
            })
            .collect(),
    }
}

#[async_trait]
impl CommandHandler for IssueCreatedHandler {
    type Payload = IssueCreatedPayload;

    #[instrument(skip_all, fields(issue_number = %payload.issue_number))]
    async fn execute(&self, payload: IssueCreatedPayload) -> Result<(), NotificationError> {
        let issues_channel_id = self.config.issues_channel_id();
        let repository = self.config.repository_name();

        debug!(
            title = %payload.issue_title,
            url = %payload.issue_url,
            creator = %payload.creator_name,
            channel_id = %issues_channel_id,
            repository = %repository,
            "Sending message about created issue..."
        );

        let message = build_issue_message(&payload);

        self.message_sink
            .send_embed_message(SendEmbedMessage {
                message,
                channel_id: issues_channel_id.clone(),
            })
            .await?;

        info!(
            title = %payload.issue_title,
            url = %payload.issue_url,
            creator = %payload.creator_name,
            channel_id = %issues_channel_id,
            "Message about created issue sent."
        );

        Ok(())
    }
}
