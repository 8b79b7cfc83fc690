//! Builds the object graph from validated configuration.

use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use commands::{EventController, IssueCreatedHandler, PullRequestCreatedHandler};
use discord::DiscordClient;
use github::GithubClient;
use listener::AppState;
use pipeline::{MessageSink, NotificationConfig, SourceRepository};
use tracing::info;

use crate::config::AppConfig;

#[cfg(test)]
#[path = "app_tests.rs"]
mod tests;

pub fn build_router(config: &AppConfig) -> anyhow::Result<Router> {
    let notification: Arc<dyn NotificationConfig> = Arc::new(config.notification_config()?);

    let sink: Arc<dyn MessageSink> = Arc::new(
        DiscordClient::new(config.discord.client_config()).context("Discord client")?,
    );
    let source: Arc<dyn SourceRepository> = Arc::new(
        GithubClient::new(config.github.client_config()).context("GitHub client")?,
    );

    let controller = EventController::new(
        Arc::new(IssueCreatedHandler::new(sink.clone(), notification.clone())),
        Arc::new(PullRequestCreatedHandler::new(sink, source, notification.clone())),
    );

    let secret = config.webhook_secret();
    info!(
        repository = %notification.repository_name(),
        issues_channel_id = %notification.issues_channel_id(),
        pull_requests_channel_id = %notification.pull_requests_channel_id(),
        signature_required = secret.is_some(),
        "Notification pipeline ready"
    );

    Ok(listener::create_router(AppState::new(controller, secret)))
}
