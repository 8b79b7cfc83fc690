use std::time::Duration;

use async_trait::async_trait;
use pipeline::{ChannelId, MessageSink, MessageSinkError, SendEmbedMessage, SendTextMessage};
use reqwest::{Response, StatusCode};
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::embed::{CreateMessage, MAX_EMBED_CHARS, MAX_FIELDS};

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;

/// Discord's `DiscordBot (<name or url>, <version>)` bot format.
pub(crate) const USER_AGENT: &str = concat!("DiscordBot (herald, ", env!("CARGO_PKG_VERSION"), ")");

/// Connection settings for [`DiscordClient`].
#[derive(Clone)]
pub struct DiscordClientConfig {
    /// REST API root including the version segment, without a trailing slash.
    pub api_base_url: String,
    pub bot_token: String,
    pub timeout: Duration,
}

impl DiscordClientConfig {
    pub const DEFAULT_API_BASE_URL: &'static str = "https://discord.com/api/v10";

    pub fn new(bot_token: impl Into<String>) -> Self {
        Self {
            api_base_url: Self::DEFAULT_API_BASE_URL.to_string(),
            bot_token: bot_token.into(),
            timeout: Duration::from_secs(10),
        }
    }
}

impl std::fmt::Debug for DiscordClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordClientConfig")
            .field("api_base_url", &self.api_base_url)
            .field("bot_token", &"<REDACTED>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// The HTTP client could not be constructed.
#[derive(Debug, thiserror::Error)]
#[error("Failed to build Discord HTTP client: {0}")]
pub struct ClientBuildError(#[from] reqwest::Error);

/// [`MessageSink`] that posts to Discord channels as a bot user.
#[derive(Clone)]
pub struct DiscordClient {
    http: reqwest::Client,
    base_url: String,
    authorization: String,
}

impl std::fmt::Debug for DiscordClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl DiscordClient {
    pub fn new(config: DiscordClientConfig) -> Result<Self, ClientBuildError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            authorization: format!("Bot {}", config.bot_token),
        })
    }

    async fn create_message(
        &self,
        channel_id: &ChannelId,
        body: &CreateMessage,
    ) -> Result<(), MessageSinkError> {
        let response = self
            .http
            .post(format!("{}/channels/{}/messages", self.base_url, channel_id))
            .header("Authorization", &self.authorization)
            .json(body)
            .send()
            .await
            .map_err(|e| MessageSinkError::Transport {
                message: e.to_string(),
            })?;

        check_status(response, channel_id).await
    }
}

/// Body Discord returns alongside a 429.
#[derive(Debug, Deserialize)]
struct RateLimitBody {
    retry_after: f64,
}

async fn check_status(response: Response, channel_id: &ChannelId) -> Result<(), MessageSinkError> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(MessageSinkError::Unauthorized),
        StatusCode::NOT_FOUND => Err(MessageSinkError::ChannelNotFound {
            channel_id: channel_id.to_string(),
        }),
        StatusCode::TOO_MANY_REQUESTS => {
            let retry_after = response
                .json::<RateLimitBody>()
                .await
                .ok()
                .and_then(|body| Duration::try_from_secs_f64(body.retry_after).ok());
            warn!(channel_id = %channel_id, ?retry_after, "Discord rate limit hit");
            Err(MessageSinkError::RateLimited { retry_after })
        }
        StatusCode::BAD_REQUEST => Err(MessageSinkError::InvalidPayload {
            message: response.text().await.unwrap_or_default(),
        }),
        _ => Err(MessageSinkError::Rejected {
            status: status.as_u16(),
            message: response.text().await.unwrap_or_default(),
        }),
    }
}

#[async_trait]
impl MessageSink for DiscordClient {
    #[instrument(skip_all, fields(channel_id = %request.channel_id))]
    async fn send_text_message(&self, request: SendTextMessage) -> Result<(), MessageSinkError> {
        self.create_message(&request.channel_id, &CreateMessage::text(&request.message))
            .await
    }

    #[instrument(skip_all, fields(channel_id = %request.channel_id, title = %request.message.title))]
    async fn send_embed_message(&self, request: SendEmbedMessage) -> Result<(), MessageSinkError> {
        let body = CreateMessage::embed(&request.message);
        let field_count = request.message.custom_fields.len();
        let sent = body.embeds.first().map_or(0, |embed| embed.fields.len());
        if sent < field_count {
            debug!(
                field_count,
                sent,
                max_fields = MAX_FIELDS,
                max_chars = MAX_EMBED_CHARS,
                "Embed exceeds Discord limits; trailing fields dropped"
            );
        }

        self.create_message(&request.channel_id, &body).await
    }
}
