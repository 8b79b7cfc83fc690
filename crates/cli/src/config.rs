//! Process configuration.
//!
//! Sources, later ones winning:
//!
//! 1. `herald.toml` in the working directory (optional)
//! 2. the file named by `--config` / `HERALD_CONFIG_FILE` (required when given)
//! 3. environment variables `HERALD__<SECTION>__<KEY>`, e.g. `HERALD__DISCORD__BOT_TOKEN`

use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::time::Duration;

use discord::DiscordClientConfig;
use github::GithubClientConfig;
use listener::WebhookSecret;
use pipeline::{ChannelId, RepositoryName, StaticNotificationConfig};
use serde::Deserialize;

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

pub const DEFAULT_CONFIG_FILE: &str = "herald";
pub const ENV_PREFIX: &str = "HERALD";
pub const ENV_SEPARATOR: &str = "__";

const REDACTED: &str = "<REDACTED>";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration value for '{key}': {message}")]
    Invalid { key: &'static str, message: String },
}

fn invalid(key: &'static str, message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        key,
        message: message.into(),
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    pub github: GithubConfig,
    pub discord: DiscordConfig,
    #[serde(default)]
    pub webhook: WebhookConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// IP address to bind.
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

#[derive(Clone, Deserialize)]
pub struct GithubConfig {
    /// Repository whose pull request commits are read, as `owner/repo`.
    pub repository: String,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_github_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

#[derive(Clone, Deserialize)]
pub struct DiscordConfig {
    pub bot_token: String,
    pub issues_channel_id: String,
    pub pull_requests_channel_id: String,
    #[serde(default = "default_discord_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

#[derive(Clone, Default, Deserialize)]
pub struct WebhookConfig {
    /// Shared secret for `X-Hub-Signature-256`. Signatures are not checked
    /// when unset.
    #[serde(default)]
    pub secret: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is not set.
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub otlp_endpoint: Option<String>,
    pub service_name: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            otlp_endpoint: None,
            service_name: "herald".to_string(),
        }
    }
}

fn default_github_api_base_url() -> String {
    GithubClientConfig::DEFAULT_API_BASE_URL.to_string()
}

fn default_discord_api_base_url() -> String {
    DiscordClientConfig::DEFAULT_API_BASE_URL.to_string()
}

fn default_timeout_seconds() -> u64 {
    10
}

impl AppConfig {
    /// Loads from the default file, `explicit_file` and the process environment.
    pub fn load(explicit_file: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_from(
            explicit_file,
            config::Environment::with_prefix(ENV_PREFIX).separator(ENV_SEPARATOR),
        )
    }

    pub fn load_from(
        explicit_file: Option<&Path>,
        environment: config::Environment,
    ) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder()
            .add_source(config::File::with_name(DEFAULT_CONFIG_FILE).required(false));

        if let Some(path) = explicit_file {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        Self::from_builder(builder.add_source(environment))
    }

    fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, ConfigError> {
        let config: AppConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.socket_addr()?;
        self.github.repository_name()?;
        self.discord.issues_channel_id()?;
        self.discord.pull_requests_channel_id()?;

        if self.discord.bot_token.trim().is_empty() {
            return Err(invalid("discord.bot_token", "must not be empty"));
        }
        if matches!(&self.github.token, Some(token) if token.trim().is_empty()) {
            return Err(invalid("github.token", "must not be empty when set"));
        }
        if matches!(&self.webhook.secret, Some(secret) if secret.is_empty()) {
            return Err(invalid("webhook.secret", "must not be empty when set"));
        }
        if matches!(&self.telemetry.otlp_endpoint, Some(endpoint) if endpoint.trim().is_empty()) {
            return Err(invalid("telemetry.otlp_endpoint", "must not be empty when set"));
        }
        Ok(())
    }

    pub fn notification_config(&self) -> Result<StaticNotificationConfig, ConfigError> {
        Ok(StaticNotificationConfig::new(
            self.discord.issues_channel_id()?,
            self.discord.pull_requests_channel_id()?,
            self.github.repository_name()?,
        ))
    }

    pub fn webhook_secret(&self) -> Option<WebhookSecret> {
        self.webhook.secret.clone().map(WebhookSecret::new)
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|_| invalid("server.host", format!("'{}' is not an IP address", self.host)))?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

impl GithubConfig {
    pub fn repository_name(&self) -> Result<RepositoryName, ConfigError> {
        RepositoryName::new(&self.repository).ok_or_else(|| {
            invalid(
                "github.repository",
                format!("'{}' is not in owner/repo form", self.repository),
            )
        })
    }

    pub fn client_config(&self) -> GithubClientConfig {
        GithubClientConfig {
            api_base_url: self.api_base_url.clone(),
            token: self.token.clone(),
            timeout: Duration::from_secs(self.timeout_seconds),
        }
    }
}

impl DiscordConfig {
    pub fn issues_channel_id(&self) -> Result<ChannelId, ConfigError> {
        snowflake("discord.issues_channel_id", &self.issues_channel_id)
    }

    pub fn pull_requests_channel_id(&self) -> Result<ChannelId, ConfigError> {
        snowflake(
            "discord.pull_requests_channel_id",
            &self.pull_requests_channel_id,
        )
    }

    pub fn client_config(&self) -> DiscordClientConfig {
        DiscordClientConfig {
            api_base_url: self.api_base_url.clone(),
            bot_token: self.bot_token.clone(),
            timeout: Duration::from_secs(self.timeout_seconds),
        }
    }
}

/// Discord ids are decimal snowflakes.
fn snowflake(key: &'static str, value: &str) -> Result<ChannelId, ConfigError> {
    let value = value.trim();
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid(key, format!("'{value}' is not a Discord channel id")));
    }
    ChannelId::new(value).ok_or_else(|| invalid(key, "must not be empty"))
}

// Secrets never reach logs through Debug.

impl std::fmt::Debug for GithubConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GithubConfig")
            .field("repository", &self.repository)
            .field("token", &self.token.as_ref().map(|_| REDACTED))
            .field("api_base_url", &self.api_base_url)
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

impl std::fmt::Debug for DiscordConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordConfig")
            .field("bot_token", &REDACTED)
            .field("issues_channel_id", &self.issues_channel_id)
            .field("pull_requests_channel_id", &self.pull_requests_channel_id)
            .field("api_base_url", &self.api_base_url)
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

impl std::fmt::Debug for WebhookConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookConfig")
            .field("secret", &self.secret.as_ref().map(|_| REDACTED))
            .finish()
    }
}
