//! Slack credentials and connection settings.
//!
//! Credentials come from the environment (a `.env` file is loaded by the
//! binary before this runs). All three are required; the process refuses to
//! start without them.

use secrecy::{ExposeSecret, SecretString};
use tracing::warn;

use crate::error::{SlackError, SlackResult};

/// Default Slack Web API base URL.
pub const DEFAULT_API_BASE_URL: &str = "https://slack.com/api";

/// Configuration for the Slack connection.
#[derive(Clone)]
pub struct SlackConfig {
    /// Bot OAuth token (xoxb-...).
    bot_token: SecretString,
    /// App-level token for Socket Mode (xapp-...).
    app_token: SecretString,
    /// Signing secret of the Slack app.
    signing_secret: SecretString,
    /// Web API base URL.
    api_base_url: String,
}

impl std::fmt::Debug for SlackConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlackConfig")
            .field("bot_token", &"[REDACTED]")
            .field("app_token", &"[REDACTED]")
            .field("signing_secret", &"[REDACTED]")
            .field("api_base_url", &self.api_base_url)
            .finish()
    }
}

impl SlackConfig {
    /// Create a new configuration with required tokens.
    pub fn new(
        bot_token: impl Into<String>,
        app_token: impl Into<String>,
        signing_secret: impl Into<String>,
    ) -> Self {
        Self {
            bot_token: SecretString::new(bot_token.into().into()),
            app_token: SecretString::new(app_token.into().into()),
            signing_secret: SecretString::new(signing_secret.into().into()),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
        }
    }

    /// Point the Web API client somewhere other than slack.com.
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Load configuration from environment variables.
    ///
    /// Required variables:
    /// - `SLACK_BOT_TOKEN`
    /// - `SLACK_APP_TOKEN`
    /// - `SLACK_SIGNING_SECRET`
    ///
    /// Optional:
    /// - `SLACK_API_BASE_URL`
    pub fn from_env() -> SlackResult<Self> {
        let bot_token = std::env::var("SLACK_BOT_TOKEN")
            .map_err(|_| SlackError::Config("SLACK_BOT_TOKEN not set".to_string()))?;

        let app_token = std::env::var("SLACK_APP_TOKEN")
            .map_err(|_| SlackError::Config("SLACK_APP_TOKEN not set".to_string()))?;

        let signing_secret = std::env::var("SLACK_SIGNING_SECRET")
            .map_err(|_| SlackError::Config("SLACK_SIGNING_SECRET not set".to_string()))?;

        if !bot_token.starts_with("xoxb-") {
            warn!("Bot token doesn't start with 'xoxb-', this may be incorrect");
        }
        if !app_token.starts_with("xapp-") {
            warn!("App token doesn't start with 'xapp-', this may be incorrect");
        }

        let mut config = Self::new(bot_token, app_token, signing_secret);
        if let Ok(url) = std::env::var("SLACK_API_BASE_URL") {
            config = config.with_api_base_url(url);
        }

        Ok(config)
    }

    /// Get the bot token.
    pub fn bot_token(&self) -> &str {
        self.bot_token.expose_secret()
    }

    /// Get the app token for Socket Mode.
    pub fn app_token(&self) -> &str {
        self.app_token.expose_secret()
    }

    /// Get the Web API base URL.
    pub fn api_base_url(&self) -> &str {
        &self.api_base_url
    }

    /// Validate the configuration.
    pub fn validate(&self) -> SlackResult<()> {
        if self.bot_token.expose_secret().is_empty() {
            return Err(SlackError::Config("Bot token is empty".to_string()));
        }
        if self.app_token.expose_secret().is_empty() {
            return Err(SlackError::Config("App token is empty".to_string()));
        }
        if self.signing_secret.expose_secret().is_empty() {
            return Err(SlackError::Config("Signing secret is empty".to_string()));
        }

        if !self.bot_token.expose_secret().starts_with("xoxb-") {
            return Err(SlackError::Config(
                "Bot token must start with 'xoxb-'".to_string(),
            ));
        }
        if !self.app_token.expose_secret().starts_with("xapp-") {
            return Err(SlackError::Config(
                "App token must start with 'xapp-'".to_string(),
            ));
        }

        Ok(())
    }
}
