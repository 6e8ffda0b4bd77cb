//! Error types for the Slack side of the triage bot.
//!
//! Web API failures arrive in two shapes: HTTP-level problems (status codes,
//! timeouts, rate limits) and `{"ok": false, "error": "<code>"}` bodies. Both
//! end up as [`SlackError`]; codes are classified through [`SlackApiError`].

use thiserror::Error;
use triage_core::TriageError;

/// Errors that can occur during Slack operations.
#[derive(Error, Debug)]
pub enum SlackError {
    /// Configuration error (missing or invalid config).
    #[error("Configuration error: {0}")]
    Config(String),

    /// Authentication error (invalid token, revoked, etc.).
    #[error("Authentication error: {0}")]
    Auth(String),

    /// API request failed.
    #[error("Slack API error: {0}")]
    Api(String),

    /// API rate limited.
    #[error("Rate limited: retry after {retry_after_secs} seconds")]
    RateLimited {
        /// Seconds to wait before retrying.
        retry_after_secs: u64,
    },

    /// Reaction already on the message, or not there to remove.
    #[error("Reaction conflict: {0}")]
    ReactionConflict(String),

    /// Network/HTTP error.
    #[error("Network error: {0}")]
    Network(String),

    /// WebSocket connection error.
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(String),

    /// Operation timed out.
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// Channel not found or bot not in channel.
    #[error("Channel error: {0}")]
    Channel(String),

    /// Message not found.
    #[error("Message error: {0}")]
    Message(String),

    /// Invalid payload received from Slack.
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// Triage operation failed.
    #[error(transparent)]
    Triage(#[from] TriageError),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<reqwest::Error> for SlackError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SlackError::Timeout(err.to_string())
        } else if err.is_connect() {
            SlackError::Network(format!("Connection failed: {}", err))
        } else {
            SlackError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for SlackError {
    fn from(err: serde_json::Error) -> Self {
        SlackError::Json(err.to_string())
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for SlackError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        SlackError::WebSocket(err.to_string())
    }
}

impl From<std::env::VarError> for SlackError {
    fn from(err: std::env::VarError) -> Self {
        SlackError::Config(format!("Environment variable error: {}", err))
    }
}

impl From<SlackError> for TriageError {
    fn from(err: SlackError) -> Self {
        match err {
            SlackError::ReactionConflict(code) => TriageError::MarkerConflict(code),
            SlackError::Config(msg) => TriageError::Config(msg),
            SlackError::Triage(inner) => inner,
            other => TriageError::Transport(other.to_string()),
        }
    }
}

/// Result type for Slack operations.
pub type SlackResult<T> = std::result::Result<T, SlackError>;

/// Represents a Slack API response error.
#[derive(Debug, Clone)]
pub struct SlackApiError {
    /// Error code from Slack (e.g., "channel_not_found").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

impl SlackApiError {
    /// Create a new API error.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl From<SlackApiError> for SlackError {
    fn from(err: SlackApiError) -> Self {
        match err.code.as_str() {
            // Slack spells it both ways depending on the method
            "ratelimited" | "rate_limited" => SlackError::RateLimited {
                retry_after_secs: 30,
            },
            "already_reacted" | "no_reaction" => SlackError::ReactionConflict(err.code),
            "invalid_auth" | "not_authed" | "account_inactive" | "token_revoked" => {
                SlackError::Auth(err.message)
            }
            "channel_not_found" | "not_in_channel" => SlackError::Channel(err.message),
            "message_not_found" => SlackError::Message(err.message),
            _ => SlackError::Api(format!("{}: {}", err.code, err.message)),
        }
    }
}
