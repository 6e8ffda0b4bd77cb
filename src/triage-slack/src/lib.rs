//! Slack integration for the triage bot.
//!
//! This crate connects the platform-independent tagging logic in
//! `triage_core` to Slack:
//! - Socket Mode connection with automatic reconnect
//! - Automatic tagging of channel messages with priority reactions
//! - Slash commands (/prioritize, /priority-keywords)
//! - Priority buttons that retag the user's last message
//! - App Home dashboard
//!
//! # Architecture
//!
//! [`TriageSlackBot`] owns the WebSocket connection and acknowledges
//! envelopes. Work is handed to a [`SlackEventHandler`]; the production
//! handler is [`TriageHandler`], which drives a `Tagger` backed by
//! [`SlackWebClient`].
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use triage_slack::{BotOptions, SlackConfig, SlackWebClient, TriageHandler, TriageSlackBot};
//!
//! let options = BotOptions::default();
//! let client = Arc::new(SlackWebClient::new(SlackConfig::from_env()?, options.api_timeout)?);
//! let tagger = Tagger::new(classifier, Arc::clone(&client), 10);
//! let bot = TriageSlackBot::new(client, Arc::new(TriageHandler::new(tagger)), options);
//! bot.start().await?;
//! ```
//!
//! # Configuration
//!
//! Required environment variables:
//! - `SLACK_BOT_TOKEN` - Bot OAuth token (xoxb-...)
//! - `SLACK_APP_TOKEN` - App-level token for Socket Mode (xapp-...)
//! - `SLACK_SIGNING_SECRET` - Signing secret of the Slack app
//!
//! Optional:
//! - `SLACK_API_BASE_URL` - Web API base URL (defaults to `https://slack.com/api`)

pub mod bot;
pub mod client;
pub mod commands;
pub mod config;
pub mod error;
pub mod events;
pub mod handler;
pub mod interactions;
pub mod messages;

// Re-export main types
pub use bot::{BotOptions, TriageSlackBot};
pub use client::SlackWebClient;
pub use config::SlackConfig;
pub use error::{SlackError, SlackResult};
pub use events::SlackEvent;
pub use handler::{SlackEventHandler, TriageHandler};
pub use messages::SlackMessageBuilder;
