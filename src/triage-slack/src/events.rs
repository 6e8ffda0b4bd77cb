//! Socket Mode envelopes and Events API payloads.
//!
//! Handles the events the triage bot subscribes to:
//! - `message.channels` / `message.groups` - messages to classify
//! - `app_home_opened` - render the App Home dashboard
//!
//! Every envelope is acknowledged by echoing its `envelope_id`; slash command
//! envelopes may carry the command's response in the acknowledgment.

use serde::{Deserialize, Serialize};
use tracing::debug;
use triage_core::InboundMessage;

use crate::error::{SlackError, SlackResult};

/// Slack event types that we handle.
#[derive(Debug, Clone)]
pub enum SlackEvent {
    /// A message was posted (or changed, deleted... see `subtype`).
    Message(MessageEvent),
    /// A user opened the bot's App Home.
    AppHomeOpened(AppHomeOpenedEvent),
    /// Any other event type.
    Unknown(String),
}

/// Event payload for messages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageEvent {
    /// User who sent the message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    /// Text of the message.
    #[serde(default)]
    pub text: String,
    /// Channel where the message was sent.
    pub channel: String,
    /// Timestamp of the message.
    pub ts: String,
    /// Subtype of message (e.g., "message_changed").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
    /// Bot ID (if message is from a bot).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bot_id: Option<String>,
}

impl From<MessageEvent> for InboundMessage {
    fn from(event: MessageEvent) -> Self {
        InboundMessage {
            channel: event.channel,
            ts: event.ts,
            user: event.user,
            text: event.text,
            bot_id: event.bot_id,
            subtype: event.subtype,
        }
    }
}

/// Event payload for `app_home_opened`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppHomeOpenedEvent {
    /// User who opened the App Home.
    pub user: String,
    /// The App Home's DM channel.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    /// Which tab was opened ("home" or "messages").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tab: Option<String>,
}

impl AppHomeOpenedEvent {
    /// Whether the Home tab (rather than the Messages tab) was opened.
    pub fn is_home_tab(&self) -> bool {
        self.tab.as_deref().is_none_or(|tab| tab == "home")
    }
}

/// Socket Mode envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocketModeEnvelope {
    /// Envelope ID for acknowledgment (absent on `hello` and `disconnect`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub envelope_id: Option<String>,
    /// Type of payload.
    #[serde(rename = "type")]
    pub envelope_type: String,
    /// Actual payload; its shape depends on `envelope_type`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
    /// Whether the acknowledgment may carry a response payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accepts_response_payload: Option<bool>,
    /// Reason given on `disconnect` envelopes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Event callback payload (`events_api` envelopes).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventPayload {
    /// Team ID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_id: Option<String>,
    /// API app ID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_app_id: Option<String>,
    /// The actual event.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<serde_json::Value>,
    /// Payload type ("event_callback").
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "type")]
    pub payload_type: Option<String>,
    /// Event ID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    /// Event time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_time: Option<u64>,
}

/// Socket Mode acknowledgment response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocketModeAck {
    /// Envelope ID being acknowledged.
    pub envelope_id: String,
    /// Optional response payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}

impl SocketModeAck {
    /// Create a simple acknowledgment.
    pub fn new(envelope_id: impl Into<String>) -> Self {
        Self {
            envelope_id: envelope_id.into(),
            payload: None,
        }
    }

    /// Create an acknowledgment with a response payload.
    pub fn with_payload(envelope_id: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            envelope_id: envelope_id.into(),
            payload: Some(payload),
        }
    }
}

/// Parse the event carried by an `events_api` payload.
pub fn parse_event(payload: &EventPayload) -> SlackResult<SlackEvent> {
    let event_json = payload
        .event
        .as_ref()
        .ok_or_else(|| SlackError::InvalidPayload("Missing event field".to_string()))?;

    let event_type = event_json
        .get("type")
        .and_then(|t| t.as_str())
        .unwrap_or("unknown");

    debug!("Parsing event type: {}", event_type);

    match event_type {
        "message" => {
            let event: MessageEvent = serde_json::from_value(event_json.clone())?;
            Ok(SlackEvent::Message(event))
        }
        "app_home_opened" => {
            let event: AppHomeOpenedEvent = serde_json::from_value(event_json.clone())?;
            Ok(SlackEvent::AppHomeOpened(event))
        }
        other => Ok(SlackEvent::Unknown(other.to_string())),
    }
}
