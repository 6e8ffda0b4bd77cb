//! Platform capabilities the tagger depends on.
//!
//! Implementations talk to the chat platform; the core never caches what
//! they return.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::TriageResult;

/// Identity of a platform message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageRef {
    /// Channel ID.
    pub channel: String,
    /// Message timestamp (Slack's message id within a channel).
    pub ts: String,
}

impl MessageRef {
    pub fn new(channel: impl Into<String>, ts: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            ts: ts.into(),
        }
    }
}

/// A message as returned by a channel history lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryMessage {
    /// Message timestamp.
    pub ts: String,
    /// Author user ID (absent for some bot and system messages).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    /// Bot ID, present when an automated agent posted the message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot_id: Option<String>,
    /// Message subtype.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
    /// Message text.
    #[serde(default)]
    pub text: String,
}

impl HistoryMessage {
    /// Human-authored by `user` with some text.
    pub fn is_eligible_for(&self, user: &str) -> bool {
        self.user.as_deref() == Some(user) && self.bot_id.is_none() && !self.text.trim().is_empty()
    }
}

/// Adding, removing and listing markers on a message.
///
/// `add_marker` and `remove_marker` report "already present" and "not present"
/// as [`TriageError::MarkerConflict`](crate::TriageError::MarkerConflict).
#[async_trait]
pub trait MarkerApi: Send + Sync {
    /// Attach `marker` to the message.
    async fn add_marker(&self, target: &MessageRef, marker: &str) -> TriageResult<()>;

    /// Detach `marker` from the message.
    async fn remove_marker(&self, target: &MessageRef, marker: &str) -> TriageResult<()>;

    /// Markers currently attached to the message.
    async fn list_markers(&self, target: &MessageRef) -> TriageResult<Vec<String>>;
}

/// Channel history lookup.
#[async_trait]
pub trait HistoryApi: Send + Sync {
    /// Up to `limit` most recent messages in `channel`, newest first.
    async fn recent_messages(&self, channel: &str, limit: usize)
    -> TriageResult<Vec<HistoryMessage>>;
}

/// Everything the tagger needs from a platform.
pub trait TriagePlatform: MarkerApi + HistoryApi {}

impl<T: MarkerApi + HistoryApi> TriagePlatform for T {}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(user: Option<&str>, bot_id: Option<&str>, text: &str) -> HistoryMessage {
        HistoryMessage {
            ts: "1700000000.000100".to_string(),
            user: user.map(str::to_string),
            bot_id: bot_id.map(str::to_string),
            subtype: None,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_eligibility() {
        assert!(message(Some("U1"), None, "hello").is_eligible_for("U1"));
        assert!(!message(Some("U2"), None, "hello").is_eligible_for("U1"));
        assert!(!message(Some("U1"), Some("B1"), "hello").is_eligible_for("U1"));
        assert!(!message(Some("U1"), None, "   ").is_eligible_for("U1"));
        assert!(!message(None, None, "hello").is_eligible_for("U1"));
    }

    #[test]
    fn test_history_message_deserialize_defaults() {
        let msg: HistoryMessage =
            serde_json::from_str(r#"{"ts": "1.2", "type": "message"}"#).unwrap();
        assert_eq!(msg.ts, "1.2");
        assert!(msg.user.is_none());
        assert!(msg.text.is_empty());
    }
}
