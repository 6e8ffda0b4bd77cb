//! Interactive component payloads (button clicks).
//!
//! Only `block_actions` payloads are handled, and only for the four priority
//! buttons rendered by [`priority_buttons`](crate::messages::priority_buttons).

use serde::{Deserialize, Serialize};
use triage_core::Tier;

use crate::error::{SlackError, SlackResult};

/// User reference inside an interaction payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionUser {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

/// Channel reference inside an interaction payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionChannel {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// A single action within a `block_actions` payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockAction {
    pub action_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// `block_actions` interaction payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockActionsPayload {
    /// Always "block_actions".
    #[serde(rename = "type")]
    pub payload_type: String,
    /// User who clicked.
    pub user: InteractionUser,
    /// Channel the buttons were shown in (absent for App Home surfaces).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<InteractionChannel>,
    /// Where to send the reply.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_url: Option<String>,
    /// Actions taken.
    #[serde(default)]
    pub actions: Vec<BlockAction>,
}

impl BlockActionsPayload {
    /// Parse an `interactive` envelope payload. Returns `None` for interaction
    /// types other than `block_actions`.
    pub fn from_value(value: serde_json::Value) -> SlackResult<Option<Self>> {
        let kind = value.get("type").and_then(|t| t.as_str()).unwrap_or_default();
        if kind != "block_actions" {
            return Ok(None);
        }
        serde_json::from_value(value)
            .map(Some)
            .map_err(|e| SlackError::InvalidPayload(format!("block_actions: {}", e)))
    }

    /// The priority button click this payload carries, if any.
    pub fn priority_action(&self) -> Option<PriorityAction> {
        let tier = self
            .actions
            .iter()
            .find_map(|a| Tier::from_action_id(&a.action_id))?;

        Some(PriorityAction {
            tier,
            user_id: self.user.id.clone(),
            channel_id: self.channel.as_ref().map(|c| c.id.clone()),
            response_url: self.response_url.clone(),
        })
    }
}

/// A click on one of the priority buttons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriorityAction {
    pub tier: Tier,
    pub user_id: String,
    pub channel_id: Option<String>,
    pub response_url: Option<String>,
}
