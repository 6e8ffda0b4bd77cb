//! Slack slash command handling.
//!
//! Supports the following slash commands:
//! - `/prioritize` - Offer buttons to set the priority of your last message
//! - `/priority-keywords` - List the trigger words of every tier
//!
//! Over Socket Mode the response is returned inside the envelope
//! acknowledgment; follow-ups (button clicks) go through `response_url`.

use serde::{Deserialize, Serialize};
use triage_core::TriggerSet;

use crate::messages::{PRIORITIZE_PROMPT, format_keywords, priority_buttons};

/// Command that offers the priority buttons.
pub const PRIORITIZE_COMMAND: &str = "/prioritize";

/// Command that lists trigger words.
pub const KEYWORDS_COMMAND: &str = "/priority-keywords";

/// Slack slash command payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlashCommandPayload {
    /// Team ID.
    #[serde(default)]
    pub team_id: String,
    /// Team domain.
    #[serde(default)]
    pub team_domain: String,
    /// Channel ID where command was invoked.
    pub channel_id: String,
    /// Channel name.
    #[serde(default)]
    pub channel_name: String,
    /// User ID who invoked the command.
    pub user_id: String,
    /// Username.
    #[serde(default)]
    pub user_name: String,
    /// The command (e.g., "/prioritize").
    pub command: String,
    /// Text after the command.
    #[serde(default)]
    pub text: String,
    /// API app ID.
    #[serde(default)]
    pub api_app_id: String,
    /// URL for delayed responses.
    #[serde(default)]
    pub response_url: String,
    /// Trigger ID for opening modals.
    #[serde(default)]
    pub trigger_id: String,
}

/// Response type for slash command responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseType {
    /// Only visible to the user who invoked the command.
    #[default]
    Ephemeral,
}

/// Immediate response to a slash command.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SlashCommandResponse {
    /// Response type (ephemeral or in_channel).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_type: Option<ResponseType>,
    /// Simple text response.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Block Kit blocks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocks: Option<serde_json::Value>,
}

impl SlashCommandResponse {
    /// Create a simple text response.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }

    /// Set response type to ephemeral (only visible to invoker).
    pub fn ephemeral(mut self) -> Self {
        self.response_type = Some(ResponseType::Ephemeral);
        self
    }

    /// Set Block Kit blocks.
    pub fn with_blocks(mut self, blocks: serde_json::Value) -> Self {
        self.blocks = Some(blocks);
        self
    }
}

/// Delayed response sent via response_url.
///
/// Can be sent up to 30 minutes after the original interaction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DelayedResponse {
    /// Response type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_type: Option<ResponseType>,
    /// Whether to replace the original message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replace_original: Option<bool>,
    /// Text content.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl DelayedResponse {
    /// Create a new delayed response.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set text content.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Set response type to ephemeral.
    pub fn ephemeral(mut self) -> Self {
        self.response_type = Some(ResponseType::Ephemeral);
        self
    }

    /// Replace the message that carried the buttons.
    pub fn replace_original(mut self) -> Self {
        self.replace_original = Some(true);
        self
    }
}

/// Parsed slash command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedCommand {
    /// /prioritize - show the priority buttons.
    Prioritize,
    /// /priority-keywords - list trigger words.
    PriorityKeywords,
    /// Unknown command.
    Unknown {
        /// The command name as typed.
        command: String,
    },
}

/// Parse a slash command payload into a structured command.
pub fn parse_command(payload: &SlashCommandPayload) -> ParsedCommand {
    let command = payload.command.trim().to_lowercase();

    match command.as_str() {
        PRIORITIZE_COMMAND => ParsedCommand::Prioritize,
        KEYWORDS_COMMAND => ParsedCommand::PriorityKeywords,
        _ => ParsedCommand::Unknown {
            command: payload.command.clone(),
        },
    }
}

/// Build the response to a parsed command. All responses are ephemeral.
pub fn command_response(command: &ParsedCommand, triggers: &TriggerSet) -> SlashCommandResponse {
    match command {
        ParsedCommand::Prioritize => SlashCommandResponse::text(PRIORITIZE_PROMPT)
            .with_blocks(serde_json::to_value(priority_buttons()).unwrap_or_default())
            .ephemeral(),
        ParsedCommand::PriorityKeywords => {
            SlashCommandResponse::text(format_keywords(triggers)).ephemeral()
        }
        ParsedCommand::Unknown { command } => {
            SlashCommandResponse::text(format!("❓ Unknown command: {}", command)).ephemeral()
        }
    }
}

#[cfg(test)]
mod tests {
    use triage_core::TriageConfig;

    use super::*;

    fn create_test_payload(command: &str, text: &str) -> SlashCommandPayload {
        SlashCommandPayload {
            team_id: "T12345".to_string(),
            team_domain: "test".to_string(),
            channel_id: "C67890".to_string(),
            channel_name: "general".to_string(),
            user_id: "U11111".to_string(),
            user_name: "testuser".to_string(),
            command: command.to_string(),
            text: text.to_string(),
            api_app_id: "A22222".to_string(),
            response_url: "https://hooks.slack.com/commands/xxx".to_string(),
            trigger_id: "trigger123".to_string(),
        }
    }

    #[test]
    fn test_parse_prioritize() {
        let cmd = parse_command(&create_test_payload(" /prioritize ", "now"));
        assert_eq!(cmd, ParsedCommand::Prioritize);
    }

    #[test]
    fn test_parse_keywords_case_insensitive() {
        let cmd = parse_command(&create_test_payload("/Priority-Keywords", ""));
        assert_eq!(cmd, ParsedCommand::PriorityKeywords);
    }

    #[test]
    fn test_parse_unknown_command() {
        let cmd = parse_command(&create_test_payload("/unknown", " some text "));
        assert_eq!(
            cmd,
            ParsedCommand::Unknown {
                command: "/unknown".to_string()
            }
        );
    }

    #[test]
    fn test_prioritize_response_has_buttons() {
        let triggers = TriageConfig::default().trigger_set();
        let cmd = parse_command(&create_test_payload("/prioritize", ""));
        let response = command_response(&cmd, &triggers);

        assert_eq!(response.response_type, Some(ResponseType::Ephemeral));
        assert_eq!(response.text.as_deref(), Some(PRIORITIZE_PROMPT));

        let blocks = response.blocks.unwrap();
        assert_eq!(blocks[1]["elements"][0]["action_id"], "priority_critical");
    }

    #[test]
    fn test_keywords_response() {
        let triggers = TriageConfig::default().trigger_set();
        let cmd = parse_command(&create_test_payload("/priority-keywords", ""));
        let response = command_response(&cmd, &triggers);

        let text = response.text.unwrap();
        assert!(text.contains("🟠 *HIGH*: important, priority, deadline, blocker"));
        assert!(response.blocks.is_none());
    }

    #[test]
    fn test_unknown_response() {
        let triggers = TriageConfig::default().trigger_set();
        let cmd = parse_command(&create_test_payload("/nope", ""));
        let response = command_response(&cmd, &triggers);

        assert!(response.text.unwrap().contains("Unknown command"));
        assert_eq!(response.response_type, Some(ResponseType::Ephemeral));
    }

    #[test]
    fn test_delayed_response_serialization() {
        let response = DelayedResponse::new()
            .with_text("Done!")
            .ephemeral()
            .replace_original();

        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            serde_json::json!({
                "response_type": "ephemeral",
                "replace_original": true,
                "text": "Done!"
            })
        );
    }

    #[test]
    fn test_payload_from_socket_mode() {
        let payload: SlashCommandPayload = serde_json::from_value(serde_json::json!({
            "command": "/prioritize",
            "channel_id": "C1",
            "user_id": "U1",
            "response_url": "https://hooks.slack.com/commands/1/2/3"
        }))
        .unwrap();

        assert_eq!(payload.command, "/prioritize");
        assert!(payload.text.is_empty());
    }
}
