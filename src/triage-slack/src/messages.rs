//! Block Kit rendering.
//!
//! Everything the bot shows to users is built here:
//! - the priority button set offered by `/prioritize`
//! - the keyword listing for `/priority-keywords`
//! - replies to button clicks
//! - the App Home dashboard

use serde::{Deserialize, Serialize};
use triage_core::{Tier, TriggerSet};

/// Prompt shown above the priority buttons.
pub const PRIORITIZE_PROMPT: &str =
    "Use the buttons below to set the priority of your last message:";

/// Reply when no recent message from the user could be found.
pub const NO_ELIGIBLE_MESSAGE: &str =
    "❌ Could not find a recent message to prioritize. Please send a message first.";

/// Reply when tagging failed for any other reason.
pub const PRIORITIZE_FAILED: &str = "❌ An error occurred while setting the priority.";

/// Slack Block Kit block types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SlackBlock {
    /// Header block.
    Header { text: SlackTextObject },
    /// Section block (main content).
    Section { text: SlackTextObject },
    /// Divider block.
    Divider {},
    /// Actions block (buttons).
    Actions { elements: Vec<SlackBlockElement> },
}

/// Slack text object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlackTextObject {
    #[serde(rename = "type")]
    pub text_type: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emoji: Option<bool>,
}

impl SlackTextObject {
    /// Create a plain text object.
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text_type: "plain_text".to_string(),
            text: text.into(),
            emoji: Some(true),
        }
    }

    /// Create a mrkdwn text object.
    pub fn mrkdwn(text: impl Into<String>) -> Self {
        Self {
            text_type: "mrkdwn".to_string(),
            text: text.into(),
            emoji: None,
        }
    }
}

/// Interactive block element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SlackBlockElement {
    /// Button element.
    Button {
        text: SlackTextObject,
        action_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        value: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        style: Option<String>,
    },
}

impl SlackBlockElement {
    /// Button that applies `tier` when clicked.
    pub fn priority_button(tier: Tier) -> Self {
        let style = match tier {
            Tier::Critical => Some("danger".to_string()),
            Tier::High => Some("primary".to_string()),
            Tier::Medium | Tier::Low => None,
        };

        SlackBlockElement::Button {
            text: SlackTextObject::plain(format!("{} {}", tier.emoji(), tier.title())),
            action_id: tier.action_id().to_string(),
            value: Some(tier.name().to_string()),
            style,
        }
    }
}

/// Builder for block lists.
#[derive(Debug, Default)]
pub struct SlackMessageBuilder {
    blocks: Vec<SlackBlock>,
}

impl SlackMessageBuilder {
    /// Create a new message builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a header block.
    pub fn header(mut self, text: impl Into<String>) -> Self {
        self.blocks.push(SlackBlock::Header {
            text: SlackTextObject::plain(text),
        });
        self
    }

    /// Add a section with mrkdwn text.
    pub fn section(mut self, text: impl Into<String>) -> Self {
        self.blocks.push(SlackBlock::Section {
            text: SlackTextObject::mrkdwn(text),
        });
        self
    }

    /// Add a divider.
    pub fn divider(mut self) -> Self {
        self.blocks.push(SlackBlock::Divider {});
        self
    }

    /// Add an actions block.
    pub fn actions(mut self, elements: Vec<SlackBlockElement>) -> Self {
        self.blocks.push(SlackBlock::Actions { elements });
        self
    }

    /// Finish and return the blocks.
    pub fn build(self) -> Vec<SlackBlock> {
        self.blocks
    }
}

/// A view published to a user's App Home tab.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HomeView {
    #[serde(rename = "type")]
    pub view_type: String,
    pub blocks: Vec<SlackBlock>,
}

/// Section plus one button per tier.
pub fn priority_buttons() -> Vec<SlackBlock> {
    SlackMessageBuilder::new()
        .section("*Set Message Priority:*")
        .actions(
            Tier::ALL
                .into_iter()
                .map(SlackBlockElement::priority_button)
                .collect(),
        )
        .build()
}

/// mrkdwn listing of every tier's trigger words.
pub fn format_keywords(triggers: &TriggerSet) -> String {
    let lines = triggers
        .iter()
        .map(|(tier, words)| format!("{} *{}*: {}", tier.emoji(), tier.label(), words.join(", ")))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "*Priority Detection Keywords:*\n\n{}\n\n_Messages containing these keywords will be automatically tagged with the corresponding priority level._",
        lines
    )
}

/// Confirmation after a manual tag.
pub fn format_prioritized(tier: Tier) -> String {
    format!("{} Message prioritized as *{}*!", tier.emoji(), tier.name())
}

/// The App Home dashboard.
pub fn home_view() -> HomeView {
    let levels = Tier::ALL
        .into_iter()
        .map(|tier| format!("{} *{}* - {}", tier.emoji(), tier.title(), tier.description()))
        .collect::<Vec<_>>()
        .join("\n");

    let blocks = SlackMessageBuilder::new()
        .header("📊 Message Priority Dashboard")
        .section(
            "*Welcome to the Slack Message Prioritization App!*\n\n\
             This app helps you manage and prioritize your messages effectively.",
        )
        .divider()
        .section(
            "*How it works:*\n\n\
             • 🤖 *Automatic Detection*: Messages with priority keywords are automatically tagged\n\
             • 🔘 *Manual Tagging*: Use `/prioritize` to manually set message priority\n\
             • 📝 *View Keywords*: Use `/priority-keywords` to see the priority detection keywords\n\
             • 🎨 *Visual Indicators*: Priority levels are shown with colored emoji reactions",
        )
        .divider()
        .section(format!("*Priority Levels:*\n\n{}", levels))
        .divider()
        .section(
            "*Commands:*\n\n\
             `/prioritize` - Manually prioritize your last message\n\
             `/priority-keywords` - View priority detection keywords",
        )
        .build();

    HomeView {
        view_type: "home".to_string(),
        blocks,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use triage_core::TriageConfig;

    use super::*;

    #[test]
    fn test_priority_buttons_serialize() {
        let blocks = priority_buttons();
        let json = serde_json::to_value(&blocks).unwrap();

        assert_eq!(json[0]["type"], "section");
        assert_eq!(json[0]["text"]["text"], "*Set Message Priority:*");
        assert_eq!(json[1]["type"], "actions");

        let buttons = json[1]["elements"].as_array().unwrap();
        assert_eq!(buttons.len(), 4);
        assert_eq!(buttons[0]["type"], "button");
        assert_eq!(buttons[0]["action_id"], "priority_critical");
        assert_eq!(buttons[0]["text"]["text"], "🔴 Critical");
        assert_eq!(buttons[0]["style"], "danger");
        assert_eq!(buttons[1]["style"], "primary");
        assert!(buttons[2].get("style").is_none());
        assert_eq!(buttons[3]["action_id"], "priority_low");
    }

    #[test]
    fn test_format_keywords() {
        let text = format_keywords(&TriageConfig::default().trigger_set());

        assert!(text.starts_with("*Priority Detection Keywords:*\n\n"));
        assert!(text.contains("🔴 *CRITICAL*: urgent, emergency, critical, asap, immediately"));
        assert!(text.contains("🟢 *LOW*: fyi, info, update"));
        assert!(text.ends_with("corresponding priority level._"));

        let critical = text.find("CRITICAL").unwrap();
        let low = text.find("LOW").unwrap();
        assert!(critical < low);
    }

    #[test]
    fn test_format_prioritized() {
        assert_eq!(
            format_prioritized(Tier::Critical),
            "🔴 Message prioritized as *critical*!"
        );
    }

    #[test]
    fn test_home_view() {
        let view = home_view();
        assert_eq!(view.view_type, "home");

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["type"], "home");
        assert_eq!(json["blocks"][0]["type"], "header");
        assert_eq!(json["blocks"][0]["text"]["text"], "📊 Message Priority Dashboard");
        assert_eq!(json["blocks"][2], serde_json::json!({"type": "divider"}));

        let levels = match &view.blocks[5] {
            SlackBlock::Section { text } => text.text.clone(),
            other => panic!("Expected section, got {:?}", other),
        };
        assert!(levels.contains("🟠 *High* - Important tasks with deadlines"));
    }

    #[test]
    fn test_builder_order() {
        let blocks = SlackMessageBuilder::new().header("Title").divider().section("body").build();
        assert_eq!(
            blocks,
            vec![
                SlackBlock::Header {
                    text: SlackTextObject::plain("Title")
                },
                SlackBlock::Divider {},
                SlackBlock::Section {
                    text: SlackTextObject::mrkdwn("body")
                },
            ]
        );
    }
}
