//! Event handling for the triage bot.
//!
//! [`SlackEventHandler`] is the seam between the Socket Mode loop and the
//! application. [`TriageHandler`] routes messages into automatic tagging,
//! button clicks into manual tagging, and renders replies.

use async_trait::async_trait;
use tracing::{debug, error, info, warn};
use triage_core::{MessageRef, TagOutcome, Tagger, Tier, TriageError, TriageResult};

use crate::client::SlackWebClient;
use crate::commands::{
    DelayedResponse, SlashCommandPayload, SlashCommandResponse, command_response, parse_command,
};
use crate::error::SlackResult;
use crate::events::{AppHomeOpenedEvent, MessageEvent};
use crate::interactions::BlockActionsPayload;
use crate::messages::{NO_ELIGIBLE_MESSAGE, PRIORITIZE_FAILED, format_prioritized, home_view};

/// Trait for handling Slack events.
#[async_trait]
pub trait SlackEventHandler: Send + Sync {
    /// Handle a `message` event.
    async fn on_message(&self, event: MessageEvent) -> SlackResult<()>;

    /// Handle an `app_home_opened` event.
    async fn on_app_home_opened(&self, event: AppHomeOpenedEvent) -> SlackResult<()>;

    /// Build the response to a slash command. The result is sent back in the
    /// envelope acknowledgment, so this must not block on network calls.
    async fn on_slash_command(&self, payload: &SlashCommandPayload) -> SlashCommandResponse;

    /// Handle a `block_actions` interaction.
    async fn on_block_actions(&self, payload: BlockActionsPayload) -> SlackResult<()>;
}

/// Handler that classifies and tags messages.
#[derive(Clone)]
pub struct TriageHandler {
    tagger: Tagger<SlackWebClient>,
}

impl TriageHandler {
    pub fn new(tagger: Tagger<SlackWebClient>) -> Self {
        Self { tagger }
    }

    fn client(&self) -> &SlackWebClient {
        self.tagger.platform()
    }
}

#[async_trait]
impl SlackEventHandler for TriageHandler {
    async fn on_message(&self, event: MessageEvent) -> SlackResult<()> {
        match self.tagger.auto_tag(&event.into()).await? {
            TagOutcome::Tagged(tier) => debug!(%tier, "Message auto-tagged"),
            TagOutcome::Skipped => {}
        }
        Ok(())
    }

    async fn on_app_home_opened(&self, event: AppHomeOpenedEvent) -> SlackResult<()> {
        if !event.is_home_tab() {
            return Ok(());
        }
        self.client().publish_home(&event.user, &home_view()).await?;
        debug!(user = %event.user, "Published App Home");
        Ok(())
    }

    async fn on_slash_command(&self, payload: &SlashCommandPayload) -> SlashCommandResponse {
        info!(
            "Handling slash command {} from user {}",
            payload.command, payload.user_id
        );
        let parsed = parse_command(payload);
        command_response(&parsed, self.tagger.classifier().triggers())
    }

    async fn on_block_actions(&self, payload: BlockActionsPayload) -> SlackResult<()> {
        let Some(action) = payload.priority_action() else {
            debug!("Ignoring block action without a priority button");
            return Ok(());
        };

        let Some(response_url) = action.response_url.as_deref() else {
            warn!(user = %action.user_id, "Priority click without response_url");
            return Ok(());
        };

        let result = match action.channel_id.as_deref() {
            Some(channel) => {
                self.tagger
                    .tag_latest(channel, &action.user_id, action.tier)
                    .await
            }
            None => Err(TriageError::Transport(
                "priority click has no channel".to_string(),
            )),
        };

        match &result {
            Ok(_) => {}
            Err(e) if e.is_user_facing() => info!("{}", e),
            Err(e) => error!("Failed to prioritize message: {}", e),
        }

        self.client()
            .send_response(response_url, &prioritize_reply(&result, action.tier))
            .await
    }
}

/// Reply sent through `response_url` after a priority button click.
pub fn prioritize_reply(result: &TriageResult<MessageRef>, tier: Tier) -> DelayedResponse {
    let text = match result {
        Ok(_) => format_prioritized(tier),
        Err(TriageError::NoEligibleMessage { .. }) => NO_ELIGIBLE_MESSAGE.to_string(),
        Err(_) => PRIORITIZE_FAILED.to_string(),
    };

    DelayedResponse::new()
        .with_text(text)
        .ephemeral()
        .replace_original()
}
