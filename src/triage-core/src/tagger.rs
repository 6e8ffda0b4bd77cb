//! Marker reconciliation.
//!
//! The tagger is stateless: every call reads whatever it needs from the
//! platform and issues add/remove requests against it. Two paths exist:
//!
//! - **Automatic** ([`Tagger::auto_tag`]): classify an inbound message and add
//!   the tier's marker. Markers of other tiers already on the message are left
//!   alone, so a message reclassified differently would carry both.
//! - **Manual** ([`Tagger::apply_tier`]): read the message's current markers,
//!   remove every marker of another tier, then add the requested one. A failed
//!   removal is logged and the add still happens.
//!
//! Adding a marker that is already present and removing one that is absent
//! both count as success.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::classifier::Classifier;
use crate::error::{TriageError, TriageResult};
use crate::platform::{MessageRef, TriagePlatform};
use crate::tier::Tier;

/// Subtype Slack uses for thread replies also posted to the channel.
const THREAD_BROADCAST: &str = "thread_broadcast";

/// Whether a message event may be classified at all.
///
/// Messages from automated agents are excluded, as are all subtyped events
/// (edits, deletions, joins...) except thread broadcasts.
pub fn is_eligible_event(bot_id: Option<&str>, subtype: Option<&str>) -> bool {
    bot_id.is_none() && matches!(subtype, None | Some(THREAD_BROADCAST))
}

/// A newly posted message, as delivered by the event source.
#[derive(Debug, Clone, Default)]
pub struct InboundMessage {
    pub channel: String,
    pub ts: String,
    pub user: Option<String>,
    pub text: String,
    pub bot_id: Option<String>,
    pub subtype: Option<String>,
}

impl InboundMessage {
    pub fn target(&self) -> MessageRef {
        MessageRef::new(&self.channel, &self.ts)
    }

    pub fn is_eligible(&self) -> bool {
        is_eligible_event(self.bot_id.as_deref(), self.subtype.as_deref())
    }
}

/// Result of an automatic tagging attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagOutcome {
    /// The tier's marker is now on the message.
    Tagged(Tier),
    /// Nothing to do: ineligible message or no trigger word.
    Skipped,
}

/// Applies tier markers to messages through a platform.
pub struct Tagger<P> {
    classifier: Arc<Classifier>,
    platform: Arc<P>,
    history_window: usize,
}

impl<P> Clone for Tagger<P> {
    fn clone(&self) -> Self {
        Self {
            classifier: Arc::clone(&self.classifier),
            platform: Arc::clone(&self.platform),
            history_window: self.history_window,
        }
    }
}

impl<P: TriagePlatform> Tagger<P> {
    pub fn new(classifier: Arc<Classifier>, platform: Arc<P>, history_window: usize) -> Self {
        Self {
            classifier,
            platform,
            history_window: history_window.max(1),
        }
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn history_window(&self) -> usize {
        self.history_window
    }

    /// Classify an inbound message and mark it with its tier.
    pub async fn auto_tag(&self, message: &InboundMessage) -> TriageResult<TagOutcome> {
        if !message.is_eligible() {
            return Ok(TagOutcome::Skipped);
        }

        let Some(tier) = self.classifier.classify(&message.text) else {
            return Ok(TagOutcome::Skipped);
        };

        self.add_marker(&message.target(), tier).await?;
        info!(
            "Auto-detected {} priority for message: \"{}...\"",
            tier,
            preview(&message.text, 50)
        );
        Ok(TagOutcome::Tagged(tier))
    }

    /// Make `tier` the only tier marker on `target`.
    pub async fn apply_tier(&self, target: &MessageRef, tier: Tier) -> TriageResult<()> {
        let current = self.platform.list_markers(target).await?;

        let mut stale: Vec<Tier> = current
            .iter()
            .filter_map(|marker| Tier::from_marker(marker))
            .filter(|t| *t != tier)
            .collect();
        stale.sort();
        stale.dedup();

        for old in stale {
            match self.platform.remove_marker(target, old.marker()).await {
                Ok(()) => debug!(%old, ts = %target.ts, "Removed stale priority marker"),
                Err(TriageError::MarkerConflict(reason)) => {
                    debug!(%old, %reason, "Stale marker already gone")
                }
                Err(e) => warn!(
                    "Failed to remove {} marker from {}/{}: {}",
                    old, target.channel, target.ts, e
                ),
            }
        }

        self.add_marker(target, tier).await
    }

    /// Find the most recent eligible message posted by `user` in `channel`.
    pub async fn resolve_target(&self, channel: &str, user: &str) -> TriageResult<MessageRef> {
        let messages = self
            .platform
            .recent_messages(channel, self.history_window)
            .await?;

        messages
            .into_iter()
            .take(self.history_window)
            .find(|m| m.is_eligible_for(user))
            .map(|m| MessageRef::new(channel, m.ts))
            .ok_or_else(|| TriageError::NoEligibleMessage {
                channel: channel.to_string(),
                user: user.to_string(),
                window: self.history_window,
            })
    }

    /// Manual flow: tag the user's latest message in `channel` with `tier`.
    pub async fn tag_latest(&self, channel: &str, user: &str, tier: Tier) -> TriageResult<MessageRef> {
        let target = self.resolve_target(channel, user).await?;
        self.apply_tier(&target, tier).await?;
        info!(%tier, user, channel, ts = %target.ts, "Manually prioritized message");
        Ok(target)
    }

    async fn add_marker(&self, target: &MessageRef, tier: Tier) -> TriageResult<()> {
        match self.platform.add_marker(target, tier.marker()).await {
            Ok(()) => Ok(()),
            Err(TriageError::MarkerConflict(reason)) => {
                debug!(%tier, %reason, "Marker already present");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

/// First `max` characters of `text`.
fn preview(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
