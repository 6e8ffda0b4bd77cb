//! Trigger-word configuration.
//!
//! Trigger words are configured per tier and resolved once at startup into an
//! immutable [`TriggerSet`]. Sources, lowest precedence first:
//! - built-in defaults ([`Tier::default_triggers`])
//! - an optional TOML file ([`TriageConfig::load`])
//! - environment variables (`CRITICAL_KEYWORDS`, `HIGH_KEYWORDS`,
//!   `MEDIUM_KEYWORDS`, `LOW_KEYWORDS`, `TRIAGE_HISTORY_WINDOW`)
//!
//! ```toml
//! history_window = 20
//!
//! [keywords]
//! critical = ["urgent", "sev1", "outage"]
//! low = ["fyi"]
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{TriageError, TriageResult};
use crate::tier::Tier;

/// Number of recent channel messages searched on the manual path.
pub const DEFAULT_HISTORY_WINDOW: usize = 10;

/// Environment variable overriding the history window.
const HISTORY_WINDOW_ENV: &str = "TRIAGE_HISTORY_WINDOW";

/// Raw per-tier keyword lists as configured. `None` means "use the default".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeywordLists {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub critical: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub high: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medium: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub low: Option<Vec<String>>,
}

impl KeywordLists {
    /// Configured list for a tier, if any.
    pub fn get(&self, tier: Tier) -> Option<&Vec<String>> {
        match tier {
            Tier::Critical => self.critical.as_ref(),
            Tier::High => self.high.as_ref(),
            Tier::Medium => self.medium.as_ref(),
            Tier::Low => self.low.as_ref(),
        }
    }

    /// Replace the list for a tier.
    pub fn set(&mut self, tier: Tier, words: Vec<String>) {
        let slot = match tier {
            Tier::Critical => &mut self.critical,
            Tier::High => &mut self.high,
            Tier::Medium => &mut self.medium,
            Tier::Low => &mut self.low,
        };
        *slot = Some(words);
    }
}

/// Triage settings loaded once at process start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriageConfig {
    /// Trigger words per tier.
    #[serde(default)]
    pub keywords: KeywordLists,

    /// How many recent channel messages the manual path searches.
    #[serde(default = "default_history_window")]
    pub history_window: usize,
}

fn default_history_window() -> usize {
    DEFAULT_HISTORY_WINDOW
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            keywords: KeywordLists::default(),
            history_window: default_history_window(),
        }
    }
}

impl TriageConfig {
    /// Load settings from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> TriageResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            TriageError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config: Self = toml::from_str(&content).map_err(|e| {
            TriageError::Config(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        debug!(path = %path.display(), "Loaded triage config file");
        Ok(config)
    }

    /// Defaults overlaid with environment variables.
    pub fn from_env() -> TriageResult<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Overlay environment variables onto this config.
    pub fn apply_env(&mut self) -> TriageResult<()> {
        self.apply_env_with(|key| std::env::var(key).ok())
    }

    /// Overlay variables resolved through `lookup` onto this config.
    pub fn apply_env_with<F>(&mut self, lookup: F) -> TriageResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        for tier in Tier::ALL {
            if let Some(raw) = lookup(tier.env_var()) {
                self.keywords.set(tier, parse_keyword_list(&raw));
            }
        }

        if let Some(raw) = lookup(HISTORY_WINDOW_ENV) {
            self.history_window = raw.trim().parse().map_err(|_| {
                TriageError::Config(format!(
                    "{} must be a positive integer, got '{}'",
                    HISTORY_WINDOW_ENV, raw
                ))
            })?;
        }

        Ok(())
    }

    /// Validate the configuration.
    pub fn validate(&self) -> TriageResult<()> {
        if self.history_window == 0 {
            return Err(TriageError::Config(
                "history_window must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Resolve the configured lists into the immutable trigger set.
    pub fn trigger_set(&self) -> TriggerSet {
        TriggerSet::from_lists(&self.keywords)
    }
}

/// Split a comma-separated keyword list.
pub fn parse_keyword_list(raw: &str) -> Vec<String> {
    raw.split(',').map(|k| k.to_string()).collect()
}

/// Trimmed, lowercased, de-duplicated, blank entries removed.
fn normalize_words<'a, I>(words: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut normalized: Vec<String> = Vec::new();
    for word in words {
        let word = word.trim().to_lowercase();
        if !word.is_empty() && !normalized.contains(&word) {
            normalized.push(word);
        }
    }
    normalized
}

/// Immutable trigger words per tier. Every tier has at least one word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerSet {
    words: BTreeMap<Tier, Vec<String>>,
}

impl TriggerSet {
    /// Build from configured lists, substituting defaults for missing or
    /// blank tiers.
    pub fn from_lists(lists: &KeywordLists) -> Self {
        let words = Tier::ALL
            .into_iter()
            .map(|tier| {
                let configured = lists
                    .get(tier)
                    .map(|list| normalize_words(list.iter().map(String::as_str)))
                    .unwrap_or_default();

                let words = if configured.is_empty() {
                    if lists.get(tier).is_some() {
                        warn!(%tier, "Configured trigger list is empty, using defaults");
                    }
                    normalize_words(tier.default_triggers().iter().copied())
                } else {
                    configured
                };
                (tier, words)
            })
            .collect();

        Self { words }
    }

    /// Trigger words for a tier.
    pub fn get(&self, tier: Tier) -> &[String] {
        self.words.get(&tier).map(Vec::as_slice).unwrap_or_default()
    }

    /// Tiers with their words, most urgent first.
    pub fn iter(&self) -> impl Iterator<Item = (Tier, &[String])> {
        self.words.iter().map(|(tier, words)| (*tier, words.as_slice()))
    }
}

impl Default for TriggerSet {
    fn default() -> Self {
        Self::from_lists(&KeywordLists::default())
    }
}
