//! Priority tiers.
//!
//! The set of tiers is fixed. Ordering follows urgency: `Critical` sorts
//! first and `Low` last, so `Tier::ALL` is also the classification order.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the four urgency levels a message can be tagged with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// Urgent issues requiring immediate attention.
    Critical,
    /// Important tasks with deadlines.
    High,
    /// Standard priority items.
    Medium,
    /// Informational updates and FYIs.
    Low,
}

impl Tier {
    /// All tiers, most urgent first.
    pub const ALL: [Tier; 4] = [Tier::Critical, Tier::High, Tier::Medium, Tier::Low];

    /// Lowercase display name ("critical").
    pub fn name(self) -> &'static str {
        match self {
            Tier::Critical => "critical",
            Tier::High => "high",
            Tier::Medium => "medium",
            Tier::Low => "low",
        }
    }

    /// Uppercase label used in keyword listings ("CRITICAL").
    pub fn label(self) -> &'static str {
        match self {
            Tier::Critical => "CRITICAL",
            Tier::High => "HIGH",
            Tier::Medium => "MEDIUM",
            Tier::Low => "LOW",
        }
    }

    /// Capitalized title used on buttons ("Critical").
    pub fn title(self) -> &'static str {
        match self {
            Tier::Critical => "Critical",
            Tier::High => "High",
            Tier::Medium => "Medium",
            Tier::Low => "Low",
        }
    }

    /// Reaction name placed on a tagged message.
    pub fn marker(self) -> &'static str {
        match self {
            Tier::Critical => "red_circle",
            Tier::High => "orange_circle",
            Tier::Medium => "yellow_circle",
            Tier::Low => "green_circle",
        }
    }

    /// Emoji shown next to the tier in rendered text.
    pub fn emoji(self) -> &'static str {
        match self {
            Tier::Critical => "🔴",
            Tier::High => "🟠",
            Tier::Medium => "🟡",
            Tier::Low => "🟢",
        }
    }

    /// Action id of the button that applies this tier manually.
    pub fn action_id(self) -> &'static str {
        match self {
            Tier::Critical => "priority_critical",
            Tier::High => "priority_high",
            Tier::Medium => "priority_medium",
            Tier::Low => "priority_low",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Tier::Critical => "Urgent issues requiring immediate attention",
            Tier::High => "Important tasks with deadlines",
            Tier::Medium => "Standard priority items",
            Tier::Low => "Informational updates and FYIs",
        }
    }

    /// Built-in trigger words, used when a tier is not configured.
    pub fn default_triggers(self) -> &'static [&'static str] {
        match self {
            Tier::Critical => &["urgent", "emergency", "critical", "asap", "immediately"],
            Tier::High => &["important", "priority", "deadline", "blocker"],
            Tier::Medium => &["soon", "needed", "required"],
            Tier::Low => &["fyi", "info", "update"],
        }
    }

    /// Environment variable that overrides this tier's trigger list.
    pub fn env_var(self) -> &'static str {
        match self {
            Tier::Critical => "CRITICAL_KEYWORDS",
            Tier::High => "HIGH_KEYWORDS",
            Tier::Medium => "MEDIUM_KEYWORDS",
            Tier::Low => "LOW_KEYWORDS",
        }
    }

    /// Look up the tier whose marker is `marker`.
    pub fn from_marker(marker: &str) -> Option<Tier> {
        Tier::ALL.into_iter().find(|t| t.marker() == marker)
    }

    /// Look up the tier a button action id refers to.
    pub fn from_action_id(action_id: &str) -> Option<Tier> {
        Tier::ALL.into_iter().find(|t| t.action_id() == action_id)
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
