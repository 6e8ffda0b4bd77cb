//! Keyword classifier.
//!
//! A message is classified into the most urgent tier that has at least one
//! trigger word occurring in the text as a whole word. A word boundary is the
//! start or end of the text or any character that is not a letter or digit,
//! so `info` matches in `"Info: standup moved"` and `"fyi/info"` but not in
//! `"information"`.

use regex::Regex;

use crate::error::{TriageError, TriageResult};
use crate::tier::Tier;
use crate::triggers::TriggerSet;

/// Letters and digits form words; everything else separates them.
const BOUNDARY: &str = r"[^\p{L}\p{N}]";

/// Classifies message text against an immutable trigger set.
#[derive(Debug, Clone)]
pub struct Classifier {
    triggers: TriggerSet,
    /// One matcher per tier, most urgent first.
    matchers: Vec<(Tier, Regex)>,
}

impl Classifier {
    /// Compile matchers for every tier of `triggers`.
    pub fn new(triggers: TriggerSet) -> TriageResult<Self> {
        let matchers = triggers
            .iter()
            .map(|(tier, words)| Ok((tier, whole_word_matcher(words)?)))
            .collect::<TriageResult<Vec<_>>>()?;

        Ok(Self { triggers, matchers })
    }

    /// The trigger set this classifier was built from.
    pub fn triggers(&self) -> &TriggerSet {
        &self.triggers
    }

    /// Classify `text`, returning the most urgent matching tier.
    ///
    /// Absence of any trigger word is `None`, not an error.
    pub fn classify(&self, text: &str) -> Option<Tier> {
        if text.is_empty() {
            return None;
        }

        let lower = text.to_lowercase();
        self.matchers
            .iter()
            .find(|(_, matcher)| matcher.is_match(&lower))
            .map(|(tier, _)| *tier)
    }
}

/// Build a regex matching any of `words` delimited by boundaries.
fn whole_word_matcher(words: &[String]) -> TriageResult<Regex> {
    let alternatives = words
        .iter()
        .map(|w| regex::escape(w))
        .collect::<Vec<_>>()
        .join("|");

    let pattern = format!("(?:^|{BOUNDARY})(?:{alternatives})(?:{BOUNDARY}|$)");
    Regex::new(&pattern)
        .map_err(|e| TriageError::Config(format!("Invalid trigger words: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::triggers::{KeywordLists, TriageConfig};

    fn default_classifier() -> Classifier {
        Classifier::new(TriageConfig::default().trigger_set()).unwrap()
    }

    #[test]
    fn test_known_messages() {
        let classifier = default_classifier();
        let cases = [
            ("This is an urgent issue", Some(Tier::Critical)),
            ("Emergency - server down!", Some(Tier::Critical)),
            ("Important deadline tomorrow", Some(Tier::High)),
            ("This is a blocker for the release", Some(Tier::High)),
            ("We need this soon", Some(Tier::Medium)),
            ("This is required for next sprint", Some(Tier::Medium)),
            ("FYI: new documentation available", Some(Tier::Low)),
            ("Info: team meeting at 3pm", Some(Tier::Low)),
            ("This is a regular message", None),
            ("We are organizing the materials", None),
        ];

        for (text, expected) in cases {
            assert_eq!(classifier.classify(text), expected, "text: {text:?}");
        }
    }

    #[test]
    fn test_urgency_wins_over_lower_tiers() {
        let classifier = default_classifier();
        assert_eq!(
            classifier.classify("fyi: minor update, but also urgent"),
            Some(Tier::Critical)
        );
        assert_eq!(
            classifier.classify("soon-ish update on the deadline"),
            Some(Tier::High)
        );
    }

    #[test]
    fn test_substrings_do_not_match() {
        let classifier = default_classifier();
        assert_eq!(classifier.classify("See the information pack"), None);
        assert_eq!(classifier.classify("prioritize later"), None);
        assert_eq!(classifier.classify("updates were shipped"), None);
        assert_eq!(classifier.classify("asap2"), None);
    }

    #[test]
    fn test_case_insensitive() {
        let classifier = default_classifier();
        assert_eq!(classifier.classify("URGENT issue"), Some(Tier::Critical));
        assert_eq!(
            classifier.classify("URGENT issue"),
            classifier.classify("urgent issue")
        );
    }

    #[test]
    fn test_punctuation_and_underscore_are_boundaries() {
        let classifier = default_classifier();
        assert_eq!(classifier.classify("(urgent)"), Some(Tier::Critical));
        assert_eq!(classifier.classify("status_update"), Some(Tier::Low));
        assert_eq!(classifier.classify("fyi/info"), Some(Tier::Low));
        assert_eq!(classifier.classify("asap"), Some(Tier::Critical));
    }

    #[test]
    fn test_empty_text() {
        assert_eq!(default_classifier().classify(""), None);
    }

    #[test]
    fn test_phrases_and_metacharacters_match_literally() {
        let lists = KeywordLists {
            critical: Some(vec!["p0".to_string(), "site down".to_string()]),
            medium: Some(vec!["c++".to_string()]),
            ..Default::default()
        };
        let classifier = Classifier::new(crate::triggers::TriggerSet::from_lists(&lists)).unwrap();

        assert_eq!(classifier.classify("Site down again"), Some(Tier::Critical));
        assert_eq!(classifier.classify("the site is down"), None);
        assert_eq!(classifier.classify("p0 incident"), Some(Tier::Critical));
        assert_eq!(classifier.classify("need c++ help"), Some(Tier::Medium));
        assert_eq!(classifier.classify("need cxx help"), None);
    }
}
