//! Priority triage core.
//!
//! Everything the triage bot decides lives here, independent of the chat
//! platform it runs on:
//! - [`Tier`] - the four fixed priority levels and their markers
//! - [`TriggerSet`] / [`TriageConfig`] - configured trigger words per tier
//! - [`Classifier`] - whole-word keyword classification of message text
//! - [`Tagger`] - marker reconciliation for the automatic and manual paths
//!
//! Platform access goes through the [`MarkerApi`] and [`HistoryApi`] traits,
//! which the Slack crate implements against the Web API.
//!
//! # Example
//!
//! ```rust
//! use triage_core::{Classifier, Tier, TriageConfig};
//!
//! let triggers = TriageConfig::default().trigger_set();
//! let classifier = Classifier::new(triggers).unwrap();
//! assert_eq!(classifier.classify("This is an urgent issue"), Some(Tier::Critical));
//! assert_eq!(classifier.classify("We are organizing the materials"), None);
//! ```

pub mod classifier;
pub mod error;
pub mod platform;
pub mod tagger;
pub mod tier;
pub mod triggers;

pub use classifier::Classifier;
pub use error::{TriageError, TriageResult};
pub use platform::{HistoryApi, HistoryMessage, MarkerApi, MessageRef, TriagePlatform};
pub use tagger::{InboundMessage, TagOutcome, Tagger, is_eligible_event};
pub use tier::Tier;
pub use triggers::{DEFAULT_HISTORY_WINDOW, KeywordLists, TriageConfig, TriggerSet};
