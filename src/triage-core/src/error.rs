//! Error types for triage operations.

use thiserror::Error;

/// Errors produced while classifying or tagging messages.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TriageError {
    /// No message from the user qualified for manual tagging.
    #[error("No eligible message from {user} in {channel} within the last {window} messages")]
    NoEligibleMessage {
        /// Channel that was searched.
        channel: String,
        /// User whose message was looked for.
        user: String,
        /// Number of recent messages inspected.
        window: usize,
    },

    /// The platform reported the marker already present (add) or absent (remove).
    #[error("Marker conflict: {0}")]
    MarkerConflict(String),

    /// The platform call itself failed.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl TriageError {
    /// Whether the user should see an explanation rather than a generic failure.
    pub fn is_user_facing(&self) -> bool {
        matches!(self, TriageError::NoEligibleMessage { .. })
    }
}

/// Result type for triage operations.
pub type TriageResult<T> = std::result::Result<T, TriageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TriageError::NoEligibleMessage {
            channel: "C123".to_string(),
            user: "U456".to_string(),
            window: 10,
        };
        assert_eq!(
            err.to_string(),
            "No eligible message from U456 in C123 within the last 10 messages"
        );

        let err = TriageError::Transport("connection reset".to_string());
        assert_eq!(err.to_string(), "Transport error: connection reset");
    }

    #[test]
    fn test_user_facing() {
        let err = TriageError::NoEligibleMessage {
            channel: "C1".to_string(),
            user: "U1".to_string(),
            window: 10,
        };
        assert!(err.is_user_facing());
        assert!(!TriageError::Transport("x".to_string()).is_user_facing());
    }
}
