//! Error types for orchestration, notification and monitoring.

use design_review_core::ReviewError;
use thiserror::Error;

/// Errors produced by the orchestration layer.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// The orchestration config failed validation.
    #[error("invalid orchestration config: {0}")]
    InvalidConfig(String),

    /// A notification sink could not deliver.
    #[error("notification via {channel} failed: {reason}")]
    Notification { channel: String, reason: String },

    #[error("scheduler error: {0}")]
    Scheduler(String),

    /// Bubbled-up review or bridge error.
    #[error(transparent)]
    Review(#[from] ReviewError),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl OrchestratorError {
    pub fn notification(channel: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Notification {
            channel: channel.into(),
            reason: reason.into(),
        }
    }
}

/// Convenience result alias.
pub type OrchestratorResult<T> = std::result::Result<T, OrchestratorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_error_names_channel() {
        let err = OrchestratorError::notification("slack", "HTTP 500");
        assert_eq!(err.to_string(), "notification via slack failed: HTTP 500");
    }

    #[test]
    fn test_review_error_is_transparent() {
        let err: OrchestratorError = ReviewError::DesignTool("unknown node 1:2".to_string()).into();
        assert_eq!(err.to_string(), "design tool error: unknown node 1:2");
    }
}
