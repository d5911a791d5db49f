//! Error taxonomy for design reviews.

/// Errors produced by bridges, checkers and report artifacts.
#[derive(Debug, thiserror::Error)]
pub enum ReviewError {
    #[error("bridge error calling {tool}: {reason}")]
    Bridge { tool: String, reason: String },

    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("capture error: {0}")]
    Capture(String),

    #[error("design tool error: {0}")]
    DesignTool(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("digest mismatch: expected {expected}, got {actual}")]
    DigestMismatch { expected: String, actual: String },

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ReviewError {
    pub fn bridge(tool: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Bridge {
            tool: tool.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for design review operations.
pub type Result<T> = std::result::Result<T, ReviewError>;
