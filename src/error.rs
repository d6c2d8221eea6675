//! Error types for the credit-card assistant

use thiserror::Error;

/// Result type alias for assistant operations
pub type Result<T> = std::result::Result<T, AssistantError>;

#[derive(Error, Debug)]
pub enum AssistantError {

    // =============================
    // Turn / Tool Errors
    // =============================

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("Invalid tool input: {0}")]
    InvalidToolInput(String),

    #[error("Tool error: {0}")]
    ToolError(String),

    #[error("Tool registration error: {0}")]
    RegistrationError(String),

    // =============================
    // Upstream Collaborators
    // =============================

    #[error("LLM error: {0}")]
    LlmError(String),

    /// Timeout or connect failure; eligible for the single retry.
    #[error("Upstream timed out: {0}")]
    UpstreamTimeout(String),

    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Mail delivery error: {0}")]
    MailError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    // =============================
    // External Library Conversions
    // =============================

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),
}

impl AssistantError {
    /// Whether the upstream call policy may retry this failure once.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AssistantError::UpstreamTimeout(_))
    }

    /// Classify a transport error from an upstream HTTP call.
    pub fn from_transport(upstream: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() {
            AssistantError::UpstreamTimeout(format!("{}: {}", upstream, err))
        } else {
            AssistantError::HttpError(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_timeouts_are_retryable() {
        assert!(AssistantError::UpstreamTimeout("gemini".into()).is_retryable());
        assert!(!AssistantError::UpstreamUnavailable("gemini".into()).is_retryable());
        assert!(!AssistantError::LlmError("bad json".into()).is_retryable());
    }

    #[test]
    fn test_display_includes_detail() {
        let err = AssistantError::ToolNotFound("GetWeather".into());
        assert_eq!(err.to_string(), "Tool not found: GetWeather");
    }
}
