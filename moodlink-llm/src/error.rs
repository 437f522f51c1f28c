//! LLM error types.

use thiserror::Error;

/// Errors that can occur while talking to the dialogue service.
#[derive(Debug, Error)]
pub enum LlmError {
    /// HTTP request failed or returned a non-success status.
    #[error("LLM request failed: {0}")]
    RequestFailed(String),

    /// Response body was not the expected chat completion JSON.
    #[error("Failed to parse LLM response: {0}")]
    ParseError(String),

    /// Request timed out.
    #[error("LLM request timed out after {0}ms")]
    Timeout(u64),

    /// The service could not be reached or refused our credentials.
    #[error("LLM provider unavailable: {0}")]
    Unavailable(String),

    /// Credentials file missing, malformed or incomplete.
    #[error("Invalid credentials: {0}")]
    Credentials(String),

    /// The service answered with blank text.
    #[error("LLM returned an empty response")]
    EmptyResponse,

    /// Configuration error.
    #[error("LLM configuration error: {0}")]
    ConfigError(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout(0)
        } else if err.is_connect() {
            LlmError::Unavailable(err.to_string())
        } else if err.is_decode() {
            LlmError::ParseError(err.to_string())
        } else {
            LlmError::RequestFailed(err.to_string())
        }
    }
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, LlmError>;
