//! Error types for the chat completions client.

use thiserror::Error;

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, OpenAIError>;

/// Chat completions client errors.
#[derive(Debug, Error)]
pub enum OpenAIError {
    /// Configuration error (missing API key, invalid settings)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network error (connection failed, timeout, broken stream)
    #[error("Network error: {0}")]
    Network(String),

    /// Non-2xx response from the endpoint
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Parse error (invalid JSON, unexpected response format)
    #[error("Parse error: {0}")]
    Parse(String),
}

impl OpenAIError {
    /// Short name of the variant, used in user-facing diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            OpenAIError::Config(_) => "OpenAIError::Config",
            OpenAIError::Network(_) => "OpenAIError::Network",
            OpenAIError::Api { .. } => "OpenAIError::Api",
            OpenAIError::Parse(_) => "OpenAIError::Parse",
        }
    }

    /// An API error with no HTTP status (empty choices and the like).
    pub(crate) fn empty_response() -> Self {
        OpenAIError::Api {
            status: 200,
            message: "No choices in response".into(),
        }
    }
}
