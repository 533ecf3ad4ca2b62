//! Error types for the assistant proxy

/// Message shown to the user when the provider reports an exhausted quota
pub const QUOTA_EXHAUSTED_MESSAGE: &str = "Your free AI quota is exhausted.";

/// Assistant errors
#[derive(Debug, thiserror::Error)]
pub enum AssistantError {
    /// No provider API key configured
    #[error("Missing API key")]
    MissingApiKey,

    /// Request rejected before reaching the provider
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Transport failure (connect, timeout, body read)
    #[error("http error: {0}")]
    Http(String),

    /// Provider returned HTTP 402
    #[error("Your free AI quota is exhausted.")]
    QuotaExhausted,

    /// Provider returned any other non-success status
    #[error("provider error ({status}): {message}")]
    Provider { status: u16, message: String },

    /// Provider body was not valid JSON
    #[error("malformed provider response: {0}")]
    MalformedResponse(String),

    /// Provider answered without any message content
    #[error("AI did not return a response.")]
    EmptyResponse,
}

impl AssistantError {
    /// Map a non-success provider status
    #[must_use]
    pub fn from_status(status: u16, body: &str) -> Self {
        if status == 402 {
            return Self::QuotaExhausted;
        }
        Self::Provider {
            status,
            message: body.to_string(),
        }
    }

    /// Text to show in the chat in place of an answer
    #[must_use]
    pub fn chat_message(&self) -> String {
        match self {
            Self::QuotaExhausted | Self::EmptyResponse => self.to_string(),
            Self::Provider { status, .. } => format!("Error {status}"),
            _ => "Failed to get response. Please try again later.".to_string(),
        }
    }
}

impl From<reqwest::Error> for AssistantError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e.to_string())
    }
}
