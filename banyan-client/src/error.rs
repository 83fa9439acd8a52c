//! Client error taxonomy

use thiserror::Error;

/// Errors returned by the Banyan API client
#[derive(Debug, Error)]
pub enum ClientError {
    /// The requested object does not exist (HTTP 404 or an empty lookup)
    #[error("{0} not found")]
    NotFound(String),

    /// The server rejected the request
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Refresh-token exchange failed or the token was rejected
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Transport-level failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body did not match the expected shape
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// Client misconfiguration (bad host URL, missing token)
    #[error("client configuration error: {0}")]
    Configuration(String),
}

impl ClientError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    /// True when the server reports the object as gone
    pub fn is_not_found(&self) -> bool {
        match self {
            ClientError::NotFound(_) => true,
            ClientError::Api { status, message } => {
                *status == 404 || message.to_lowercase().contains("not found")
            }
            _ => false,
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(e: serde_json::Error) -> Self {
        ClientError::Decode(e.to_string())
    }
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;
