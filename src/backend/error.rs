//! Browse error types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BrowseError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {0}")]
    Decode(String),

    #[error("Browse session not found: {0}")]
    SessionNotFound(String),

    #[error("Invalid API base URL: {0}")]
    InvalidBaseUrl(String),

    #[error("Invalid exclusion pattern: {0}")]
    InvalidPattern(String),

    #[error("Browser closed")]
    Closed,
}

impl BrowseError {
    /// Message shown inline in the browsing panel.
    pub fn user_message(&self) -> String {
        match self {
            BrowseError::Api { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

impl From<reqwest::Error> for BrowseError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            BrowseError::Timeout(err.to_string())
        } else if err.is_decode() {
            BrowseError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            BrowseError::Api {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            BrowseError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for BrowseError {
    fn from(err: serde_json::Error) -> Self {
        BrowseError::Decode(err.to_string())
    }
}

// Hosts forward listing errors to a UI as plain strings
impl serde::Serialize for BrowseError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
