//! Error types for the GitHub issues client

use compact_str::CompactString;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    /// No response was obtained (connect, timeout, body read)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// GitHub rejected the credential
    #[error("GitHub API authentication failed: {message}. Please check your token")]
    Authentication { message: CompactString },

    /// Any other non-success status
    #[error("GitHub API returned status {status}: {message}")]
    Status { status: u16, message: CompactString },

    #[error("JSON parse error from {endpoint}: {message}")]
    JsonParse {
        endpoint: CompactString,
        message: CompactString,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid configuration: {field}: {message}")]
    ConfigValidation { field: CompactString, message: CompactString },

    #[error("Cancelled while waiting for a rate limit token")]
    RateLimitCancelled,

    #[error("Request cancelled")]
    Cancelled,

    #[error("Fetching issues failed after {attempts} attempts")]
    FetchExhausted {
        attempts: u32,
        #[source]
        last: Box<ClientError>,
    },
}

impl ClientError {
    pub fn authentication(message: impl Into<CompactString>) -> Self {
        Self::Authentication { message: message.into() }
    }

    pub fn status(status: u16, message: impl Into<CompactString>) -> Self {
        Self::Status { status, message: message.into() }
    }

    pub fn json_parse(
        endpoint: impl Into<CompactString>,
        message: impl Into<CompactString>,
        source: serde_json::Error,
    ) -> Self {
        Self::JsonParse { endpoint: endpoint.into(), message: message.into(), source }
    }

    pub fn config_validation(
        field: impl Into<CompactString>,
        message: impl Into<CompactString>,
    ) -> Self {
        Self::ConfigValidation { field: field.into(), message: message.into() }
    }

    /// Whether another attempt may succeed where this one failed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ClientError::Http(_) | ClientError::Status { .. })
    }
}
