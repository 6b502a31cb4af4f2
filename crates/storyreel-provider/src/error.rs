//! Provider error types.

use std::time::Duration;

use thiserror::Error;

/// Result type for provider API operations.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Errors from talking to a remote generation provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Task submission failed: {0}")]
    SubmitFailed(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Auth token error: {0}")]
    Auth(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ProviderError {
    pub fn not_configured(msg: impl Into<String>) -> Self {
        Self::NotConfigured(msg.into())
    }

    pub fn submit_failed(msg: impl Into<String>) -> Self {
        Self::SubmitFailed(msg.into())
    }

    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    pub fn api(status: reqwest::StatusCode, body: impl Into<String>) -> Self {
        Self::Api {
            status: status.as_u16(),
            body: body.into(),
        }
    }

    /// Check if error is retryable: network failures, 429 and 5xx.
    pub fn is_retryable(&self) -> bool {
        match self {
            ProviderError::Network(_) => true,
            ProviderError::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// Errors that end a poll sequence without a terminal task state.
#[derive(Debug, Error)]
pub enum PollError {
    #[error("Task did not complete within {0:?}")]
    Timeout(Duration),

    #[error("{attempts} consecutive poll transport errors, last: {last_error}")]
    TransportExhausted {
        attempts: u32,
        #[source]
        last_error: ProviderError,
    },
}

/// Result type for artifact downloads.
pub type FetchResult<T> = Result<T, FetchError>;

/// Errors from downloading an artifact to local storage.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Download returned {status} for {url}")]
    Status { status: u16, url: String },

    #[error("Downloaded artifact is empty: {0}")]
    EmptyArtifact(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_429_and_5xx_are_retryable() {
        assert!(ProviderError::Api {
            status: 429,
            body: String::new()
        }
        .is_retryable());
        assert!(ProviderError::Api {
            status: 503,
            body: String::new()
        }
        .is_retryable());
    }

    #[test]
    fn test_other_4xx_not_retryable() {
        assert!(!ProviderError::Api {
            status: 400,
            body: String::new()
        }
        .is_retryable());
        assert!(!ProviderError::not_configured("missing key").is_retryable());
        assert!(!ProviderError::invalid_response("bad shape").is_retryable());
    }
}
