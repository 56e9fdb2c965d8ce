use thiserror::Error;

/// Failure talking to the data backend. Never retried by the core.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Invalid backend URL: {0}")]
    InvalidBaseUrl(#[from] url::ParseError),
    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("HTTP error! status: {status} ({url})")]
    Status { status: u16, url: String },
    #[error("Failed to read response body from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Unexpected payload from {url}: {source}")]
    InvalidPayload {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

impl SourceError {
    /// HTTP status for non-success responses.
    pub fn status(&self) -> Option<u16> {
        match self {
            SourceError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
