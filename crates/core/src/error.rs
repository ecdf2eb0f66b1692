use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmbedError {
    #[error("embedding provider error: {0}")]
    Provider(String),

    #[error("embedding provider rate limited: {0}")]
    RateLimited(String),

    #[error("embedding request timed out after {0:?}")]
    Timeout(Duration),
}

impl EmbedError {
    /// Retry with backoff is only appropriate for transient provider
    /// failures; everything else surfaces immediately.
    pub fn is_retryable(&self) -> bool {
        matches!(self, EmbedError::RateLimited(_) | EmbedError::Timeout(_))
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("vector dimension mismatch for {id}: got {actual}, store holds {expected}")]
    Dimension {
        id: String,
        expected: usize,
        actual: usize,
    },

    #[error("invalid response from {backend}: {details}")]
    Backend { backend: String, details: String },

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("serialize error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("invalid config: {0}")]
    Config(String),

    #[error("extraction failed for {src}: {reason}")]
    Extraction { src: String, reason: String },

    #[error("pdf download failed for {url}: {reason}")]
    Download { url: String, reason: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("path has no file name: {0}")]
    MissingFileName(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Embed(#[from] EmbedError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("invalid config: {0}")]
    Config(String),

    #[error(transparent)]
    Embed(#[from] EmbedError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type Result<T, E = IngestError> = std::result::Result<T, E>;
