//! Error types for the ingestion tracking core

use thiserror::Error;

/// Result type alias for ingestion operations
pub type Result<T> = std::result::Result<T, Error>;

/// Ingestion tracking errors
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Upload was requested with no files
    #[error("Upload rejected: no files provided")]
    EmptyUpload,

    /// The upload request itself failed (network/server); fatal for the submission
    #[error("Upload failed: {0}")]
    Submission(String),

    /// The backend does not (yet) know the batch id
    #[error("Batch not found: {0}")]
    BatchNotFound(String),

    /// Document not found
    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    /// Polling gave up after bounded retries or a wall-clock ceiling
    #[error("Tracking lost for batch {batch_id}: {reason}")]
    TrackingLost { batch_id: String, reason: String },

    /// HTTP request error
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a submission error
    pub fn submission(message: impl Into<String>) -> Self {
        Self::Submission(message.into())
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Whether this error is retryable during polling.
    ///
    /// A missing batch may simply not be durably recorded yet; any other
    /// fetch error is retried up to the configured bounds.
    pub fn is_transient(&self) -> bool {
        !matches!(self, Error::TrackingLost { .. } | Error::EmptyUpload)
    }
}
