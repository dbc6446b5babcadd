//! Transcode engine trait
//!
//! The engine accepts a stored-object reference and returns an opaque job
//! handle. Completion and failure arrive later as asynchronous notifications
//! keyed by that handle; this crate only covers submission.

use async_trait::async_trait;
use thiserror::Error;

/// Transcode submission errors
#[derive(Debug, Error)]
pub enum TranscodeError {
    #[error("Submit failed: {0}")]
    SubmitFailed(String),

    #[error("Engine returned malformed response: {0}")]
    MalformedResponse(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for transcode operations
pub type TranscodeResult<T> = Result<T, TranscodeError>;

/// Transcode capability contract.
#[async_trait]
pub trait TranscodeEngine: Send + Sync {
    /// Submit a transcode job for a stored object.
    ///
    /// Returns the engine's opaque job id, used to correlate the eventual
    /// completion/failure notification back to the job record.
    async fn submit(&self, input_ref: &str) -> TranscodeResult<String>;
}
