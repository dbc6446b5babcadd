//! Storage abstraction trait
//!
//! This module defines the UploadStorage trait that storage backends must
//! implement to act as the upload capability.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Presign failed: {0}")]
    PresignFailed(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Upload capability contract.
///
/// A backend produces a write-once upload target for a storage key the
/// caller has already generated with [crate::keys::generate_input_key].
/// The key embeds the job id; the backend treats it as opaque.
#[async_trait]
pub trait UploadStorage: Send + Sync {
    /// Generate a presigned PUT URL for a direct client upload.
    ///
    /// Clients upload with HTTP PUT to the returned URL until `expires_in`
    /// elapses.
    async fn presigned_put_url(
        &self,
        storage_key: &str,
        expires_in: Duration,
    ) -> StorageResult<String>;
}
