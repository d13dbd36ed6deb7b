//! Object store abstraction for document downloads.

use async_trait::async_trait;
use thiserror::Error;

/// Error type for object store operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Object storage is not configured: {0}")]
    NotConfigured(String),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Object storage error: {0}")]
    Upstream(String),
}

/// Hosted blob storage.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Returns a URL granting read access to `path` for `expires_in_secs`.
    async fn create_signed_url(
        &self,
        bucket: &str,
        path: &str,
        expires_in_secs: u64,
    ) -> Result<String, StorageError>;
}
