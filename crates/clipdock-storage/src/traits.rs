//! Blob storage abstraction
//!
//! This module defines the `BlobStore` trait that all storage backends implement.

use crate::StorageBackend;
use async_trait::async_trait;
use clipdock_core::models::BlobLocation;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Invalid or expired signature")]
    InvalidSignature,

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Entropy source unavailable: {0}")]
    Entropy(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Durable store for uploaded video blobs.
///
/// Callers address objects by `(bucket, key)`; nothing here persists URLs.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Stream the file at `source` into the store under `location`, tagging it
    /// with `content_type`. Returns the number of bytes written.
    async fn put_file(
        &self,
        location: &BlobLocation,
        source: &Path,
        content_type: &str,
    ) -> StorageResult<u64>;

    /// Mint a time-limited GET URL for `location`.
    async fn signed_url(
        &self,
        location: &BlobLocation,
        expires_in: Duration,
    ) -> StorageResult<String>;

    fn backend_type(&self) -> StorageBackend;
}

/// Reject keys that could escape a bucket namespace.
pub(crate) fn validate_key(key: &str) -> StorageResult<()> {
    if key.is_empty() || key.contains("..") || key.starts_with('/') || key.contains('\\') {
        return Err(StorageError::InvalidKey(
            "Storage key contains invalid characters".to_string(),
        ));
    }
    Ok(())
}
