#[cfg(feature = "storage-local")]
use crate::LocalStorage;
#[cfg(feature = "storage-s3")]
use crate::S3Storage;
use crate::{BlobStore, StorageBackend, StorageError, StorageResult};
use clipdock_core::Config;
use std::sync::Arc;

/// The configured blob store plus, for the local backend, the concrete
/// handle the blob-serving route needs to verify signatures.
#[derive(Clone)]
pub struct BlobStores {
    pub store: Arc<dyn BlobStore>,
    #[cfg(feature = "storage-local")]
    pub local: Option<Arc<LocalStorage>>,
}

/// Create a blob store based on configuration
pub async fn create_blob_store(config: &Config) -> StorageResult<BlobStores> {
    match config.storage_backend() {
        #[cfg(feature = "storage-s3")]
        StorageBackend::S3 => {
            let region = config.media.s3_region.clone().ok_or_else(|| {
                StorageError::ConfigError("S3_REGION or AWS_REGION not configured".to_string())
            })?;
            let storage = S3Storage::new(
                config.bucket().to_string(),
                region,
                config.media.s3_endpoint.clone(),
            )?;
            Ok(BlobStores {
                store: Arc::new(storage),
                #[cfg(feature = "storage-local")]
                local: None,
            })
        }

        #[cfg(not(feature = "storage-s3"))]
        StorageBackend::S3 => Err(StorageError::ConfigError(
            "S3 storage backend not available (storage-s3 feature not enabled)".to_string(),
        )),

        #[cfg(feature = "storage-local")]
        StorageBackend::Local => {
            let base_path = config.media.local_storage_path.clone().ok_or_else(|| {
                StorageError::ConfigError("LOCAL_STORAGE_PATH not configured".to_string())
            })?;
            let base_url = config.media.local_storage_base_url.clone().ok_or_else(|| {
                StorageError::ConfigError("LOCAL_STORAGE_BASE_URL not configured".to_string())
            })?;

            let storage = Arc::new(
                LocalStorage::new(
                    base_path,
                    base_url,
                    config.media.url_signing_secret.as_bytes(),
                )
                .await?,
            );
            Ok(BlobStores {
                store: storage.clone(),
                local: Some(storage),
            })
        }

        #[cfg(not(feature = "storage-local"))]
        StorageBackend::Local => Err(StorageError::ConfigError(
            "Local storage backend not available (storage-local feature not enabled)".to_string(),
        )),
    }
}
