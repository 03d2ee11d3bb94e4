use crate::traits::{validate_key, BlobStore, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use clipdock_core::models::BlobLocation;
use http::Method;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::buffered::BufWriter;
use object_store::path::Path as ObjectPath;
use object_store::signer::Signer;
use object_store::{Attribute, AttributeValue, Attributes, ObjectStore, Result as ObjectResult};
use std::path::Path;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// S3 storage implementation bound to a single bucket
#[derive(Clone)]
pub struct S3Storage {
    store: Arc<AmazonS3>,
    bucket: String,
}

impl S3Storage {
    /// Create a new S3Storage instance
    ///
    /// # Arguments
    /// * `bucket` - S3 bucket name
    /// * `region` - AWS region (or region identifier for S3-compatible providers)
    /// * `endpoint_url` - Optional custom endpoint URL for S3-compatible providers
    ///   (e.g., "http://localhost:9000" for MinIO)
    pub fn new(bucket: String, region: String, endpoint_url: Option<String>) -> StorageResult<Self> {
        // Credentials come from the usual AWS_* environment variables.
        let mut builder = AmazonS3Builder::from_env()
            .with_region(region)
            .with_bucket_name(bucket.clone());

        if let Some(ref endpoint) = endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(allow_http);
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        Ok(S3Storage {
            store: Arc::new(store),
            bucket,
        })
    }

    fn object_path(&self, location: &BlobLocation) -> StorageResult<ObjectPath> {
        if location.bucket != self.bucket {
            return Err(StorageError::InvalidKey(format!(
                "bucket {} is not served by this store (expected {})",
                location.bucket, self.bucket
            )));
        }
        validate_key(&location.key)?;
        Ok(ObjectPath::from(location.key.as_str()))
    }
}

/// Owns an in-progress upload. If dropped before [`finish`](Self::finish)
/// (for example when the upload deadline cancels the request) the
/// multipart upload is aborted in the background so no parts are left
/// behind in the bucket.
struct AbortOnDrop {
    writer: Option<BufWriter>,
}

impl AbortOnDrop {
    fn new(writer: BufWriter) -> Self {
        Self {
            writer: Some(writer),
        }
    }

    /// Complete the upload and disarm the guard.
    async fn finish(mut self) -> std::io::Result<()> {
        match self.writer.take() {
            Some(mut writer) => writer.shutdown().await,
            None => Ok(()),
        }
    }

    async fn abort(mut self) {
        if let Some(mut writer) = self.writer.take() {
            if let Err(e) = writer.abort().await {
                tracing::warn!(error = %e, "Failed to abort S3 multipart upload");
            }
        }
    }
}

fn closed() -> std::io::Error {
    std::io::Error::other("upload already closed")
}

impl AsyncWrite for AbortOnDrop {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<std::io::Result<usize>> {
        match self.writer.as_mut() {
            Some(writer) => Pin::new(writer).poll_write(cx, buf),
            None => Poll::Ready(Err(closed())),
        }
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        match self.writer.as_mut() {
            Some(writer) => Pin::new(writer).poll_flush(cx),
            None => Poll::Ready(Err(closed())),
        }
    }

    fn poll_shutdown(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<std::io::Result<()>> {
        match self.writer.as_mut() {
            Some(writer) => Pin::new(writer).poll_shutdown(cx),
            None => Poll::Ready(Err(closed())),
        }
    }
}

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        let Some(mut writer) = self.writer.take() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = writer.abort().await {
                        tracing::warn!(error = %e, "Failed to abort cancelled S3 upload");
                    }
                });
            }
            Err(_) => tracing::warn!("Cancelled S3 upload dropped outside a runtime"),
        }
    }
}

#[async_trait]
impl BlobStore for S3Storage {
    async fn put_file(
        &self,
        location: &BlobLocation,
        source: &Path,
        content_type: &str,
    ) -> StorageResult<u64> {
        let path = self.object_path(location)?;
        let start = std::time::Instant::now();

        let mut file = tokio::fs::File::open(source).await?;
        let attributes = Attributes::from_iter([(
            Attribute::ContentType,
            AttributeValue::from(content_type.to_string()),
        )]);
        let store: Arc<dyn ObjectStore> = self.store.clone();
        let mut upload =
            AbortOnDrop::new(BufWriter::new(store, path).with_attributes(attributes));

        let written = match tokio::io::copy(&mut file, &mut upload).await {
            Ok(n) => n,
            Err(e) => {
                upload.abort().await;
                tracing::error!(
                    error = %e,
                    bucket = %self.bucket,
                    key = %location.key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 upload failed"
                );
                return Err(StorageError::UploadFailed(e.to_string()));
            }
        };

        upload.finish().await.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %self.bucket,
                key = %location.key,
                size_bytes = written,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "S3 upload failed to complete"
            );
            StorageError::UploadFailed(e.to_string())
        })?;

        tracing::info!(
            bucket = %self.bucket,
            key = %location.key,
            size_bytes = written,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 upload successful"
        );

        Ok(written)
    }

    async fn signed_url(
        &self,
        location: &BlobLocation,
        expires_in: Duration,
    ) -> StorageResult<String> {
        let path = self.object_path(location)?;
        let url_result: ObjectResult<_> = self
            .store
            .signed_url(Method::GET, &path, expires_in)
            .await;

        let url = url_result
            .map_err(|e| StorageError::BackendError(e.to_string()))?
            .to_string();

        Ok(url)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}
