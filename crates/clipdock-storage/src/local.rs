use crate::traits::{validate_key, BlobStore, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use clipdock_core::models::BlobLocation;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::fs;

type HmacSha256 = Hmac<Sha256>;

/// Local filesystem storage for development.
///
/// Objects live at `<base_path>/<bucket>/<key>`. Signed URLs point at
/// `<base_url>/<bucket>/<key>` and carry an expiry plus an HMAC-SHA256
/// signature over `bucket/key` and that expiry.
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
    signing_key: Vec<u8>,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for blob storage (e.g., "/var/lib/clipdock/blobs")
    /// * `base_url` - Base URL the blob route is mounted at (e.g., "http://localhost:8091/blobs")
    /// * `signing_key` - Secret used to sign and verify URLs
    pub async fn new(
        base_path: impl Into<PathBuf>,
        base_url: String,
        signing_key: impl Into<Vec<u8>>,
    ) -> StorageResult<Self> {
        let base_path = base_path.into();
        let signing_key = signing_key.into();

        if signing_key.is_empty() {
            return Err(StorageError::ConfigError(
                "URL signing key must not be empty".to_string(),
            ));
        }

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage {
            base_path,
            base_url,
            signing_key,
        })
    }

    fn location_to_path(&self, location: &BlobLocation) -> StorageResult<PathBuf> {
        validate_key(&location.bucket)?;
        if location.bucket.contains('/') {
            return Err(StorageError::InvalidKey(
                "Bucket name must not contain '/'".to_string(),
            ));
        }
        validate_key(&location.key)?;
        Ok(self.base_path.join(&location.bucket).join(&location.key))
    }

    fn mac(&self, location: &BlobLocation, expires: u64) -> StorageResult<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(&self.signing_key)
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;
        mac.update(location.bucket.as_bytes());
        mac.update(b"/");
        mac.update(location.key.as_bytes());
        mac.update(b"\n");
        mac.update(&expires.to_be_bytes());
        Ok(mac)
    }

    /// Build a signed URL that stops verifying after `expires` (unix seconds).
    pub fn sign_until(&self, location: &BlobLocation, expires: u64) -> StorageResult<String> {
        validate_key(&location.key)?;
        let signature = hex::encode(self.mac(location, expires)?.finalize().into_bytes());
        Ok(format!(
            "{}/{}/{}?expires={}&signature={}",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(&location.bucket),
            location.key,
            expires,
            signature
        ))
    }

    /// Check a signature at time `now` (unix seconds).
    pub fn verify(
        &self,
        location: &BlobLocation,
        expires: u64,
        signature: &str,
        now: u64,
    ) -> StorageResult<()> {
        if now > expires {
            return Err(StorageError::InvalidSignature);
        }
        let tag = hex::decode(signature).map_err(|_| StorageError::InvalidSignature)?;
        self.mac(location, expires)?
            .verify_slice(&tag)
            .map_err(|_| StorageError::InvalidSignature)
    }

    /// Verify a full URL previously produced by [`LocalStorage::sign_until`].
    pub fn verify_url(&self, url: &str, now: u64) -> StorageResult<BlobLocation> {
        let base = self.base_url.trim_end_matches('/');
        let rest = url
            .strip_prefix(base)
            .and_then(|r| r.strip_prefix('/'))
            .ok_or(StorageError::InvalidSignature)?;
        let (path, query) = rest.split_once('?').ok_or(StorageError::InvalidSignature)?;
        let (bucket, key) = path.split_once('/').ok_or(StorageError::InvalidSignature)?;
        let bucket = urlencoding::decode(bucket)
            .map_err(|_| StorageError::InvalidSignature)?
            .into_owned();

        let mut expires = None;
        let mut signature = None;
        for pair in query.split('&') {
            match pair.split_once('=') {
                Some(("expires", v)) => expires = v.parse::<u64>().ok(),
                Some(("signature", v)) => signature = Some(v),
                _ => {}
            }
        }
        let (expires, signature) = expires.zip(signature).ok_or(StorageError::InvalidSignature)?;

        let location = BlobLocation::new(bucket, key);
        self.verify(&location, expires, signature, now)?;
        Ok(location)
    }

    /// Filesystem path of a stored blob, if it exists.
    pub async fn resolve(&self, location: &BlobLocation) -> StorageResult<PathBuf> {
        let path = self.location_to_path(location)?;
        if !fs::try_exists(&path).await? {
            return Err(StorageError::NotFound(location.to_string()));
        }
        Ok(path)
    }

    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[async_trait]
impl BlobStore for LocalStorage {
    async fn put_file(
        &self,
        location: &BlobLocation,
        source: &Path,
        _content_type: &str,
    ) -> StorageResult<u64> {
        let path = self.location_to_path(location)?;
        self.ensure_parent_dir(&path).await?;

        let start = std::time::Instant::now();
        // Copy next to the target and rename so readers never see a partial blob.
        let partial = path.with_extension("mp4.part");
        let written = match fs::copy(source, &partial).await {
            Ok(n) => n,
            Err(e) => {
                let _ = fs::remove_file(&partial).await;
                return Err(StorageError::UploadFailed(format!(
                    "Failed to write {}: {}",
                    path.display(),
                    e
                )));
            }
        };
        if let Err(e) = fs::rename(&partial, &path).await {
            let _ = fs::remove_file(&partial).await;
            return Err(StorageError::UploadFailed(format!(
                "Failed to finalize {}: {}",
                path.display(),
                e
            )));
        }

        tracing::info!(
            bucket = %location.bucket,
            key = %location.key,
            size_bytes = written,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local upload successful"
        );

        Ok(written)
    }

    async fn signed_url(
        &self,
        location: &BlobLocation,
        expires_in: Duration,
    ) -> StorageResult<String> {
        self.sign_until(location, unix_now().saturating_add(expires_in.as_secs()))
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}
