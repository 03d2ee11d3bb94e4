//! Thumbnail storage in the public assets directory.

use crate::error::HttpAppError;
use crate::state::AppState;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use clipdock_core::models::Video;
use clipdock_core::AppError;
use clipdock_processing::validator::image_extension;
use rand::rngs::OsRng;
use rand::TryRngCore;
use std::path::Path;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;

const NAME_ENTROPY_BYTES: usize = 32;

/// Random file name for an asset, `<base64url of 32 bytes>.<ext>`.
pub fn asset_file_name(extension: &str) -> Result<String, AppError> {
    let mut bytes = [0u8; NAME_ENTROPY_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| AppError::Internal(format!("OS random source unavailable: {}", e)))?;
    Ok(format!("{}.{}", URL_SAFE_NO_PAD.encode(bytes), extension))
}

pub struct ThumbnailService {
    state: Arc<AppState>,
}

impl ThumbnailService {
    pub fn new(state: &Arc<AppState>) -> Self {
        Self {
            state: state.clone(),
        }
    }

    /// Write `data` to a fresh asset file and point `video` at it. The file
    /// is removed again if the record cannot be updated.
    #[tracing::instrument(skip_all, fields(video_id = %video.id, size_bytes = data.len()))]
    pub async fn store(
        &self,
        mut video: Video,
        content_type: &str,
        data: &[u8],
    ) -> Result<Video, HttpAppError> {
        let extension = image_extension(content_type).ok_or_else(|| {
            AppError::BadRequest(format!("Unsupported thumbnail type: {}", content_type))
        })?;
        let name = asset_file_name(extension)?;
        let path = self.state.config.assets_root().join(&name);

        write_new(&path, data).await?;

        video.thumbnail_url = Some(self.state.config.asset_url(&name));
        match self.state.videos.update(&video).await {
            Ok(updated) => {
                tracing::info!(asset = %name, "Thumbnail stored");
                Ok(updated)
            }
            Err(e) => {
                if let Err(remove_err) = tokio::fs::remove_file(&path).await {
                    tracing::warn!(
                        error = %remove_err,
                        path = %path.display(),
                        "Failed to remove thumbnail after update failure"
                    );
                }
                Err(e.into())
            }
        }
    }
}

async fn write_new(path: &Path, data: &[u8]) -> Result<(), AppError> {
    let mut file = tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await?;
    if let Err(e) = file.write_all(data).await {
        drop(file);
        let _ = tokio::fs::remove_file(path).await;
        return Err(e.into());
    }
    file.flush().await?;
    Ok(())
}
