use crate::error::HttpAppError;
use clipdock_core::models::{Video, VideoResponse};
use clipdock_storage::BlobStore;
use std::sync::Arc;
use std::time::Duration;

/// Turns stored blob locations into time-limited download URLs. Nothing
/// is persisted; every call signs afresh.
#[derive(Clone)]
pub struct SignedUrlResolver {
    blobs: Arc<dyn BlobStore>,
    ttl: Duration,
}

impl SignedUrlResolver {
    pub fn new(blobs: Arc<dyn BlobStore>, ttl: Duration) -> Self {
        Self { blobs, ttl }
    }

    pub async fn resolve(&self, video: Video) -> Result<VideoResponse, HttpAppError> {
        let video_url = match &video.video_location {
            Some(location) => Some(self.blobs.signed_url(location, self.ttl).await?),
            None => None,
        };
        Ok(VideoResponse::from_video(video, video_url))
    }

    /// Like [`resolve`](Self::resolve), but a signing failure yields a
    /// response without `video_url` instead of an error. Used after a write
    /// has already been committed.
    pub async fn resolve_or_unsigned(&self, video: Video) -> VideoResponse {
        let video_url = match &video.video_location {
            Some(location) => match self.blobs.signed_url(location, self.ttl).await {
                Ok(url) => Some(url),
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        video_id = %video.id,
                        location = %location,
                        "Failed to sign video URL; returning record without it"
                    );
                    None
                }
            },
            None => None,
        };
        VideoResponse::from_video(video, video_url)
    }
}
