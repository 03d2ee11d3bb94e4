//! Video ingest pipeline
//!
//! stage → inspect → normalize → upload → persist. The caller has already
//! authenticated the request, validated the content type and checked that
//! the record exists and belongs to the caller.

use crate::error::HttpAppError;
use crate::state::AppState;
use bytes::Bytes;
use clipdock_core::models::{BlobLocation, Video};
use clipdock_core::AppError;
use clipdock_processing::validator::VIDEO_MP4;
use clipdock_processing::UploadSession;
use clipdock_storage::StorageKey;
use futures::Stream;
use std::fmt::Display;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

pub struct VideoIngestService {
    state: Arc<AppState>,
}

impl VideoIngestService {
    pub fn new(state: &Arc<AppState>) -> Self {
        Self {
            state: state.clone(),
        }
    }

    /// Run the whole pipeline for `video`, whose upload starts with `head`
    /// and continues with `body`. Staging files are removed whatever the
    /// outcome.
    #[tracing::instrument(skip_all, fields(video_id = %video.id))]
    pub async fn ingest<S, E>(
        &self,
        video: Video,
        head: &[u8],
        body: S,
    ) -> Result<Video, HttpAppError>
    where
        S: Stream<Item = Result<Bytes, E>> + Unpin,
        E: Display,
    {
        let mut session = self.state.staging.begin();
        let result = self.run(&mut session, video, head, body).await;
        session.close();
        result
    }

    async fn run<S, E>(
        &self,
        session: &mut UploadSession,
        mut video: Video,
        head: &[u8],
        body: S,
    ) -> Result<Video, HttpAppError>
    where
        S: Stream<Item = Result<Bytes, E>> + Unpin,
        E: Display,
    {
        let start = Instant::now();
        let limit = self.state.config.max_video_size_bytes();

        let staged = session.stage_upload(head, body, limit).await?.to_path_buf();

        let probe = self.state.inspector.probe(&staged).await?;
        let orientation = probe.orientation()?;
        tracing::debug!(?orientation, "Video inspected");

        let sibling = session.reserve_sibling()?;
        self.state.normalizer.normalize(&staged, &sibling).await?;
        let ready = session.promote_sibling()?.to_path_buf();

        let key = StorageKey::generate(orientation)?;
        let location = BlobLocation::new(self.state.config.bucket(), key.into_string());
        let size_bytes = self.upload(&location, &ready).await?;

        video.video_location = Some(location.clone());
        let updated = match self.state.videos.update(&video).await {
            Ok(updated) => updated,
            Err(e) => {
                // The blob is already stored; it stays orphaned.
                tracing::error!(
                    error = %e,
                    blob = %location,
                    "Failed to record video location after upload"
                );
                return Err(e.into());
            }
        };

        tracing::info!(
            size_bytes = size_bytes,
            duration_ms = start.elapsed().as_millis(),
            "Video ingested"
        );
        Ok(updated)
    }

    async fn upload(&self, location: &BlobLocation, source: &Path) -> Result<u64, HttpAppError> {
        let timeout = self.state.config.upload_timeout();
        let size = tokio::time::timeout(
            timeout,
            self.state.blobs.put_file(location, source, VIDEO_MP4),
        )
        .await
        .map_err(|_| {
            AppError::Storage(format!(
                "Upload of {} timed out after {}s",
                location,
                timeout.as_secs()
            ))
        })??;
        Ok(size)
    }
}
