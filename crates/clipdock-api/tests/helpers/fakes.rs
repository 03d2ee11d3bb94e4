//! In-process stand-ins for the database, ffprobe, ffmpeg and S3.

use async_trait::async_trait;
use clipdock_core::models::{BlobLocation, Video};
use clipdock_core::{AppError, StorageBackend};
use clipdock_db::VideoRepository;
use clipdock_processing::normalize::ensure_output;
use clipdock_processing::{MediaInspector, MediaNormalizer, MediaProbe, ProbeStream, ProcessingError};
use clipdock_storage::{BlobStore, StorageError, StorageResult};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use uuid::Uuid;

#[derive(Default)]
pub struct InMemoryVideoRepository {
    videos: Mutex<HashMap<Uuid, Video>>,
    fail_updates: AtomicBool,
    pub update_calls: AtomicUsize,
}

impl InMemoryVideoRepository {
    pub fn insert(&self, video: Video) {
        self.videos.lock().unwrap().insert(video.id, video);
    }

    pub fn snapshot(&self, id: Uuid) -> Option<Video> {
        self.videos.lock().unwrap().get(&id).cloned()
    }

    pub fn fail_updates(&self, fail: bool) {
        self.fail_updates.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl VideoRepository for InMemoryVideoRepository {
    async fn create(&self, video: &Video) -> Result<Video, AppError> {
        self.insert(video.clone());
        Ok(video.clone())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Video>, AppError> {
        Ok(self.snapshot(id))
    }

    async fn update(&self, video: &Video) -> Result<Video, AppError> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(AppError::Internal("simulated database outage".to_string()));
        }
        let mut videos = self.videos.lock().unwrap();
        let stored = videos
            .get_mut(&video.id)
            .ok_or_else(|| AppError::NotFound(format!("Video {} not found", video.id)))?;
        *stored = video.clone();
        stored.updated_at = chrono::Utc::now();
        Ok(stored.clone())
    }
}

/// What the fake ffprobe reports.
#[derive(Debug, Clone, Copy)]
pub enum ProbeScript {
    Dimensions(u32, u32),
    NoStreams,
    Fail,
}

pub struct FakeInspector {
    script: ProbeScript,
    pub calls: AtomicUsize,
}

impl FakeInspector {
    pub fn new(script: ProbeScript) -> Self {
        Self {
            script,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl MediaInspector for FakeInspector {
    async fn probe(&self, path: &Path) -> Result<MediaProbe, ProcessingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        assert!(path.exists(), "probe called without a staged file");
        match self.script {
            ProbeScript::Dimensions(width, height) => Ok(MediaProbe {
                streams: vec![ProbeStream {
                    index: 0,
                    codec_type: Some("video".to_string()),
                    codec_name: Some("h264".to_string()),
                    width: Some(width),
                    height: Some(height),
                }],
            }),
            ProbeScript::NoStreams => Ok(MediaProbe::default()),
            ProbeScript::Fail => Err(ProcessingError::MalformedOutput(
                "simulated ffprobe failure".to_string(),
            )),
        }
    }
}

/// What the fake ffmpeg does.
#[derive(Debug, Clone, Copy)]
pub enum NormalizeScript {
    /// Copy input to output, tagging the result so tests can tell it was remuxed.
    Remux,
    Fail,
    /// Exit "successfully" but leave an empty output file.
    EmptyOutput,
}

pub const REMUX_MARKER: &[u8] = b"faststart";

pub struct FakeNormalizer {
    script: NormalizeScript,
    pub calls: AtomicUsize,
}

impl FakeNormalizer {
    pub fn new(script: NormalizeScript) -> Self {
        Self {
            script,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl MediaNormalizer for FakeNormalizer {
    async fn normalize(&self, input: &Path, output: &Path) -> Result<(), ProcessingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.script {
            NormalizeScript::Remux => {
                let mut data = tokio::fs::read(input).await?;
                data.extend_from_slice(REMUX_MARKER);
                tokio::fs::write(output, data).await?;
                ensure_output(output).await
            }
            NormalizeScript::Fail => Err(ProcessingError::Io(std::io::Error::other(
                "simulated ffmpeg crash",
            ))),
            NormalizeScript::EmptyOutput => {
                tokio::fs::write(output, b"").await?;
                ensure_output(output).await
            }
        }
    }
}

/// Blob store whose uploads always fail, optionally after a delay.
pub struct FailingBlobStore {
    pub delay: Option<Duration>,
    pub calls: AtomicUsize,
}

impl FailingBlobStore {
    pub fn new(delay: Option<Duration>) -> Self {
        Self {
            delay,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl BlobStore for FailingBlobStore {
    async fn put_file(
        &self,
        _location: &BlobLocation,
        _source: &Path,
        _content_type: &str,
    ) -> StorageResult<u64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Err(StorageError::UploadFailed("simulated S3 outage".to_string()))
    }

    async fn signed_url(&self, location: &BlobLocation, _ttl: Duration) -> StorageResult<String> {
        Err(StorageError::NotFound(location.to_string()))
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}
