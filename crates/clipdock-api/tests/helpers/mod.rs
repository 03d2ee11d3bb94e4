//! Test helpers: build AppState and router for integration tests.
//!
//! The record store, ffprobe and ffmpeg are replaced with in-process fakes;
//! blobs go to a `LocalStorage` in a temp dir unless a failing store is
//! requested.
#![allow(dead_code)]

pub mod auth;
pub mod fakes;
pub mod fixtures;

use axum_test::TestServer;
use clipdock_api::constants;
use clipdock_api::setup::routes;
use clipdock_api::state::AppState;
use clipdock_core::models::{BlobLocation, Video};
use clipdock_core::{BaseConfig, Config, MediaConfig, StorageBackend};
use clipdock_processing::StagingArea;
use clipdock_storage::{BlobStore, LocalStorage};
use fakes::{
    FailingBlobStore, FakeInspector, FakeNormalizer, InMemoryVideoRepository, NormalizeScript,
    ProbeScript,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use uuid::Uuid;

pub const TEST_BUCKET: &str = "clipdock-test";
pub const TEST_PORT: u16 = 8091;
pub const BLOB_BASE_URL: &str = "http://localhost:8091/blobs";
pub const URL_SIGNING_SECRET: &str = "url-signing-secret-for-tests-only";

/// API path prefix for tests (e.g. `/api`).
pub fn api_path(path: &str) -> String {
    format!("{}{}", constants::API_PREFIX, path)
}

pub struct TestAppBuilder {
    probe: ProbeScript,
    normalize: NormalizeScript,
    failing_blobs: Option<Option<Duration>>,
    max_video_size_bytes: u64,
    max_thumbnail_size_bytes: u64,
    upload_timeout_secs: u64,
    environment: String,
}

impl Default for TestAppBuilder {
    fn default() -> Self {
        Self {
            probe: ProbeScript::Dimensions(1280, 720),
            normalize: NormalizeScript::Remux,
            failing_blobs: None,
            max_video_size_bytes: 1024 * 1024,
            max_thumbnail_size_bytes: 64 * 1024,
            upload_timeout_secs: 30,
            environment: "test".to_string(),
        }
    }
}

impl TestAppBuilder {
    pub fn probe(mut self, probe: ProbeScript) -> Self {
        self.probe = probe;
        self
    }

    pub fn normalize(mut self, normalize: NormalizeScript) -> Self {
        self.normalize = normalize;
        self
    }

    /// Replace blob storage with a store whose uploads fail.
    pub fn failing_blobs(mut self, delay: Option<Duration>) -> Self {
        self.failing_blobs = Some(delay);
        self
    }

    pub fn max_video_size_bytes(mut self, limit: u64) -> Self {
        self.max_video_size_bytes = limit;
        self
    }

    pub fn max_thumbnail_size_bytes(mut self, limit: u64) -> Self {
        self.max_thumbnail_size_bytes = limit;
        self
    }

    pub fn upload_timeout_secs(mut self, secs: u64) -> Self {
        self.upload_timeout_secs = secs;
        self
    }

    pub fn environment(mut self, environment: &str) -> Self {
        self.environment = environment.to_string();
        self
    }

    pub async fn build(self) -> TestApp {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let staging_dir = temp_dir.path().join("staging");
        let assets_dir = temp_dir.path().join("assets");
        let blobs_dir = temp_dir.path().join("blobs");
        std::fs::create_dir_all(&assets_dir).unwrap();

        let cors_origins = if self.environment == "production" {
            vec!["http://localhost:3000".to_string()]
        } else {
            vec!["*".to_string()]
        };

        let config = Config {
            base: BaseConfig {
                server_port: TEST_PORT,
                public_host: "localhost".to_string(),
                cors_origins,
                environment: self.environment,
                jwt_secret: auth::TEST_JWT_SECRET.to_string(),
                jwt_issuer: auth::TEST_JWT_ISSUER.to_string(),
                database_url: "postgresql://unused@localhost/unused".to_string(),
                db_max_connections: 1,
                db_timeout_seconds: 1,
                http_concurrency_limit: 64,
                log_format: "compact".to_string(),
                log_filter: "clipdock=debug".to_string(),
            },
            media: MediaConfig {
                storage_backend: StorageBackend::Local,
                s3_bucket: TEST_BUCKET.to_string(),
                s3_region: None,
                s3_endpoint: None,
                local_storage_path: Some(blobs_dir.to_string_lossy().to_string()),
                local_storage_base_url: Some(BLOB_BASE_URL.to_string()),
                url_signing_secret: URL_SIGNING_SECRET.to_string(),
                staging_dir: staging_dir.clone(),
                assets_root: assets_dir.clone(),
                ffprobe_path: "ffprobe".to_string(),
                ffmpeg_path: "ffmpeg".to_string(),
                max_video_size_bytes: self.max_video_size_bytes,
                max_thumbnail_size_bytes: self.max_thumbnail_size_bytes,
                signed_url_ttl_secs: 3600,
                upload_timeout_secs: self.upload_timeout_secs,
            },
        };
        config.validate().expect("test config should be valid");

        let local = Arc::new(
            LocalStorage::new(
                blobs_dir.to_string_lossy().to_string(),
                BLOB_BASE_URL.to_string(),
                URL_SIGNING_SECRET.as_bytes(),
            )
            .await
            .expect("failed to create local storage"),
        );
        let failing = self
            .failing_blobs
            .map(|delay| Arc::new(FailingBlobStore::new(delay)));
        let blobs: Arc<dyn BlobStore> = match &failing {
            Some(store) => store.clone(),
            None => local.clone(),
        };

        let videos = Arc::new(InMemoryVideoRepository::default());
        let inspector = Arc::new(FakeInspector::new(self.probe));
        let normalizer = Arc::new(FakeNormalizer::new(self.normalize));

        let state = Arc::new(AppState {
            config: Arc::new(config.clone()),
            videos: videos.clone(),
            blobs,
            local_blobs: Some(local.clone()),
            inspector: inspector.clone(),
            normalizer: normalizer.clone(),
            staging: StagingArea::new(&staging_dir)
                .await
                .expect("failed to create staging dir"),
            tokens: Arc::new(auth::validator()),
        });

        let router = routes::setup_routes(&config, state.clone()).expect("failed to build router");
        let server = TestServer::new(router).expect("failed to start test server");

        TestApp {
            server,
            state,
            videos,
            inspector,
            normalizer,
            local,
            failing,
            staging_dir,
            assets_dir,
            blobs_dir,
            _temp_dir: temp_dir,
        }
    }
}

/// Test application: server, fakes, and owned resources.
pub struct TestApp {
    pub server: TestServer,
    pub state: Arc<AppState>,
    pub videos: Arc<InMemoryVideoRepository>,
    pub inspector: Arc<FakeInspector>,
    pub normalizer: Arc<FakeNormalizer>,
    pub local: Arc<LocalStorage>,
    pub failing: Option<Arc<FailingBlobStore>>,
    pub staging_dir: PathBuf,
    pub assets_dir: PathBuf,
    pub blobs_dir: PathBuf,
    _temp_dir: TempDir,
}

impl TestApp {
    pub fn builder() -> TestAppBuilder {
        TestAppBuilder::default()
    }

    pub async fn new() -> TestApp {
        TestAppBuilder::default().build().await
    }

    pub fn client(&self) -> &TestServer {
        &self.server
    }

    /// Insert a draft record owned by `owner`.
    pub fn seed_video(&self, owner: Uuid) -> Video {
        let video = Video::draft(owner, "Test video".to_string(), String::new());
        self.videos.insert(video.clone());
        video
    }

    /// Insert a record owned by `owner` that already references a stored video.
    pub fn seed_uploaded_video(&self, owner: Uuid, key: &str) -> Video {
        let mut video = Video::draft(owner, "Uploaded video".to_string(), String::new());
        video.video_location = Some(BlobLocation::new(TEST_BUCKET, key));
        self.videos.insert(video.clone());
        video
    }

    pub fn staging_file_count(&self) -> usize {
        count_files(&self.staging_dir)
    }

    pub fn asset_file_count(&self) -> usize {
        count_files(&self.assets_dir)
    }
}

pub fn count_files(dir: &Path) -> usize {
    std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
}

/// Unix time in seconds.
pub fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_secs()
}
