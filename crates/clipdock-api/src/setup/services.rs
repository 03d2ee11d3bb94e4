//! Wiring of repositories, storage and media tools into [`AppState`].

use crate::auth::JwtValidator;
use crate::state::AppState;
use anyhow::{Context, Result};
use clipdock_core::Config;
use clipdock_db::PgVideoRepository;
use clipdock_processing::{FfmpegFaststart, FfprobeInspector, StagingArea};
use clipdock_storage::create_blob_store;
use sqlx::PgPool;
use std::sync::Arc;

pub async fn initialize_services(config: &Config, pool: PgPool) -> Result<Arc<AppState>> {
    let blob_stores = create_blob_store(config)
        .await
        .context("Failed to initialize blob storage")?;
    tracing::info!(
        backend = %blob_stores.store.backend_type(),
        bucket = %config.bucket(),
        "Blob storage initialized"
    );

    let staging = StagingArea::new(config.staging_dir())
        .await
        .with_context(|| format!("Failed to create staging dir {}", config.staging_dir().display()))?;
    tokio::fs::create_dir_all(config.assets_root())
        .await
        .with_context(|| format!("Failed to create assets dir {}", config.assets_root().display()))?;

    let inspector = FfprobeInspector::new(config.media.ffprobe_path.clone())
        .context("Invalid FFPROBE_PATH")?;
    let normalizer =
        FfmpegFaststart::new(config.media.ffmpeg_path.clone()).context("Invalid FFMPEG_PATH")?;

    Ok(Arc::new(AppState {
        config: Arc::new(config.clone()),
        videos: Arc::new(PgVideoRepository::new(pool)),
        blobs: blob_stores.store,
        local_blobs: blob_stores.local,
        inspector: Arc::new(inspector),
        normalizer: Arc::new(normalizer),
        staging,
        tokens: Arc::new(JwtValidator::new(config.jwt_secret(), config.jwt_issuer())),
    }))
}
