//! Application state shared by every handler.

use crate::auth::TokenValidator;
use crate::services::SignedUrlResolver;
use clipdock_core::Config;
use clipdock_db::VideoRepository;
use clipdock_processing::{MediaInspector, MediaNormalizer, StagingArea};
use clipdock_storage::{BlobStore, LocalStorage};
use std::sync::Arc;

/// Collaborators are trait objects so tests can swap in fakes for the
/// database, ffprobe, ffmpeg and the blob store.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub videos: Arc<dyn VideoRepository>,
    pub blobs: Arc<dyn BlobStore>,
    /// Set when blobs live on the local filesystem and are served by this process.
    pub local_blobs: Option<Arc<LocalStorage>>,
    pub inspector: Arc<dyn MediaInspector>,
    pub normalizer: Arc<dyn MediaNormalizer>,
    pub staging: StagingArea,
    pub tokens: Arc<dyn TokenValidator>,
}

impl AppState {
    pub fn url_resolver(&self) -> SignedUrlResolver {
        SignedUrlResolver::new(self.blobs.clone(), self.config.signed_url_ttl())
    }
}
