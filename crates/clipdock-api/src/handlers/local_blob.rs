//! Download route for blobs kept by the local storage backend.

use crate::error::HttpAppError;
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::header::{CONTENT_LENGTH, CONTENT_TYPE},
    response::Response,
};
use clipdock_core::models::BlobLocation;
use clipdock_core::AppError;
use clipdock_processing::validator::VIDEO_MP4;
use clipdock_storage::StorageError;
use serde::Deserialize;
use std::sync::Arc;
use tokio_util::io::ReaderStream;

#[derive(Debug, Deserialize)]
pub struct SignedQuery {
    pub expires: Option<u64>,
    pub signature: Option<String>,
}

pub async fn serve_blob(
    State(state): State<Arc<AppState>>,
    Path((bucket, key)): Path<(String, String)>,
    Query(query): Query<SignedQuery>,
) -> Result<Response, HttpAppError> {
    let local = state
        .local_blobs
        .as_ref()
        .ok_or_else(|| AppError::NotFound("Blob not found".to_string()))?;

    let (expires, signature) = query
        .expires
        .zip(query.signature)
        .ok_or(StorageError::InvalidSignature)?;

    let location = BlobLocation::new(bucket, key);
    let now = chrono::Utc::now().timestamp().max(0) as u64;
    local.verify(&location, expires, &signature, now)?;

    let path = local.resolve(&location).await?;
    let file = tokio::fs::File::open(&path).await.map_err(AppError::from)?;
    let len = file.metadata().await.map_err(AppError::from)?.len();

    tracing::debug!(blob = %location, size_bytes = len, "Serving local blob");

    Response::builder()
        .header(CONTENT_TYPE, VIDEO_MP4)
        .header(CONTENT_LENGTH, len)
        .body(Body::from_stream(ReaderStream::new(file)))
        .map_err(|e| AppError::Internal(format!("Failed to build response: {}", e)).into())
}
