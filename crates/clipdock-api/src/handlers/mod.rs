pub mod health;
pub mod local_blob;
pub mod thumbnail_get;
pub mod thumbnail_upload;
pub mod video_create;
pub mod video_get;
pub mod video_upload;

use crate::constants::MULTIPART_OVERHEAD_BYTES;
use crate::error::HttpAppError;
use crate::state::AppState;
use axum::http::{header::CONTENT_LENGTH, HeaderMap};
use clipdock_core::models::Video;
use clipdock_core::AppError;
use uuid::Uuid;

/// Parse a path identifier, answering 400 rather than axum's plain-text rejection.
pub(crate) fn parse_video_id(raw: &str) -> Result<Uuid, HttpAppError> {
    Uuid::parse_str(raw).map_err(|e| HttpAppError(AppError::from(e)))
}

/// Reject a request whose declared length cannot fit a file of `limit`
/// bytes plus multipart framing. The body is still counted while it is read.
pub(crate) fn check_content_length(headers: &HeaderMap, limit: u64) -> Result<(), HttpAppError> {
    let declared = headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());
    match declared {
        Some(len) if len > limit.saturating_add(MULTIPART_OVERHEAD_BYTES) => {
            Err(HttpAppError(AppError::PayloadTooLarge(format!(
                "Request body of {} bytes exceeds the {} byte limit",
                len, limit
            ))))
        }
        _ => Ok(()),
    }
}

/// Fetch a record and require that `user_id` owns it.
pub(crate) async fn load_owned_video(
    state: &AppState,
    id: Uuid,
    user_id: Uuid,
) -> Result<Video, HttpAppError> {
    let video = state
        .videos
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Video {} not found", id)))?;

    if !video.is_owned_by(user_id) {
        tracing::debug!(
            video_id = %id,
            user_id = %user_id,
            owner_id = %video.user_id,
            "Ownership check failed"
        );
        return Err(AppError::Forbidden("Not the owner of this video".to_string()).into());
    }
    Ok(video)
}
