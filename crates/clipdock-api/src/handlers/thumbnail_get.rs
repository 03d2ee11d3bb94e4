use crate::error::{ErrorResponse, HttpAppError};
use crate::handlers::parse_video_id;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    response::Redirect,
};
use clipdock_core::AppError;
use std::sync::Arc;

/// Redirect to wherever the video's thumbnail is served from.
#[utoipa::path(
    get,
    path = "/api/thumbnails/{id}",
    tag = "videos",
    params(
        ("id" = String, Path, description = "Video ID (UUID)")
    ),
    responses(
        (status = 307, description = "Redirect to the thumbnail image"),
        (status = 400, description = "Invalid video ID", body = ErrorResponse),
        (status = 404, description = "Video or thumbnail not found", body = ErrorResponse)
    )
)]
pub async fn get_thumbnail(
    State(state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
) -> Result<Redirect, HttpAppError> {
    let id = parse_video_id(&raw_id)?;
    let video = state
        .videos
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Video not found".to_string()))?;

    match video.thumbnail_url {
        Some(url) => Ok(Redirect::temporary(&url)),
        None => Err(AppError::NotFound("Thumbnail not found".to_string()).into()),
    }
}
