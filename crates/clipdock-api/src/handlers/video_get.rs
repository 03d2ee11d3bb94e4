use crate::auth::AuthUser;
use crate::error::{ErrorResponse, HttpAppError};
use crate::handlers::parse_video_id;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use clipdock_core::models::VideoResponse;
use clipdock_core::AppError;
use std::sync::Arc;

#[utoipa::path(
    get,
    path = "/api/videos/{id}",
    tag = "videos",
    params(
        ("id" = String, Path, description = "Video ID (UUID)")
    ),
    responses(
        (status = 200, description = "Video found", body = VideoResponse),
        (status = 400, description = "Invalid video ID", body = ErrorResponse),
        (status = 404, description = "Video not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state), fields(user_id = %user.user_id, operation = "get_video"))]
pub async fn get_video(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(raw_id): Path<String>,
) -> Result<Json<VideoResponse>, HttpAppError> {
    let id = parse_video_id(&raw_id)?;
    let video = state
        .videos
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Video not found".to_string()))?;

    Ok(Json(state.url_resolver().resolve(video).await?))
}
