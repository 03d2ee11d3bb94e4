use crate::auth::AuthUser;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, Json};
use clipdock_core::models::{CreateVideoRequest, Video, VideoResponse};
use clipdock_core::AppError;
use std::sync::Arc;

#[utoipa::path(
    post,
    path = "/api/videos",
    tag = "videos",
    request_body = CreateVideoRequest,
    responses(
        (status = 201, description = "Draft video created", body = VideoResponse),
        (status = 400, description = "Invalid request body", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, request), fields(user_id = %user.user_id, operation = "create_video"))]
pub async fn create_video(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    ValidatedJson(request): ValidatedJson<CreateVideoRequest>,
) -> Result<(StatusCode, Json<VideoResponse>), HttpAppError> {
    let title = request.title.trim();
    if title.is_empty() {
        return Err(AppError::InvalidInput("Title must not be empty".to_string()).into());
    }

    let draft = Video::draft(user.user_id, title.to_string(), request.description);
    let video = state.videos.create(&draft).await?;
    tracing::info!(video_id = %video.id, "Video draft created");

    Ok((StatusCode::CREATED, Json(state.url_resolver().resolve(video).await?)))
}
