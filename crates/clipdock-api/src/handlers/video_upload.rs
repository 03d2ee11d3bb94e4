use crate::auth::AuthUser;
use crate::constants::VIDEO_FIELD;
use crate::error::{ErrorResponse, HttpAppError};
use crate::handlers::{check_content_length, load_owned_video, parse_video_id};
use crate::services::multipart::read_head;
use crate::services::VideoIngestService;
use crate::state::AppState;
use axum::{
    extract::{multipart::MultipartRejection, Multipart, Path, State},
    http::HeaderMap,
    Json,
};
use clipdock_core::models::VideoUploadResponse;
use clipdock_core::AppError;
use clipdock_processing::validator::{
    validate_declared_type, validate_sniffed_type, SNIFF_LEN, VIDEO_MP4,
};
use std::sync::Arc;

#[utoipa::path(
    post,
    path = "/api/videos/{id}/upload",
    tag = "videos",
    params(
        ("id" = String, Path, description = "Video ID (UUID)")
    ),
    request_body(content = inline(Object), content_type = "multipart/form-data", description = "Field `video` with an MP4 file"),
    responses(
        (status = 200, description = "Video uploaded and attached", body = VideoUploadResponse),
        (status = 400, description = "Invalid ID, form or content type", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Caller does not own the video", body = ErrorResponse),
        (status = 404, description = "Video not found", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse),
        (status = 500, description = "Processing, storage or database failure", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(
    skip(state, headers, multipart),
    fields(user_id = %user.user_id, operation = "upload_video")
)]
pub async fn upload_video(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(raw_id): Path<String>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<VideoUploadResponse>, HttpAppError> {
    let video_id = parse_video_id(&raw_id)?;
    check_content_length(&headers, state.config.max_video_size_bytes())?;
    let mut multipart = multipart?;

    let mut field = loop {
        match multipart.next_field().await? {
            Some(field) if field.name() == Some(VIDEO_FIELD) => break field,
            Some(_) => continue,
            None => {
                return Err(AppError::BadRequest(format!(
                    "Missing multipart field '{}'",
                    VIDEO_FIELD
                ))
                .into())
            }
        }
    };

    let declared = validate_declared_type(field.content_type(), &[VIDEO_MP4])?;
    let head = read_head(&mut field, SNIFF_LEN).await?;
    validate_sniffed_type(&declared, &head)?;

    let video = load_owned_video(&state, video_id, user.user_id).await?;

    tracing::info!(video_id = %video_id, "Ingesting video upload");
    let updated = VideoIngestService::new(&state)
        .ingest(video, &head, Box::pin(field))
        .await?;

    Ok(Json(VideoUploadResponse {
        video_id: updated.id,
    }))
}
