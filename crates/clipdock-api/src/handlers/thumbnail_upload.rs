use crate::auth::AuthUser;
use crate::constants::THUMBNAIL_FIELD;
use crate::error::{ErrorResponse, HttpAppError};
use crate::handlers::{check_content_length, load_owned_video, parse_video_id};
use crate::services::multipart::read_to_limit;
use crate::services::ThumbnailService;
use crate::state::AppState;
use axum::{
    extract::{multipart::MultipartRejection, Multipart, Path, State},
    http::HeaderMap,
    Json,
};
use clipdock_core::models::VideoResponse;
use clipdock_core::AppError;
use clipdock_processing::validator::{validate_declared_type, IMAGE_JPEG, IMAGE_PNG};
use clipdock_processing::ValidationError;
use std::sync::Arc;

#[utoipa::path(
    post,
    path = "/api/thumbnail_upload/{id}",
    tag = "videos",
    params(
        ("id" = String, Path, description = "Video ID (UUID)")
    ),
    request_body(content = inline(Object), content_type = "multipart/form-data", description = "Field `thumbnail` with a PNG or JPEG image"),
    responses(
        (status = 200, description = "Thumbnail stored", body = VideoResponse),
        (status = 400, description = "Invalid ID, form or image type", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Caller does not own the video", body = ErrorResponse),
        (status = 404, description = "Video not found", body = ErrorResponse),
        (status = 413, description = "Image too large", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(
    skip(state, headers, multipart),
    fields(user_id = %user.user_id, operation = "upload_thumbnail")
)]
pub async fn upload_thumbnail(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(raw_id): Path<String>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<VideoResponse>, HttpAppError> {
    let video_id = parse_video_id(&raw_id)?;
    let limit = state.config.max_thumbnail_size_bytes();
    check_content_length(&headers, limit)?;
    let mut multipart = multipart?;

    let field = loop {
        match multipart.next_field().await? {
            Some(field) if field.name() == Some(THUMBNAIL_FIELD) => break field,
            Some(_) => continue,
            None => {
                return Err(AppError::BadRequest(format!(
                    "Missing multipart field '{}'",
                    THUMBNAIL_FIELD
                ))
                .into())
            }
        }
    };

    let content_type = validate_declared_type(field.content_type(), &[IMAGE_PNG, IMAGE_JPEG])?;
    let data = read_to_limit(field, limit).await?;
    if data.is_empty() {
        return Err(ValidationError::EmptyFile.into());
    }

    let video = load_owned_video(&state, video_id, user.user_id).await?;
    let updated = ThumbnailService::new(&state)
        .store(video, &content_type, &data)
        .await?;

    Ok(Json(state.url_resolver().resolve_or_unsigned(updated).await))
}
