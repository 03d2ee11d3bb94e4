//! OpenAPI documentation.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::error;
use crate::handlers;
use clipdock_core::models;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Clipdock API",
        version = "0.1.0",
        description = "Video upload and processing API. Uploaded MP4 files are inspected, remuxed for progressive playback and stored in blob storage; thumbnails are served from the assets directory."
    ),
    paths(
        handlers::video_create::create_video,
        handlers::video_get::get_video,
        handlers::video_upload::upload_video,
        handlers::thumbnail_upload::upload_thumbnail,
        handlers::thumbnail_get::get_thumbnail,
        handlers::health::health_check,
    ),
    components(
        schemas(
            models::CreateVideoRequest,
            models::VideoResponse,
            models::VideoUploadResponse,
            handlers::health::HealthResponse,
            error::ErrorResponse,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "videos", description = "Video records, uploads and thumbnails"),
        (name = "health", description = "Service health")
    )
)]
pub struct ApiDoc;
