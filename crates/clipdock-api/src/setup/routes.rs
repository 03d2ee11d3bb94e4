//! Route configuration and setup.

use crate::api_doc::ApiDoc;
use crate::auth::auth_middleware;
use crate::constants::{API_PREFIX, ASSETS_ROUTE, BLOBS_ROUTE, MULTIPART_OVERHEAD_BYTES};
use crate::error::expose_error_details;
use crate::handlers;
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::{get, post},
    Json, Router,
};
use clipdock_core::Config;
use std::sync::Arc;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router<()>, anyhow::Error> {
    let cors = setup_cors(config)?;

    let http_concurrency_limit = config.http_concurrency_limit();
    tracing::info!(
        http_concurrency_limit = http_concurrency_limit,
        "HTTP concurrency limit layer enabled"
    );

    let protected_routes = protected_routes(config).layer(
        axum::middleware::from_fn_with_state(state.clone(), auth_middleware),
    );

    let mut app = public_routes(&state)
        .merge(protected_routes)
        .with_state(state)
        .nest_service(ASSETS_ROUTE, ServeDir::new(config.assets_root()))
        .route(
            "/api/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        )
        .merge(utoipa_rapidoc::RapiDoc::new("/api/openapi.json").path("/docs"));

    if !config.is_production() {
        app = app.layer(axum::middleware::map_response(expose_error_details));
    }

    let app = app
        .layer(ConcurrencyLimitLayer::new(http_concurrency_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    Ok(app)
}

fn protected_routes(config: &Config) -> Router<Arc<AppState>> {
    let video_body_limit = body_limit(config.max_video_size_bytes());
    let thumbnail_body_limit = body_limit(config.max_thumbnail_size_bytes());

    Router::new()
        .route(
            &format!("{}/videos", API_PREFIX),
            post(handlers::video_create::create_video),
        )
        .route(
            &format!("{}/videos/{{id}}", API_PREFIX),
            get(handlers::video_get::get_video),
        )
        .route(
            &format!("{}/videos/{{id}}/upload", API_PREFIX),
            post(handlers::video_upload::upload_video)
                .layer(DefaultBodyLimit::max(video_body_limit)),
        )
        .route(
            &format!("{}/thumbnail_upload/{{id}}", API_PREFIX),
            post(handlers::thumbnail_upload::upload_thumbnail)
                .layer(DefaultBodyLimit::max(thumbnail_body_limit)),
        )
}

fn public_routes(state: &AppState) -> Router<Arc<AppState>> {
    let router = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route(
            &format!("{}/thumbnails/{{id}}", API_PREFIX),
            get(handlers::thumbnail_get::get_thumbnail),
        );

    if state.local_blobs.is_some() {
        router.route(
            &format!("{}/{{bucket}}/{{*key}}", BLOBS_ROUTE),
            get(handlers::local_blob::serve_blob),
        )
    } else {
        router
    }
}

/// Whole-body limit for a route accepting one file of up to `file_limit` bytes.
fn body_limit(file_limit: u64) -> usize {
    usize::try_from(file_limit.saturating_add(MULTIPART_OVERHEAD_BYTES)).unwrap_or(usize::MAX)
}

fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let methods = [Method::GET, Method::POST, Method::OPTIONS];
    let cors = if config.cors_origins().iter().any(|o| o == "*") {
        if config.is_production() {
            anyhow::bail!("CORS_ORIGINS must not be '*' in production");
        }
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any)
    } else {
        let origins = config
            .cors_origins()
            .iter()
            .map(|o| o.parse::<HeaderValue>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| anyhow::anyhow!("Invalid CORS origin: {}", e))?;
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers(Any)
    };
    Ok(cors)
}
