use crate::auth::models::AuthUser;
use crate::error::HttpAppError;
use crate::state::AppState;
use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Response},
};
use clipdock_core::AppError;
use std::sync::Arc;

const BEARER_PREFIX: &str = "Bearer ";

/// Require a valid bearer token and record the caller as [`AuthUser`].
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let auth_header = match request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
    {
        Some(h) => h,
        None => {
            return HttpAppError(AppError::Unauthorized(
                "Missing authorization header".to_string(),
            ))
            .into_response();
        }
    };

    let Some(token) = auth_header.strip_prefix(BEARER_PREFIX) else {
        return HttpAppError(AppError::Unauthorized(
            "Invalid authorization header format".to_string(),
        ))
        .into_response();
    };

    match state.tokens.validate(token.trim()) {
        Ok(user_id) => {
            tracing::debug!(user_id = %user_id, "Request authenticated");
            request.extensions_mut().insert(AuthUser { user_id });
            next.run(request).await
        }
        Err(e) => HttpAppError(e).into_response(),
    }
}
