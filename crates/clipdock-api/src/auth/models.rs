use crate::error::HttpAppError;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use clipdock_core::AppError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: Uuid, // user_id
    pub iss: String,
    pub exp: i64, // expiration timestamp
    pub iat: i64, // issued at timestamp
}

/// Authenticated caller, inserted into request extensions by the auth middleware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: Uuid,
}

// Extension cannot be used alongside Multipart, so read the extension directly.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = HttpAppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .copied()
            .ok_or_else(|| {
                HttpAppError(AppError::Unauthorized(
                    "Missing authentication context".to_string(),
                ))
            })
    }
}
