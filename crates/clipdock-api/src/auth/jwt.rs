//! HS256 access tokens.

use crate::auth::models::JwtClaims;
use chrono::{Duration, Utc};
use clipdock_core::AppError;
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

/// Turns a bearer token into the id of the user it was issued to.
pub trait TokenValidator: Send + Sync {
    fn validate(&self, token: &str) -> Result<Uuid, AppError>;
}

pub struct JwtValidator {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
}

impl JwtValidator {
    pub fn new(secret: &str, issuer: impl Into<String>) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            issuer: issuer.into(),
        }
    }

    /// Issue a token for `user_id`, valid for `ttl`.
    pub fn issue(&self, user_id: Uuid, ttl: Duration) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = JwtClaims {
            sub: user_id,
            iss: self.issuer.clone(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Failed to sign token: {}", e)))
    }

    pub fn validate_claims(&self, token: &str) -> Result<JwtClaims, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;
        validation.set_issuer(&[self.issuer.as_str()]);

        let token_data = decode::<JwtClaims>(token, &self.decoding_key, &validation).map_err(|e| {
            tracing::debug!("JWT validation failed: {}", e);
            match e.kind() {
                ErrorKind::ExpiredSignature => AppError::Unauthorized("Token has expired".to_string()),
                ErrorKind::InvalidIssuer => {
                    AppError::Unauthorized("Invalid token issuer".to_string())
                }
                _ => AppError::Unauthorized("Invalid or expired token".to_string()),
            }
        })?;

        Ok(token_data.claims)
    }
}

impl TokenValidator for JwtValidator {
    fn validate(&self, token: &str) -> Result<Uuid, AppError> {
        self.validate_claims(token).map(|claims| claims.sub)
    }
}
