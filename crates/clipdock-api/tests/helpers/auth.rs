use chrono::Duration;
use clipdock_api::auth::JwtValidator;
use uuid::Uuid;

pub const TEST_JWT_SECRET: &str = "clipdock-test-secret-0123456789abcdef";
pub const TEST_JWT_ISSUER: &str = "clipdock-access";

pub fn validator() -> JwtValidator {
    JwtValidator::new(TEST_JWT_SECRET, TEST_JWT_ISSUER)
}

/// A bearer token for `user_id`, valid for an hour.
pub fn token_for(user_id: Uuid) -> String {
    validator()
        .issue(user_id, Duration::hours(1))
        .expect("failed to issue test token")
}

pub fn bearer(user_id: Uuid) -> String {
    format!("Bearer {}", token_for(user_id))
}
