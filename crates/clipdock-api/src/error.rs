//! HTTP error response conversion
//!
//! Handlers return `Result<_, HttpAppError>`. Every domain error converts
//! into an `AppError`, which knows its own status code, machine code and
//! whether its details may be shown to clients.
//!
//! Rendered bodies never carry `details`. Outside production the router
//! adds [`expose_error_details`], which swaps in the detailed body for
//! non-sensitive errors.

use axum::{
    extract::multipart::{MultipartError, MultipartRejection},
    extract::rejection::JsonRejection,
    extract::{FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use clipdock_core::{AppError, ErrorMetadata, LogLevel};
use clipdock_processing::{ProcessingError, StagingError, ValidationError};
use clipdock_storage::StorageError;
use serde::{de::DeserializeOwned, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    /// Machine-readable error code for programmatic handling
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_action: Option<String>,
}

/// Wrapper so `IntoResponse` can be implemented for the core error type.
#[derive(Debug)]
pub struct HttpAppError(pub AppError);

impl From<AppError> for HttpAppError {
    fn from(err: AppError) -> Self {
        HttpAppError(err)
    }
}

impl From<JsonRejection> for HttpAppError {
    fn from(rejection: JsonRejection) -> Self {
        HttpAppError(AppError::InvalidInput(format!(
            "Invalid request body: {}",
            rejection.body_text()
        )))
    }
}

impl From<MultipartRejection> for HttpAppError {
    fn from(rejection: MultipartRejection) -> Self {
        HttpAppError(AppError::BadRequest(format!(
            "Invalid multipart request: {}",
            rejection.body_text()
        )))
    }
}

impl From<MultipartError> for HttpAppError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return HttpAppError(AppError::PayloadTooLarge(
                "Request body exceeds the upload limit".to_string(),
            ));
        }
        HttpAppError(AppError::BadRequest(format!(
            "Failed to read multipart: {}",
            err.body_text()
        )))
    }
}

/// JSON body extractor that returns our ErrorResponse format (400 + JSON) on deserialization failure.
#[derive(Debug, Clone, Copy)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = HttpAppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(inner) = Json::<T>::from_request(req, state)
            .await
            .map_err(HttpAppError::from)?;
        Ok(ValidatedJson(inner))
    }
}

fn log_error(error: &AppError) {
    let error_type = error.error_type();
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %error, error_type = error_type, "Request rejected");
        }
        LogLevel::Warn => {
            tracing::warn!(error = %error, error_type = error_type, "Request failed");
        }
        LogLevel::Error => {
            tracing::error!(
                error = %error.detailed_message(),
                error_type = error_type,
                "Request failed"
            );
        }
    }
}

/// Detailed body for a non-sensitive error, carried in the response
/// extensions until [`expose_error_details`] decides whether to use it.
#[derive(Clone)]
struct ErrorDetails(ErrorResponse);

/// Response mapper installed outside production: replaces the error body
/// with the one that includes `details`.
pub async fn expose_error_details(mut response: Response) -> Response {
    match response.extensions_mut().remove::<ErrorDetails>() {
        Some(ErrorDetails(detailed)) => {
            let status = response.status();
            (status, Json(detailed)).into_response()
        }
        None => response,
    }
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        let app_error = &self.0;

        let status = StatusCode::from_u16(app_error.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        log_error(app_error);

        let body = ErrorResponse {
            error: app_error.client_message(),
            code: app_error.error_code().to_string(),
            details: None,
            suggested_action: app_error.suggested_action().map(String::from),
        };
        let detailed = (!app_error.is_sensitive()).then(|| ErrorResponse {
            details: Some(app_error.detailed_message()),
            ..body.clone()
        });

        let mut response = (status, Json(body)).into_response();
        if let Some(detailed) = detailed {
            response.extensions_mut().insert(ErrorDetails(detailed));
        }
        response
    }
}

impl From<StorageError> for HttpAppError {
    fn from(err: StorageError) -> Self {
        let app = match err {
            StorageError::NotFound(msg) => AppError::NotFound(msg),
            StorageError::InvalidSignature => {
                AppError::Forbidden("Invalid or expired signature".to_string())
            }
            StorageError::UploadFailed(msg) => AppError::Storage(msg),
            StorageError::BackendError(msg) => AppError::Storage(msg),
            StorageError::InvalidKey(msg) => AppError::Storage(format!("invalid key: {}", msg)),
            StorageError::IoError(err) => AppError::Storage(format!("IO error: {}", err)),
            StorageError::ConfigError(msg) => AppError::Internal(msg),
            StorageError::Entropy(msg) => AppError::Internal(msg),
        };
        HttpAppError(app)
    }
}

impl From<ValidationError> for HttpAppError {
    fn from(err: ValidationError) -> Self {
        HttpAppError(AppError::BadRequest(err.to_string()))
    }
}

impl From<ProcessingError> for HttpAppError {
    fn from(err: ProcessingError) -> Self {
        HttpAppError(AppError::MediaProcessing(err.to_string()))
    }
}

impl From<StagingError> for HttpAppError {
    fn from(err: StagingError) -> Self {
        let app = match err {
            StagingError::TooLarge { limit } => {
                AppError::PayloadTooLarge(format!("File exceeds the {} byte limit", limit))
            }
            StagingError::Body(msg) => AppError::BadRequest(msg),
            StagingError::NothingStaged => {
                AppError::Internal("No staged upload in session".to_string())
            }
            StagingError::Io(err) => AppError::Internal(format!("Staging IO error: {}", err)),
        };
        HttpAppError(app)
    }
}
