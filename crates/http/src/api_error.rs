//! Typed API error for HTTP handlers.
//!
//! Converts service errors into HTTP responses with a JSON body and status
//! code. Handlers return `Result<_, ApiError>`.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use keendreams_service::ServiceError;
use keendreams_storage::StorageError;
use serde_json::json;

/// API error with HTTP status code and a client-facing body.
///
/// Renders `{"error": "message"}`, plus `issues` for validation failures
/// and `used`/`limit` for quota rejections. `Internal` logs the real error
/// server-side and returns a static message.
#[derive(Debug)]
pub enum ApiError {
    /// 400 Bad Request: invalid input from caller.
    BadRequest(String),
    /// 400 Bad Request: dream payload failed validation.
    InvalidDream(Vec<String>),
    /// 401 Unauthorized: no credential supplied.
    Unauthorized,
    /// 403 Forbidden: credential supplied but wrong.
    Forbidden,
    /// 404 Not Found: requested resource doesn't exist.
    NotFound(String),
    /// 507 Insufficient Storage: write would exceed the quota.
    QuotaExceeded { used: String, limit: String },
    /// 500 Internal Server Error: unexpected failure. Details logged, not exposed.
    Internal(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            Self::InvalidDream(issues) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "Invalid dream data", "issues": issues }),
            ),
            Self::Unauthorized => (StatusCode::UNAUTHORIZED, json!({ "error": "Unauthorized" })),
            Self::Forbidden => (StatusCode::FORBIDDEN, json!({ "error": "Forbidden" })),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, json!({ "error": msg })),
            Self::QuotaExceeded { used, limit } => (
                StatusCode::INSUFFICIENT_STORAGE,
                json!({ "error": "Storage quota exceeded", "used": used, "limit": limit }),
            ),
            Self::Internal(err) => {
                tracing::error!(error = ?err, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": "Internal server error" }))
            },
        };
        (status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err)
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(issues) => Self::InvalidDream(issues),
            ServiceError::QuotaExceeded(quota) => {
                Self::QuotaExceeded { used: quota.usage, limit: quota.limit }
            },
            ServiceError::InvalidInput(msg) => Self::BadRequest(msg),
            ServiceError::Storage(StorageError::NotFound { entity, id }) => {
                Self::NotFound(format!("{entity} '{id}' not found"))
            },
            _ => Self::Internal(err.into()),
        }
    }
}
