//! Maps domain `AppError` to HTTP responses.

use std::sync::OnceLock;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use atlas_core::error::{AppError, ErrorKind};

/// Whether 500 responses are sanitized. Set once at startup.
static PRODUCTION_MODE: OnceLock<bool> = OnceLock::new();

/// Configure response sanitization. Called once during app construction;
/// later calls are ignored.
pub fn set_production_mode(production: bool) {
    let _ = PRODUCTION_MODE.set(production);
}

fn is_production() -> bool {
    *PRODUCTION_MODE.get().unwrap_or(&false)
}

/// Standard API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// Machine-readable error code.
    pub error: String,
    /// Human-readable message.
    pub message: String,
    /// Backoff hint for locked / rate-limited responses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_seconds: Option<u64>,
    /// Correlation id for server-side log lookup (500s only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
}

/// HTTP-facing wrapper around [`AppError`].
///
/// Handlers return `Result<_, ApiError>` and use `?` on any
/// `AppError`-producing call; the conversion is automatic.
#[derive(Debug, Clone)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;

        let (status, fallback_code) = match err.kind {
            ErrorKind::Validation => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            ErrorKind::Authentication => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            ErrorKind::Authorization => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            ErrorKind::Locked => (StatusCode::LOCKED, "ACCOUNT_LOCKED"),
            ErrorKind::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ErrorKind::Conflict => (StatusCode::CONFLICT, "CONFLICT"),
            ErrorKind::RateLimit => (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMITED"),
            ErrorKind::Database
            | ErrorKind::Cache
            | ErrorKind::Configuration
            | ErrorKind::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        let code = err.code.unwrap_or(fallback_code).to_string();

        let (message, correlation_id) = if status == StatusCode::INTERNAL_SERVER_ERROR {
            let correlation_id = Uuid::new_v4().to_string();
            tracing::error!(
                correlation_id = %correlation_id,
                kind = %err.kind,
                error = %err.message,
                source = ?err.source,
                "Internal server error"
            );
            let message = if is_production() {
                "An unexpected error occurred".to_string()
            } else {
                err.message.clone()
            };
            (message, Some(correlation_id))
        } else {
            (err.message.clone(), None)
        };

        let body = ApiErrorResponse {
            error: code,
            message,
            retry_after_seconds: err.retry_after_seconds,
            correlation_id,
        };

        (status, Json(body)).into_response()
    }
}
