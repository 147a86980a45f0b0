use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use takeoff_core::error::CoreError;
use takeoff_forge::ForgeApiError;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and [`ForgeApiError`] for calls
/// to the remote services, and adds HTTP-specific variants. Implements
/// [`IntoResponse`] to produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A remote service call failed.
    #[error(transparent)]
    Forge(#[from] ForgeApiError),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::NotFound { entity, id } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{entity} with id {id} not found"),
                ),
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
                CoreError::Transport(msg) => {
                    tracing::warn!(error = %msg, "Upstream call failed");
                    (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR", msg.clone())
                }
                CoreError::MissingConfiguration(msg) => (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "MISSING_CONFIGURATION",
                    msg.clone(),
                ),
                CoreError::NoMatch { .. } => (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "NO_MATCH",
                    core.to_string(),
                ),
                CoreError::Internal(msg) => {
                    tracing::error!(error = %msg, "Internal core error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INTERNAL_ERROR",
                        "An internal error occurred".to_string(),
                    )
                }
            },

            // --- Remote service errors ---
            AppError::Forge(err) => classify_forge_error(err),

            // --- HTTP-specific errors ---
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

/// Classify a remote service error into an HTTP status, error code, and
/// message.
///
/// - Requests rejected before sending map to 400.
/// - Upstream 404 maps to 404 so clients can tell a missing resource apart.
/// - Timeouts map to 504, local I/O failures to 500, everything else to 502.
fn classify_forge_error(err: &ForgeApiError) -> (StatusCode, &'static str, String) {
    match err {
        ForgeApiError::InvalidRequest(msg) => {
            (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
        }
        ForgeApiError::ApiError { status: 404, body } => {
            (StatusCode::NOT_FOUND, "NOT_FOUND", body.clone())
        }
        ForgeApiError::ApiError { status, body } => {
            tracing::warn!(status, body = %body, "Upstream service returned an error");
            (
                StatusCode::BAD_GATEWAY,
                "UPSTREAM_ERROR",
                format!("Upstream service returned {status}"),
            )
        }
        ForgeApiError::Request(e) if e.is_timeout() => {
            tracing::warn!(error = %e, "Upstream request timed out");
            (
                StatusCode::GATEWAY_TIMEOUT,
                "UPSTREAM_TIMEOUT",
                "Upstream service timed out".to_string(),
            )
        }
        ForgeApiError::Io(e) => {
            tracing::error!(error = %e, "Local package I/O failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            )
        }
        ForgeApiError::Request(e) => {
            tracing::warn!(error = %e, "Upstream request failed");
            (
                StatusCode::BAD_GATEWAY,
                "UPSTREAM_ERROR",
                "Upstream service unreachable".to_string(),
            )
        }
    }
}
