//! Tests for `AppError` → HTTP response mapping.
//!
//! These call `IntoResponse` directly; no server is involved.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use http_body_util::BodyExt;
use takeoff_api::error::AppError;
use takeoff_core::error::CoreError;
use takeoff_forge::ForgeApiError;

/// Convert an `AppError` into its status code and parsed JSON body.
async fn error_to_response(err: AppError) -> (StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

// ---------------------------------------------------------------------------
// Test: CoreError variants
// ---------------------------------------------------------------------------

#[tokio::test]
async fn not_found_error_returns_404() {
    let err = AppError::Core(CoreError::NotFound {
        entity: "Workitem",
        id: "wi-1".into(),
    });

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
    assert_eq!(json["error"], "Workitem with id wi-1 not found");
}

#[tokio::test]
async fn transport_error_returns_502() {
    let err = AppError::Core(CoreError::Transport("connection refused".into()));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json["code"], "UPSTREAM_ERROR");
}

#[tokio::test]
async fn missing_configuration_returns_422() {
    let err = AppError::Core(CoreError::MissingConfiguration(
        "Budget code length is not set".into(),
    ));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["code"], "MISSING_CONFIGURATION");
    assert_eq!(json["error"], "Budget code length is not set");
}

#[tokio::test]
async fn no_match_returns_422_with_label() {
    let err = AppError::Core(CoreError::NoMatch {
        kind: "status",
        label: "Installed".into(),
    });

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["code"], "NO_MATCH");
    assert_eq!(json["error"], "No status matches 'Installed'");
}

#[tokio::test]
async fn conflict_error_returns_409() {
    let (status, json) =
        error_to_response(AppError::Core(CoreError::Conflict("duplicate type".into()))).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "CONFLICT");
}

#[tokio::test]
async fn internal_error_hides_details() {
    let err = AppError::Core(CoreError::Internal("secret stack trace".into()));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "INTERNAL_ERROR");
    assert_eq!(json["error"], "An internal error occurred");
}

// ---------------------------------------------------------------------------
// Test: ForgeApiError variants
// ---------------------------------------------------------------------------

#[tokio::test]
async fn upstream_status_is_not_leaked() {
    let err = AppError::Forge(ForgeApiError::ApiError {
        status: 503,
        body: "internal upstream detail".into(),
    });

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json["error"], "Upstream service returned 503");
}

#[tokio::test]
async fn rejected_request_returns_400() {
    let err = AppError::Forge(ForgeApiError::InvalidRequest("Not a storage URN: x".into()));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn local_io_failure_is_internal() {
    let err = AppError::Forge(ForgeApiError::Io(std::io::Error::new(
        std::io::ErrorKind::PermissionDenied,
        "/srv/bundles",
    )));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "INTERNAL_ERROR");
    assert_eq!(json["error"], "An internal error occurred");
}

// ---------------------------------------------------------------------------
// Test: HTTP-specific variants
// ---------------------------------------------------------------------------

#[tokio::test]
async fn bad_request_error_returns_400() {
    let (status, json) = error_to_response(AppError::BadRequest("invalid field".into())).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "BAD_REQUEST");
    assert_eq!(json["error"], "invalid field");
}
