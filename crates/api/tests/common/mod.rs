#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use takeoff_core::pricebook::InMemoryPriceBookStore;
use takeoff_events::NotificationBus;
use takeoff_forge::retry::RetryConfig;
use takeoff_forge::{AssetsApi, CostApi, DesignAutomationApi, DesignAutomationConfig, ForgeApi};
use tower::ServiceExt;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use takeoff_api::config::ServerConfig;
use takeoff_api::results::PendingResults;
use takeoff_api::routes;
use takeoff_api::state::AppState;
use takeoff_api::ws::WsManager;

/// Public base URL the workitem callbacks point at.
pub const WEBHOOK_URL: &str = "https://takeoff.example.com";

/// Build a test `ServerConfig` with safe defaults and no database.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:3000".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        ws_heartbeat_secs: 30,
        database_url: None,
    }
}

/// Application state with an empty in-memory price book and remote
/// clients pointed at `forge_base_url` (usually a wiremock server).
pub fn test_state(forge_base_url: &str) -> AppState {
    test_state_with_bundles(forge_base_url, Path::new("bundles"))
}

/// Like [`test_state`], reading app bundle packages from `bundles_folder`.
pub fn test_state_with_bundles(forge_base_url: &str, bundles_folder: &Path) -> AppState {
    let api = ForgeApi::new(forge_base_url, "test-token", RetryConfig::none()).unwrap();
    let da_config = DesignAutomationConfig {
        nickname: "acme".into(),
        bundles_folder: bundles_folder.to_path_buf(),
        ..Default::default()
    };

    AppState {
        config: Arc::new(test_config()),
        price_book: Arc::new(InMemoryPriceBookStore::default()),
        design_automation: DesignAutomationApi::new(api.clone(), da_config, WEBHOOK_URL),
        assets: AssetsApi::new(api.clone()),
        cost: CostApi::new(api),
        ws_manager: Arc::new(WsManager::new()),
        notifications: Arc::new(NotificationBus::default()),
        pending_results: Arc::new(PendingResults::new()),
    }
}

/// Build the full application router with all middleware layers.
///
/// Mirrors the router construction in `main.rs` so integration tests
/// exercise the same middleware stack production uses.
pub fn build_test_app(state: AppState) -> Router {
    build_test_app_with_timeout(state, Duration::from_secs(30))
}

/// [`build_test_app`] with `local_timeout` on the locally served routes.
pub fn build_test_app_with_timeout(state: AppState, local_timeout: Duration) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(["http://localhost:3000".parse().unwrap()])
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600));

    let request_id_header = HeaderName::from_static("x-request-id");

    Router::new()
        .merge(routes::health::router())
        .nest("/api/forge", routes::api_routes(local_timeout))
        .layer(CatchPanicLayer::new())
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        .layer(cors)
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

pub async fn delete(app: Router, uri: &str) -> Response<Body> {
    send(app, Request::delete(uri).body(Body::empty()).unwrap()).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    json_request(app, Method::POST, uri, body).await
}

pub async fn put_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    json_request(app, Method::PUT, uri, body).await
}

pub async fn put_raw(app: Router, uri: &str, body: &'static str) -> Response<Body> {
    let request = Request::put(uri)
        .header(CONTENT_TYPE, "application/octet-stream")
        .body(Body::from(body))
        .unwrap();
    send(app, request).await
}

async fn json_request(
    app: Router,
    method: Method,
    uri: &str,
    body: serde_json::Value,
) -> Response<Body> {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap();
    send(app, request).await
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
