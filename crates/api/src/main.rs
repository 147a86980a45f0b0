use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, Method};
use axum::Router;
use takeoff_core::pricebook::{InMemoryPriceBookStore, PriceBookStore};
use takeoff_events::NotificationBus;
use takeoff_forge::{AssetsApi, CostApi, DesignAutomationApi, ForgeApi, ForgeConfig};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use takeoff_api::config::ServerConfig;
use takeoff_api::relay::NotificationRelay;
use takeoff_api::results::PendingResults;
use takeoff_api::{routes, state, ws};

use state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "takeoff_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = config.port, db = config.database_url.is_some(), "Takeoff server configured");

    let forge_config = ForgeConfig::from_env();
    tracing::info!(
        base_url = %forge_config.base_url,
        nickname = %forge_config.design_automation.nickname,
        webhook_url = %forge_config.webhook_url,
        "Loaded remote service configuration",
    );

    // --- Price book ---
    let price_book = build_price_book_store(&config).await;

    // --- Remote service clients ---
    let forge_api = ForgeApi::new(
        forge_config.base_url.clone(),
        forge_config.access_token.clone(),
        forge_config.retry.clone(),
    )
    .expect("Failed to build HTTP client");
    let design_automation = DesignAutomationApi::new(
        forge_api.clone(),
        forge_config.design_automation.clone(),
        forge_config.webhook_url.clone(),
    );
    let assets = AssetsApi::new(forge_api.clone());
    let cost = CostApi::new(forge_api);

    // --- CORS ---
    let cors = build_cors_layer(&config);

    // --- WebSocket manager ---
    let ws_manager = Arc::new(ws::WsManager::new());

    // --- Heartbeat ---
    let heartbeat_handle = ws::start_heartbeat(
        Arc::clone(&ws_manager),
        Duration::from_secs(config.ws_heartbeat_secs.max(1)),
    );

    // --- Notification bus ---
    let notifications = Arc::new(NotificationBus::default());
    let relay = NotificationRelay::new(Arc::clone(&ws_manager));
    let relay_handle = tokio::spawn(relay.run(notifications.subscribe()));
    tracing::info!("Notification relay started");

    // --- App state ---
    let state = AppState {
        config: Arc::new(config.clone()),
        price_book,
        design_automation,
        assets,
        cost,
        ws_manager: Arc::clone(&ws_manager),
        notifications: Arc::clone(&notifications),
        pending_results: Arc::new(PendingResults::new()),
    };

    let request_id_header = HeaderName::from_static("x-request-id");

    // --- Router ---
    let app = Router::new()
        .merge(routes::health::router())
        .nest(
            "/api/forge",
            routes::api_routes(Duration::from_secs(config.request_timeout_secs)),
        )
        // Outermost layer last.
        .layer(CatchPanicLayer::new())
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        .layer(cors)
        .with_state(state);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Takeoff server listening");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .unwrap_or_else(|e| panic!("Cannot bind {addr}: {e}"));

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Drain ---
    tracing::info!("HTTP listener closed, draining notification pipeline");

    // Dropping the last bus handle closes the channel and ends the relay.
    drop(notifications);
    let drain = Duration::from_secs(config.shutdown_timeout_secs);
    let _ = tokio::time::timeout(drain, relay_handle).await;
    tracing::info!("Notification relay stopped");

    heartbeat_handle.abort();
    ws_manager.shutdown_all().await;
    tracing::info!("Takeoff server stopped");
}

/// Pick the price book backend: PostgreSQL when `DATABASE_URL` is set,
/// otherwise an in-memory book that starts empty.
async fn build_price_book_store(config: &ServerConfig) -> Arc<dyn PriceBookStore> {
    let Some(database_url) = &config.database_url else {
        tracing::warn!("DATABASE_URL not set, price book is in-memory and lost on restart");
        return Arc::new(InMemoryPriceBookStore::default());
    };

    let pool = takeoff_db::create_pool(database_url)
        .await
        .expect("Price book database unreachable");
    takeoff_db::health_check(&pool)
        .await
        .expect("Price book database health check failed");
    takeoff_db::run_migrations(&pool)
        .await
        .expect("Price book migrations failed");
    tracing::info!("Price book stored in PostgreSQL");

    Arc::new(takeoff_db::PgPriceBookStore::new(pool))
}

/// Resolves on SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let signal = tokio::select! {
        () = ctrl_c => "SIGINT",
        () = terminate => "SIGTERM",
    };
    tracing::info!(signal, "Shutting down");
}

/// CORS for the configured origins. An unparsable origin aborts startup.
fn build_cors_layer(config: &ServerConfig) -> CorsLayer {
    let origins: Vec<_> = config
        .cors_origins
        .iter()
        .map(|o| {
            o.parse()
                .unwrap_or_else(|e| panic!("CORS_ORIGINS entry {o:?} is not a valid origin: {e}"))
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600))
}
