use std::sync::Arc;

use takeoff_core::pricebook::PriceBookStore;
use takeoff_events::NotificationBus;
use takeoff_forge::{AssetsApi, CostApi, DesignAutomationApi};

use crate::config::ServerConfig;
use crate::results::PendingResults;
use crate::ws::WsManager;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: inner data is behind `Arc` or is a cloneable client.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    /// Price book persistence (PostgreSQL or in-memory).
    pub price_book: Arc<dyn PriceBookStore>,
    pub design_automation: DesignAutomationApi,
    pub assets: AssetsApi,
    pub cost: CostApi,
    /// WebSocket connection manager (desktop clients).
    pub ws_manager: Arc<WsManager>,
    /// Fan-out of job notifications received from workitem callbacks.
    pub notifications: Arc<NotificationBus>,
    pub pending_results: Arc<PendingResults>,
}
