use std::sync::Arc;
use std::time::Duration;

use crate::ws::manager::WsManager;

/// Subscribers silent for this many heartbeat periods are dropped.
const MISSED_BEATS_BEFORE_EVICTION: u32 = 3;

/// Ping notification subscribers every `period` and evict the silent ones.
///
/// Runs until aborted through the returned handle.
pub fn start_heartbeat(ws_manager: Arc<WsManager>, period: Duration) -> tokio::task::JoinHandle<()> {
    let stale_after = period * MISSED_BEATS_BEFORE_EVICTION;
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let evicted = ws_manager.ping_and_evict(stale_after).await;
            if !evicted.is_empty() {
                tracing::info!(?evicted, "Dropped unresponsive notification sockets");
            }
            let connections = ws_manager.connection_count().await;
            tracing::trace!(connections, "Notification heartbeat");
        }
    })
}
