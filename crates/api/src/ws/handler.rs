use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use crate::state::AppState;
use crate::ws::manager::WsManager;

/// GET /api/forge/ws
///
/// Subscribes the caller to job notifications. Clients never send
/// anything meaningful; inbound frames only count as liveness.
///
/// The subscriber is registered before the upgrade response goes out, so
/// a client that has finished the handshake misses nothing published
/// afterwards. Notifications queued in between are flushed once the
/// socket is up.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    let conn_id = uuid::Uuid::new_v4().to_string();
    let outbound = state.ws_manager.add(conn_id.clone()).await;
    // A failed upgrade drops `outbound`; the next heartbeat evicts the entry.
    ws.on_upgrade(move |socket| serve_subscriber(socket, state.ws_manager, conn_id, outbound))
}

async fn serve_subscriber(
    socket: WebSocket,
    ws_manager: Arc<WsManager>,
    conn_id: String,
    mut outbound: mpsc::UnboundedReceiver<Message>,
) {
    tracing::info!(conn_id = %conn_id, "Notification subscriber connected");

    let (mut sink, mut inbound) = socket.split();

    loop {
        tokio::select! {
            queued = outbound.recv() => {
                // `None` means the manager dropped us (shutdown or eviction).
                let Some(message) = queued else { break };
                let closing = matches!(message, Message::Close(_));
                if let Err(e) = sink.send(message).await {
                    tracing::debug!(conn_id = %conn_id, error = %e, "Notification send failed");
                    break;
                }
                if closing {
                    break;
                }
            }
            frame = inbound.next() => match frame {
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => ws_manager.touch(&conn_id).await,
                Some(Err(e)) => {
                    tracing::debug!(conn_id = %conn_id, error = %e, "Notification socket error");
                    break;
                }
            },
        }
    }

    ws_manager.remove(&conn_id).await;
    tracing::info!(conn_id = %conn_id, "Notification subscriber disconnected");
}
