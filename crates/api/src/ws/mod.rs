//! WebSocket push of job notifications.
//!
//! Clients subscribe at `/api/forge/ws`; [`WsManager`] tracks them, the
//! notification relay broadcasts through it, and the heartbeat evicts
//! subscribers that stop answering pings.

mod handler;
mod heartbeat;
pub mod manager;

pub use handler::ws_handler;
pub use heartbeat::start_heartbeat;
pub use manager::WsManager;
