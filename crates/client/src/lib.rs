//! Session-scoped client for the takeoff server.
//!
//! [`ProxyClient`] talks to the server's proxy routes and implements the
//! domain seams from `takeoff-core`, so the reconciler and budget engine
//! run unchanged against it. [`NotificationListener`] keeps a WebSocket
//! open for job notifications, and the sessions in [`session`] tie a
//! submission to the notification that completes it.

pub mod config;
pub mod error;
pub mod listener;
pub mod proxy;
pub mod session;

pub use config::ClientConfig;
pub use error::ProxyError;
pub use listener::NotificationListener;
pub use proxy::ProxyClient;
pub use session::{AssetSession, QtoSession, SessionError};
