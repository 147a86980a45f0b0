//! Takeoff API server library.
//!
//! Proxies the design-automation, asset and cost services for desktop
//! clients, hosts the price book, and relays workitem completions to
//! connected clients over WebSocket. Exposed as a library so integration
//! tests and the binary entrypoint share the same building blocks.

pub mod config;
pub mod error;
pub mod handlers;
pub mod relay;
pub mod response;
pub mod results;
pub mod routes;
pub mod state;
pub mod ws;
