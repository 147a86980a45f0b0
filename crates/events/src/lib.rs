//! In-process fan-out of job notifications.
//!
//! The server publishes a [`JobEvent`] on the [`NotificationBus`] for every
//! workitem callback it receives; the WebSocket relay and any other
//! listener subscribe independently.
//!
//! [`JobEvent`]: bus::JobEvent

pub mod bus;

pub use bus::{JobEvent, NotificationBus};
