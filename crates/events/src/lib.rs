//! In-process event bus for issue lifecycle notifications.
//!
//! - [`EventBus`]: publish/subscribe hub backed by `tokio::sync::broadcast`.
//! - [`MonitorEvent`]: the event envelope, always scoped to one machine.

pub mod bus;

pub use bus::{EventBus, MonitorEvent};
