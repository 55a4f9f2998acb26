//! Editor event bus.
//!
//! - [`EventBus`] — in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`EditorEvent`] — the event envelope; names live in [`event_types`].
//! - [`EventLog`] — background subscriber mirroring events into the log.

pub mod bus;
pub mod event_types;
pub mod log;

pub use bus::{EditorEvent, EventBus};
pub use log::EventLog;
