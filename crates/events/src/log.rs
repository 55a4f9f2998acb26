//! Event log subscriber.
//!
//! [`EventLog`] subscribes to the [`EventBus`](crate::bus::EventBus) and
//! mirrors every [`EditorEvent`] into the tracing log. It runs as a
//! long-lived background task and stops when the bus is dropped.

use tokio::sync::broadcast;

use crate::bus::EditorEvent;
use crate::event_types;

pub struct EventLog;

impl EventLog {
    /// Run the logging loop until the channel closes. Returns the number of
    /// events seen.
    pub async fn run(mut receiver: broadcast::Receiver<EditorEvent>) -> u64 {
        let mut seen = 0;
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    seen += 1;
                    Self::log(&event);
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Event log lagged, some events were not logged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!(seen, "Event bus closed, event log shutting down");
                    break;
                }
            }
        }
        seen
    }

    fn log(event: &EditorEvent) {
        let project_id = event.project_id.as_deref().unwrap_or("-");
        if event.event_type == event_types::HISTORY_PERSIST_FAILED {
            tracing::error!(
                event_type = %event.event_type,
                project_id,
                payload = %event.payload,
                "Editor event"
            );
        } else {
            tracing::debug!(
                event_type = %event.event_type,
                project_id,
                payload = %event.payload,
                "Editor event"
            );
        }
    }
}
