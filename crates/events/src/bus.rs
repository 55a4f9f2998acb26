//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is the publish/subscribe hub for [`EditorEvent`]s. It is
//! designed to be shared via `Arc<EventBus>` across the editor services.

use chrono::{DateTime, Utc};
use layerdraw_core::types::ProjectId;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// EditorEvent
// ---------------------------------------------------------------------------

/// Something that happened in the editor.
///
/// Constructed via [`EditorEvent::new`] and enriched with
/// [`for_project`](EditorEvent::for_project) and
/// [`with_payload`](EditorEvent::with_payload).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditorEvent {
    /// Dot-separated event name, e.g. `"history.navigated"`.
    pub event_type: String,

    /// Project the event concerns, if any.
    pub project_id: Option<ProjectId>,

    /// Free-form JSON payload carrying event-specific data.
    pub payload: serde_json::Value,

    /// When the event was created (UTC).
    pub timestamp: DateTime<Utc>,
}

impl EditorEvent {
    /// Create a new event with only the required `event_type`.
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            project_id: None,
            payload: serde_json::Value::Object(Default::default()),
            timestamp: Utc::now(),
        }
    }

    pub fn for_project(mut self, project_id: impl Into<ProjectId>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 256;

/// In-process fan-out event bus.
///
/// ```rust
/// use layerdraw_events::bus::{EditorEvent, EventBus};
///
/// let bus = EventBus::default();
/// let mut rx = bus.subscribe();
///
/// bus.publish(EditorEvent::new("layer.created"));
/// ```
pub struct EventBus {
    sender: broadcast::Sender<EditorEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed messages are dropped
    /// and slow receivers will observe a `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers. Without subscribers the
    /// event is dropped.
    pub fn publish(&self, event: EditorEvent) {
        // Ignore the SendError: it only means there are zero receivers.
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EditorEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_and_receive_single_subscriber() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        bus.publish(
            EditorEvent::new("history.pushed")
                .for_project("p1")
                .with_payload(serde_json::json!({"label": "Brush stroke"})),
        );

        let received = rx.recv().await.expect("should receive the event");
        assert_eq!(received.event_type, "history.pushed");
        assert_eq!(received.project_id.as_deref(), Some("p1"));
        assert_eq!(received.payload["label"], "Brush stroke");
    }

    #[tokio::test]
    async fn multiple_subscribers_receive_same_event() {
        let bus = EventBus::default();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.publish(EditorEvent::new("snapshot.applied"));

        assert_eq!(rx1.recv().await.unwrap().event_type, "snapshot.applied");
        assert_eq!(rx2.recv().await.unwrap().event_type, "snapshot.applied");
    }

    #[test]
    fn publish_with_no_subscribers_does_not_panic() {
        let bus = EventBus::default();
        bus.publish(EditorEvent::new("orphan.event"));
    }

    #[test]
    fn default_event_has_empty_optional_fields() {
        let event = EditorEvent::new("bare.event");
        assert!(event.project_id.is_none());
        assert!(event.payload.is_object());
    }
}
