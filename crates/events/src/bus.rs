//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! Shared via `Arc<EventBus>` between the generation orchestrators and any
//! listeners (the HTTP layer, the [`EventLog`](crate::EventLog)).

use chrono::{DateTime, Utc};
use hyde_core::types::DbId;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// GenerationEvent
// ---------------------------------------------------------------------------

/// Something that happened during a generation run.
///
/// Built with [`GenerationEvent::new`] and the `with_*` builder methods.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationEvent {
    /// One of the names in [`crate::names`].
    pub event_type: String,

    /// User that started the run, when known.
    pub owner_id: Option<DbId>,

    pub playlist_id: Option<DbId>,

    pub track_id: Option<DbId>,

    /// Event-specific data (error messages, final status, URLs).
    pub payload: serde_json::Value,

    pub timestamp: DateTime<Utc>,
}

impl GenerationEvent {
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            owner_id: None,
            playlist_id: None,
            track_id: None,
            payload: serde_json::Value::Object(Default::default()),
            timestamp: Utc::now(),
        }
    }

    pub fn with_owner(mut self, owner_id: Option<DbId>) -> Self {
        self.owner_id = owner_id;
        self
    }

    pub fn with_playlist(mut self, playlist_id: DbId) -> Self {
        self.playlist_id = Some(playlist_id);
        self
    }

    pub fn with_track(mut self, track_id: DbId) -> Self {
        self.track_id = Some(track_id);
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
/// use hyde_events::bus::{EventBus, GenerationEvent};
/// use hyde_events::names;
///
/// let bus = EventBus::default();
/// let mut rx = bus.subscribe();
///
/// bus.publish(GenerationEvent::new(names::GENERATION_STARTED));
/// ```
pub struct EventBus {
    sender: broadcast::Sender<GenerationEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// Slow receivers observe `RecvError::Lagged` once the buffer is full.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    pub fn publish(&self, event: GenerationEvent) {
        // A SendError only means there are no receivers.
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<GenerationEvent> {
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
    use crate::names;

    #[tokio::test]
    async fn subscriber_receives_enriched_event() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        bus.publish(
            GenerationEvent::new(names::TRACK_READY)
                .with_owner(Some(7))
                .with_playlist(42)
                .with_track(43)
                .with_payload(serde_json::json!({"audio_url": "https://cdn/a.mp3"})),
        );

        let received = rx.recv().await.expect("should receive the event");
        assert_eq!(received.event_type, "track.ready");
        assert_eq!(received.owner_id, Some(7));
        assert_eq!(received.playlist_id, Some(42));
        assert_eq!(received.track_id, Some(43));
        assert_eq!(received.payload["audio_url"], "https://cdn/a.mp3");
    }

    #[tokio::test]
    async fn every_subscriber_sees_the_event() {
        let bus = EventBus::default();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.publish(GenerationEvent::new(names::GENERATION_STARTED));

        assert_eq!(rx1.recv().await.unwrap().event_type, "generation.started");
        assert_eq!(rx2.recv().await.unwrap().event_type, "generation.started");
    }

    #[test]
    fn publish_without_subscribers_is_a_no_op() {
        let bus = EventBus::default();
        bus.publish(GenerationEvent::new(names::GENERATION_FAILED));
    }

    #[test]
    fn new_event_has_empty_optional_fields() {
        let event = GenerationEvent::new("bare.event");
        assert!(event.owner_id.is_none());
        assert!(event.playlist_id.is_none());
        assert!(event.track_id.is_none());
        assert!(event.payload.is_object());
    }
}
