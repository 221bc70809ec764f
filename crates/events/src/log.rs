//! Background subscriber that mirrors bus traffic into the tracing log.

use tokio::sync::broadcast;

use crate::bus::GenerationEvent;

/// Writes every received [`GenerationEvent`] as a structured log line.
pub struct EventLog;

impl EventLog {
    /// Run until the bus is dropped.
    pub async fn run(mut receiver: broadcast::Receiver<GenerationEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => Self::record(&event),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Event log lagged, some events were dropped");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, event log shutting down");
                    break;
                }
            }
        }
    }

    fn record(event: &GenerationEvent) {
        tracing::info!(
            event_type = %event.event_type,
            owner_id = ?event.owner_id,
            playlist_id = ?event.playlist_id,
            track_id = ?event.track_id,
            payload = %event.payload,
            "Generation event",
        );
    }
}
