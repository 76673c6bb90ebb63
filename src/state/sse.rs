use tokio::sync::broadcast;

use crate::dto::sse::StreamEvent;

/// Broadcast hub fanning one round's events out to its subscribers.
///
/// Delivery is at-least-once from a subscriber's point of view: a lagging
/// receiver skips messages rather than blocking the writer, which is safe
/// because every event carries a full snapshot to re-derive from.
pub struct SseHub {
    sender: broadcast::Sender<StreamEvent>,
}

impl SseHub {
    /// Construct a new hub backed by a Tokio broadcast channel.
    pub fn new(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Register a new subscriber that will receive subsequent events.
    pub fn subscribe(&self) -> broadcast::Receiver<StreamEvent> {
        self.sender.subscribe()
    }

    /// Send an event to all current subscribers, ignoring delivery errors
    /// (a hub with no subscribers is not an error).
    pub fn broadcast(&self, event: StreamEvent) {
        let _ = self.sender.send(event);
    }

    /// Number of currently attached subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
