use tokio::sync::broadcast;

use crate::dto::sse::ServerEvent;

/// Both SSE streams exposed to dashboards, carved out from [`super::AppState`].
pub struct SseState {
    scoreboard: SseHub,
    live: SseHub,
}

impl SseState {
    /// Build the SSE sub-tree with the same channel capacity for both streams.
    pub fn new(capacity: usize) -> Self {
        Self {
            scoreboard: SseHub::new(capacity),
            live: SseHub::new(capacity),
        }
    }

    /// Hub carrying scoreboard snapshots.
    pub fn scoreboard(&self) -> &SseHub {
        &self.scoreboard
    }

    /// Hub carrying live feed events.
    pub fn live(&self) -> &SseHub {
        &self.live
    }
}

/// Simple broadcast hub wrapper used by the SSE services.
pub struct SseHub {
    sender: broadcast::Sender<ServerEvent>,
}

impl SseHub {
    /// Construct a new hub backed by a Tokio broadcast channel with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Register a new subscriber that will receive subsequent events.
    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.sender.subscribe()
    }

    /// Send an event to all current subscribers, ignoring delivery errors.
    pub fn broadcast(&self, event: ServerEvent) {
        let _ = self.sender.send(event);
    }

    /// Number of connected subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
