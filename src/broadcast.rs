//! Local fan-out broadcaster.
//!
//! Best-effort, at-most-once: events are pushed to whoever is subscribed
//! right now, and nobody listening means the event is simply dropped. A
//! dashboard or ops tail can subscribe in-process.

use recibo_core::traits::Broadcaster;
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::debug;

const CHANNEL_CAPACITY: usize = 256;

/// One published event: the topic (a phone number) and its payload.
pub type BroadcastEvent = (String, Value);

pub struct LocalBroadcaster {
    tx: broadcast::Sender<BroadcastEvent>,
}

impl LocalBroadcaster {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    /// Subscribe to every event published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<BroadcastEvent> {
        self.tx.subscribe()
    }
}

impl Default for LocalBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

impl Broadcaster for LocalBroadcaster {
    fn publish(&self, topic: &str, event: Value) {
        // Err just means no subscribers; that is fine.
        if self.tx.send((topic.to_string(), event)).is_err() {
            debug!("no subscribers for broadcast on {topic}");
        }
    }
}

/// Broadcaster that drops everything, for tests and one-shot commands.
pub struct NullBroadcaster;

impl Broadcaster for NullBroadcaster {
    fn publish(&self, _topic: &str, _event: Value) {}
}
