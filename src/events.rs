//! Connection notifications

use tokio::sync::broadcast;

/// Capacity of each store's event channel. Slow subscribers skip ahead
/// rather than holding up the client.
pub(crate) const EVENT_CHANNEL_CAPACITY: usize = 16;

/// Connection state changes reported by the key-value client.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreEvent {
    /// The client (re)connected to the store.
    Connect,
    /// The client lost its connection or hit a connection error.
    Disconnect,
}

/// Handle a [`KeyValueClient`](crate::client::KeyValueClient) uses to publish
/// [`StoreEvent`]s to the store's subscribers.
#[derive(Clone, Debug)]
pub struct EventSender {
    tx: broadcast::Sender<StoreEvent>,
}

impl EventSender {
    pub(crate) fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { tx }
    }

    /// Publish an event. Events sent while nobody is subscribed are dropped.
    pub fn send(&self, event: StoreEvent) {
        match event {
            StoreEvent::Connect => tracing::info!("Session store connected"),
            StoreEvent::Disconnect => tracing::info!("Session store disconnected"),
        }
        let _ = self.tx.send(event);
    }

    pub(crate) fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.tx.subscribe()
    }
}
