pub mod channel;
pub mod hub;

use std::sync::Arc;

use tokio::sync::broadcast;

pub use channel::{BroadcastEnvelope, CrossInstanceChannel, SignalSlot};
pub use hub::{EventHub, Handler};

/// In-memory broadcast bus. Delivery is at-most-once: a receiver that falls
/// more than `capacity` events behind loses the oldest ones.
pub struct InMemoryBus<E> {
    sender: broadcast::Sender<E>,
}

impl<E> InMemoryBus<E>
where
    E: Clone + Send + 'static,
{
    pub fn new(capacity: usize) -> Arc<Self> {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Arc::new(Self { sender })
    }

    /// Returns the number of receivers reached.
    /// Sending with nobody subscribed reaches zero receivers and is not an error.
    pub fn send(&self, event: E) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<E> {
        self.sender.subscribe()
    }

    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
