use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::warn;

use courtportal_core_types::{EventKind, InstanceId, PortalError};

use crate::InMemoryBus;

/// The `{event, data, timestamp}` record carried between instances.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BroadcastEnvelope {
    pub event: EventKind,
    pub data: serde_json::Value,
    pub timestamp: DateTime<Utc>,
    pub origin: InstanceId,
}

/// Durable landing spot for the most recent envelope.
pub trait SignalSlot: Send + Sync {
    fn write(&self, envelope: &BroadcastEnvelope) -> Result<(), PortalError>;
}

/// Broadcast channel shared by every instance attached to the same storage.
pub struct CrossInstanceChannel {
    bus: Arc<InMemoryBus<BroadcastEnvelope>>,
    signal: RwLock<Option<Arc<dyn SignalSlot>>>,
    last: Mutex<Option<BroadcastEnvelope>>,
}

impl CrossInstanceChannel {
    pub fn new(capacity: usize) -> Arc<Self> {
        Arc::new(Self {
            bus: InMemoryBus::new(capacity),
            signal: RwLock::new(None),
            last: Mutex::new(None),
        })
    }

    pub fn with_signal_slot(capacity: usize, slot: Arc<dyn SignalSlot>) -> Arc<Self> {
        let channel = Self::new(capacity);
        channel.set_signal_slot(slot);
        channel
    }

    pub fn set_signal_slot(&self, slot: Arc<dyn SignalSlot>) {
        *self.signal.write() = Some(slot);
    }

    /// Records the envelope as the latest signal and fans it out to every
    /// subscribed instance.
    pub fn broadcast(&self, envelope: BroadcastEnvelope) -> usize {
        let slot = self.signal.read().clone();
        if let Some(slot) = slot {
            if let Err(err) = slot.write(&envelope) {
                warn!(event = %envelope.event, "signal slot write failed: {err}");
            }
        }
        *self.last.lock() = Some(envelope.clone());
        self.bus.send(envelope)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BroadcastEnvelope> {
        self.bus.subscribe()
    }

    pub fn last_signal(&self) -> Option<BroadcastEnvelope> {
        self.last.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Default)]
    struct RecordingSlot {
        written: Mutex<Vec<EventKind>>,
    }

    impl SignalSlot for RecordingSlot {
        fn write(&self, envelope: &BroadcastEnvelope) -> Result<(), PortalError> {
            self.written.lock().push(envelope.event);
            Ok(())
        }
    }

    fn envelope(event: EventKind) -> BroadcastEnvelope {
        BroadcastEnvelope {
            event,
            data: json!({ "id": "proc_1" }),
            timestamp: Utc::now(),
            origin: InstanceId::new(),
        }
    }

    #[tokio::test]
    async fn broadcast_reaches_subscribers_and_signal_slot() {
        let slot = Arc::new(RecordingSlot::default());
        let channel = CrossInstanceChannel::with_signal_slot(8, slot.clone());
        let mut rx = channel.subscribe();

        let reached = channel.broadcast(envelope(EventKind::ProcessCreated));
        assert_eq!(reached, 1);

        let received = rx.recv().await.unwrap();
        assert_eq!(received.event, EventKind::ProcessCreated);
        assert_eq!(slot.written.lock().as_slice(), &[EventKind::ProcessCreated]);
        assert_eq!(
            channel.last_signal().map(|env| env.event),
            Some(EventKind::ProcessCreated)
        );
    }

    #[tokio::test]
    async fn lagging_subscriber_loses_oldest() {
        let channel = CrossInstanceChannel::new(2);
        let mut rx = channel.subscribe();
        channel.broadcast(envelope(EventKind::ProcessCreated));
        channel.broadcast(envelope(EventKind::ProcessUpdated));
        channel.broadcast(envelope(EventKind::UserLogin));

        assert!(matches!(
            rx.recv().await,
            Err(broadcast::error::RecvError::Lagged(1))
        ));
        assert_eq!(rx.recv().await.unwrap().event, EventKind::ProcessUpdated);
        assert_eq!(rx.recv().await.unwrap().event, EventKind::UserLogin);
    }
}
