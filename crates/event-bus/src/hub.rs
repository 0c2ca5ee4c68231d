use std::collections::HashMap;
use std::panic;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, warn};

use courtportal_core_types::{Clock, EventKind, InstanceId, PortalError, SystemClock};

use crate::channel::{BroadcastEnvelope, CrossInstanceChannel};

pub type Handler = Arc<dyn Fn(&BroadcastEnvelope) -> Result<(), PortalError> + Send + Sync>;

/// Named-listener registry for one portal instance.
///
/// Handlers for an event run synchronously in registration order. A failing
/// or panicking handler is logged and skipped. Every publish is forwarded to
/// the attached cross-instance channel after the local handlers ran.
pub struct EventHub {
    origin: InstanceId,
    listeners: RwLock<HashMap<EventKind, Vec<Handler>>>,
    channel: Option<Arc<CrossInstanceChannel>>,
    held: Mutex<Option<Vec<BroadcastEnvelope>>>,
    clock: Arc<dyn Clock>,
}

impl EventHub {
    pub fn new() -> Arc<Self> {
        Self::build(None, SystemClock::shared())
    }

    pub fn with_channel(channel: Arc<CrossInstanceChannel>, clock: Arc<dyn Clock>) -> Arc<Self> {
        Self::build(Some(channel), clock)
    }

    pub fn detached(clock: Arc<dyn Clock>) -> Arc<Self> {
        Self::build(None, clock)
    }

    fn build(channel: Option<Arc<CrossInstanceChannel>>, clock: Arc<dyn Clock>) -> Arc<Self> {
        Arc::new(Self {
            origin: InstanceId::new(),
            listeners: RwLock::new(HashMap::new()),
            channel,
            held: Mutex::new(None),
            clock,
        })
    }

    pub fn origin(&self) -> &InstanceId {
        &self.origin
    }

    pub fn channel(&self) -> Option<Arc<CrossInstanceChannel>> {
        self.channel.clone()
    }

    pub fn subscribe<F>(&self, kind: EventKind, handler: F)
    where
        F: Fn(&BroadcastEnvelope) -> Result<(), PortalError> + Send + Sync + 'static,
    {
        self.listeners
            .write()
            .entry(kind)
            .or_default()
            .push(Arc::new(handler));
    }

    /// Queues channel forwarding until `release_forwarding`. Local handlers
    /// still run immediately.
    pub fn hold_forwarding(&self) {
        self.held.lock().get_or_insert_with(Vec::new);
    }

    /// Forwards every queued envelope in publish order and resumes direct
    /// forwarding. Returns how many envelopes were released.
    pub fn release_forwarding(&self) -> usize {
        let queued = self.held.lock().take().unwrap_or_default();
        let count = queued.len();
        for envelope in queued {
            self.forward(envelope);
        }
        count
    }

    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.listeners.read().get(&kind).map(Vec::len).unwrap_or(0)
    }

    /// Returns the number of local handlers that completed without error.
    pub fn publish(&self, kind: EventKind, data: serde_json::Value) -> usize {
        let envelope = BroadcastEnvelope {
            event: kind,
            data,
            timestamp: self.clock.now(),
            origin: self.origin.clone(),
        };

        // handlers may subscribe or publish re-entrantly
        let handlers: Vec<Handler> = self
            .listeners
            .read()
            .get(&kind)
            .cloned()
            .unwrap_or_default();

        let mut succeeded = 0;
        for (index, handler) in handlers.iter().enumerate() {
            match panic::catch_unwind(panic::AssertUnwindSafe(|| handler(&envelope))) {
                Ok(Ok(())) => succeeded += 1,
                Ok(Err(err)) => warn!(event = %kind, index, "event handler failed: {err}"),
                Err(_) => warn!(event = %kind, index, "event handler panicked; continuing"),
            }
        }

        if let Some(queue) = self.held.lock().as_mut() {
            queue.push(envelope);
            return succeeded;
        }
        self.forward(envelope);
        succeeded
    }

    fn forward(&self, envelope: BroadcastEnvelope) {
        if let Some(channel) = &self.channel {
            let kind = envelope.event;
            let reached = channel.broadcast(envelope);
            debug!(event = %kind, reached, "forwarded to cross-instance channel");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn handlers_run_in_registration_order() {
        let hub = EventHub::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        for tag in ["first", "second", "third"] {
            let seen = Arc::clone(&seen);
            hub.subscribe(EventKind::ProcessCreated, move |_| {
                seen.lock().push(tag);
                Ok(())
            });
        }

        let ok = hub.publish(EventKind::ProcessCreated, json!({}));
        assert_eq!(ok, 3);
        assert_eq!(seen.lock().as_slice(), &["first", "second", "third"]);
    }

    #[test]
    fn failing_handlers_do_not_stop_the_rest() {
        let hub = EventHub::new();
        let reached = Arc::new(Mutex::new(0u32));

        hub.subscribe(EventKind::UserLogin, |_| Err(PortalError::new("boom")));
        hub.subscribe(EventKind::UserLogin, |_| panic!("handler exploded"));
        {
            let reached = Arc::clone(&reached);
            hub.subscribe(EventKind::UserLogin, move |envelope| {
                assert_eq!(envelope.data["user"], "u1");
                *reached.lock() += 1;
                Ok(())
            });
        }

        let ok = hub.publish(EventKind::UserLogin, json!({ "user": "u1" }));
        assert_eq!(ok, 1);
        assert_eq!(*reached.lock(), 1);
    }

    #[test]
    fn other_events_are_not_delivered() {
        let hub = EventHub::new();
        hub.subscribe(EventKind::UserLogout, |_| panic!("wrong event"));
        assert_eq!(hub.publish(EventKind::UserLogin, json!({})), 0);
        assert_eq!(hub.listener_count(EventKind::UserLogout), 1);
    }

    #[tokio::test]
    async fn publish_forwards_to_channel_with_origin() {
        let channel = CrossInstanceChannel::new(8);
        let mut rx = channel.subscribe();
        let hub = EventHub::with_channel(Arc::clone(&channel), SystemClock::shared());

        hub.publish(EventKind::ProcessUpdated, json!({ "processId": "p" }));

        let envelope = rx.recv().await.unwrap();
        assert_eq!(envelope.event, EventKind::ProcessUpdated);
        assert_eq!(&envelope.origin, hub.origin());
        assert_eq!(envelope.data["processId"], "p");
    }

    #[tokio::test]
    async fn held_envelopes_reach_the_channel_only_on_release() {
        let channel = CrossInstanceChannel::new(8);
        let mut rx = channel.subscribe();
        let hub = EventHub::with_channel(Arc::clone(&channel), SystemClock::shared());
        let local = Arc::new(Mutex::new(0u32));
        {
            let local = Arc::clone(&local);
            hub.subscribe(EventKind::ProcessCreated, move |_| {
                *local.lock() += 1;
                Ok(())
            });
        }

        hub.hold_forwarding();
        hub.publish(EventKind::ProcessCreated, json!({ "processId": "a" }));
        hub.publish(EventKind::ProcessCreated, json!({ "processId": "b" }));
        assert_eq!(*local.lock(), 2);
        assert!(rx.try_recv().is_err());
        assert!(channel.last_signal().is_none());

        assert_eq!(hub.release_forwarding(), 2);
        assert_eq!(rx.recv().await.unwrap().data["processId"], "a");
        assert_eq!(rx.recv().await.unwrap().data["processId"], "b");

        hub.publish(EventKind::UserLogin, json!({}));
        assert_eq!(rx.recv().await.unwrap().event, EventKind::UserLogin);
        assert_eq!(hub.release_forwarding(), 0);
    }
}
