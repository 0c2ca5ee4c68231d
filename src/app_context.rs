//! Application context wiring the portal crates together.
//!
//! One context is one portal instance. Instances that share a storage slot
//! and a cross-instance channel observe each other's changes.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use courtportal_core_types::{Clock, EventKind, InstanceId, PortalError};
use courtportal_event_bus::{BroadcastEnvelope, CrossInstanceChannel, EventHub};
use courtportal_policy_center::PortalPolicy;
use courtportal_registry::{CounterDisplay, PortalSnapshot, PortalStats, RegistryImpl};
use courtportal_scheduler::{AutoDistributor, PortalSync, SyncDriver, TickReport};
use courtportal_state_center::{SnapshotStore, StorageSignalSlot, StorageSlot};

use crate::errors::AppError;

pub struct AppContext {
    policy: PortalPolicy,
    hub: Arc<EventHub>,
    registry: Arc<RegistryImpl>,
    store: SnapshotStore<PortalSnapshot>,
    sync: Arc<PortalSync<RegistryImpl>>,
    driver: SyncDriver<RegistryImpl>,
    background_tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl AppContext {
    /// Builds an instance, restoring the stored snapshot or seeding the
    /// sample processes when none can be read.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(
        policy: PortalPolicy,
        storage: Arc<dyn StorageSlot>,
        channel: Arc<CrossInstanceChannel>,
        clock: Arc<dyn Clock>,
        display: Option<Arc<dyn CounterDisplay>>,
    ) -> Result<Arc<Self>, AppError> {
        channel.set_signal_slot(StorageSignalSlot::new(
            Arc::clone(&storage),
            policy.storage.signal_key.clone(),
        ));
        let hub = EventHub::with_channel(Arc::clone(&channel), Arc::clone(&clock));
        let registry = Arc::new(RegistryImpl::new(
            Arc::clone(&hub),
            clock,
            policy.notifications.clone(),
        ));
        if let Some(display) = display {
            registry.set_display(display);
        }

        let store = SnapshotStore::new(storage, policy.storage.state_key.clone());
        match store.load() {
            Some(snapshot) => {
                registry.restore(snapshot);
                info!(key = store.key(), "restored portal state");
            }
            None => {
                // seed envelopes leave this instance only after the save
                hub.hold_forwarding();
                registry.seed_samples();
                let saved = store.save(&registry.snapshot());
                hub.release_forwarding();
                saved?;
            }
        }

        register_persistence(&hub, &registry, &store);

        let sync = Arc::new(PortalSync::new(
            Arc::clone(&registry),
            AutoDistributor::new(policy.distribution.clone()),
        ));
        {
            let registry = Arc::downgrade(&registry);
            let store = store.clone();
            sync.add_hook(Arc::new(move |_: &TickReport| {
                if let Some(registry) = registry.upgrade() {
                    if let Err(err) = store.save(&registry.snapshot()) {
                        warn!("failed to save state after sync: {err}");
                    }
                }
            }));
        }
        let driver = SyncDriver::new(Arc::clone(&sync), policy.sync.interval());

        let listener = spawn_reload_listener(
            &channel,
            hub.origin().clone(),
            Arc::downgrade(&registry),
            store.clone(),
        );

        info!(instance = %hub.origin(), "portal context ready");
        Ok(Arc::new(Self {
            policy,
            hub,
            registry,
            store,
            sync,
            driver,
            background_tasks: Mutex::new(vec![listener]),
        }))
    }

    pub fn policy(&self) -> &PortalPolicy {
        &self.policy
    }

    pub fn origin(&self) -> &InstanceId {
        self.hub.origin()
    }

    pub fn hub(&self) -> &Arc<EventHub> {
        &self.hub
    }

    pub fn registry(&self) -> &Arc<RegistryImpl> {
        &self.registry
    }

    pub fn sync(&self) -> &Arc<PortalSync<RegistryImpl>> {
        &self.sync
    }

    pub fn driver(&self) -> &SyncDriver<RegistryImpl> {
        &self.driver
    }

    pub fn subscribe<F>(&self, kind: EventKind, handler: F)
    where
        F: Fn(&BroadcastEnvelope) -> Result<(), PortalError> + Send + Sync + 'static,
    {
        self.hub.subscribe(kind, handler);
    }

    pub fn stats(&self) -> PortalStats {
        self.registry.stats()
    }

    /// Runs one sync tick immediately.
    pub fn force_sync(&self) -> Result<TickReport, AppError> {
        Ok(self.driver.force_sync()?)
    }

    pub async fn start_sync(&self) -> Result<(), AppError> {
        Ok(self.driver.start().await?)
    }

    pub async fn stop_sync(&self) -> bool {
        self.driver.stop().await
    }

    pub fn save(&self) -> Result<(), AppError> {
        Ok(self.store.save(&self.registry.snapshot())?)
    }

    /// Replaces the in-memory state with the stored snapshot. Returns
    /// `false` and keeps the current state when nothing readable is stored.
    pub fn reload(&self) -> bool {
        match self.store.load() {
            Some(snapshot) => {
                self.registry.restore(snapshot);
                true
            }
            None => false,
        }
    }

    pub async fn shutdown(&self) -> Result<(), AppError> {
        self.driver.stop().await;
        self.save()?;
        for task in self.background_tasks.lock().drain(..) {
            task.abort();
        }
        info!(instance = %self.origin(), "portal context shut down");
        Ok(())
    }
}

impl Drop for AppContext {
    fn drop(&mut self) {
        for task in self.background_tasks.get_mut().drain(..) {
            task.abort();
        }
    }
}

fn register_persistence(
    hub: &EventHub,
    registry: &Arc<RegistryImpl>,
    store: &SnapshotStore<PortalSnapshot>,
) {
    for kind in EventKind::ALL.into_iter().filter(|kind| kind.is_mutation()) {
        let registry: Weak<RegistryImpl> = Arc::downgrade(registry);
        let store = store.clone();
        hub.subscribe(kind, move |_| {
            let Some(registry) = registry.upgrade() else {
                return Ok(());
            };
            store
                .save(&registry.snapshot())
                .map_err(|err| PortalError::new(format!("persist after {kind}: {err}")))
        });
    }
}

/// Reloads from storage whenever a sibling instance announces a change on
/// the reload allow-list. Own envelopes are ignored.
fn spawn_reload_listener(
    channel: &CrossInstanceChannel,
    origin: InstanceId,
    registry: Weak<RegistryImpl>,
    store: SnapshotStore<PortalSnapshot>,
) -> JoinHandle<()> {
    let mut receiver = channel.subscribe();
    tokio::spawn(async move {
        loop {
            match receiver.recv().await {
                Ok(envelope) => {
                    if envelope.origin == origin || !envelope.event.triggers_reload() {
                        continue;
                    }
                    let Some(registry) = registry.upgrade() else {
                        break;
                    };
                    match store.load() {
                        Some(snapshot) => {
                            registry.restore(snapshot);
                            debug!(
                                event = %envelope.event,
                                from = %envelope.origin,
                                "reloaded state after sibling change"
                            );
                        }
                        None => warn!(event = %envelope.event, "sibling change but no readable snapshot"),
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "cross-instance listener lagged; signals dropped");
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}
