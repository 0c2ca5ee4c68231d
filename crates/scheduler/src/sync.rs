use std::panic;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::json;
use tracing::{debug, warn};

use courtportal_core_types::EventKind;
use courtportal_registry::Registry;

use crate::distribution::AutoDistributor;
use crate::model::TickReport;

pub type AfterTickHook = Arc<dyn Fn(&TickReport) + Send + Sync>;

/// One sync tick over a registry: counters and retention, the
/// `system_sync` broadcast, distribution, then activity refresh.
pub struct PortalSync<R>
where
    R: Registry + ?Sized,
{
    registry: Arc<R>,
    distributor: AutoDistributor,
    hooks: RwLock<Vec<AfterTickHook>>,
}

impl<R> PortalSync<R>
where
    R: Registry + ?Sized,
{
    pub fn new(registry: Arc<R>, distributor: AutoDistributor) -> Self {
        Self {
            registry,
            distributor,
            hooks: RwLock::new(Vec::new()),
        }
    }

    pub fn registry(&self) -> &Arc<R> {
        &self.registry
    }

    pub fn distributor(&self) -> &AutoDistributor {
        &self.distributor
    }

    /// Hooks run after the tick's own work, in registration order.
    pub fn add_hook(&self, hook: AfterTickHook) {
        self.hooks.write().push(hook);
    }

    pub fn tick(&self) -> TickReport {
        let registry = self.registry.as_ref();
        let at = registry.now();

        let stats = registry.record_sync(at);
        let pruned = registry.prune_notifications(at);
        registry.publish(
            EventKind::SystemSync,
            json!({ "timestamp": at, "stats": &stats }),
        );

        let assigned = self.distributor.run(registry);
        let refreshed_users = registry.refresh_activity();

        let report = TickReport {
            at,
            stats,
            pruned,
            assigned,
            refreshed_users,
        };
        debug!(
            pruned,
            assigned = report.assigned.len(),
            refreshed_users,
            "sync tick finished"
        );

        let hooks = self.hooks.read().clone();
        for (index, hook) in hooks.iter().enumerate() {
            if panic::catch_unwind(panic::AssertUnwindSafe(|| hook(&report))).is_err() {
                warn!(index, "after-tick hook panicked");
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use parking_lot::Mutex;

    use courtportal_core_types::Clock;
    use courtportal_policy_center::default_policy;
    use courtportal_registry::{NewNotification, NotificationKind, RegistryImpl};

    use super::*;
    use crate::testing::{judge, pending, registry};

    fn portal_sync(registry: Arc<RegistryImpl>) -> PortalSync<RegistryImpl> {
        PortalSync::new(registry, AutoDistributor::new(default_policy().distribution))
    }

    #[test]
    fn tick_steps_run_in_order() {
        let (registry, _clock) = registry();
        pending(&registry, "p", None);
        judge(&registry, "j1", 5);

        let order = Arc::new(Mutex::new(Vec::new()));
        for kind in [
            EventKind::StatsUpdated,
            EventKind::SystemSync,
            EventKind::ProcessUpdated,
        ] {
            let order = Arc::clone(&order);
            registry.hub().subscribe(kind, move |envelope| {
                order.lock().push(envelope.event);
                Ok(())
            });
        }
        let sync = portal_sync(Arc::clone(&registry));
        {
            let order = Arc::clone(&order);
            sync.add_hook(Arc::new(move |report: &TickReport| {
                assert_eq!(report.assigned.len(), 1);
                order.lock().push(EventKind::SystemSync);
            }));
        }

        let report = sync.tick();
        assert_eq!(report.refreshed_users, 1);
        assert_eq!(
            *order.lock(),
            vec![
                EventKind::StatsUpdated,
                EventKind::SystemSync,
                EventKind::ProcessUpdated,
                EventKind::SystemSync,
            ]
        );
        assert_eq!(registry.last_sync(), Some(report.at));
    }

    #[test]
    fn tick_applies_retention_window() {
        let (registry, clock) = registry();
        let start = clock.now();
        registry.create_notification(NewNotification::broadcast(
            NotificationKind::System,
            "old",
            "",
        ));
        clock.set(start + Duration::hours(2));
        registry.create_notification(NewNotification::broadcast(
            NotificationKind::System,
            "recent",
            "",
        ));

        clock.set(start + Duration::hours(25));
        let report = portal_sync(Arc::clone(&registry)).tick();
        assert_eq!(report.pruned, 1);
        let titles: Vec<_> = registry
            .notifications_for(None)
            .into_iter()
            .map(|n| n.title)
            .collect();
        assert_eq!(titles, vec!["recent"]);
    }

    #[test]
    fn panicking_hook_does_not_stop_later_hooks() {
        let (registry, _clock) = registry();
        let sync = portal_sync(registry);
        let ran = Arc::new(Mutex::new(false));
        sync.add_hook(Arc::new(|_: &TickReport| panic!("hook failure")));
        {
            let ran = Arc::clone(&ran);
            sync.add_hook(Arc::new(move |_: &TickReport| *ran.lock() = true));
        }
        sync.tick();
        assert!(*ran.lock());
    }
}
