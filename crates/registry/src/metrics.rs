use lazy_static::lazy_static;
use prometheus::{core::Collector, opts, IntCounter, IntGauge, IntGaugeVec, Registry};
use tracing::error;

use crate::stats::PortalStats;

lazy_static! {
    static ref PORTAL_PROCESSES: IntGaugeVec = IntGaugeVec::new(
        opts!("courtportal_processes", "Processes grouped by status"),
        &["status"]
    )
    .unwrap();
    static ref PORTAL_USERS_TOTAL: IntGauge =
        IntGauge::new("courtportal_users_total", "Known users").unwrap();
    static ref PORTAL_USERS_ONLINE: IntGauge =
        IntGauge::new("courtportal_users_online", "Users currently online").unwrap();
    static ref PORTAL_NOTIFICATIONS: IntGauge =
        IntGauge::new("courtportal_notifications", "Notifications in the log").unwrap();
    static ref PORTAL_PROCESSES_CREATED: IntCounter = IntCounter::new(
        "courtportal_processes_created_total",
        "Processes registered since start",
    )
    .unwrap();
    static ref PORTAL_NOTIFICATIONS_PRUNED: IntCounter = IntCounter::new(
        "courtportal_notifications_pruned_total",
        "Notifications dropped by retention",
    )
    .unwrap();
}

fn register<C>(registry: &Registry, collector: C)
where
    C: Collector + Clone + Send + Sync + 'static,
{
    if let Err(err) = registry.register(Box::new(collector.clone())) {
        if !matches!(err, prometheus::Error::AlreadyReg) {
            error!(?err, "failed to register portal metric");
        }
    }
}

pub fn register_metrics(registry: &Registry) {
    register(registry, PORTAL_PROCESSES.clone());
    register(registry, PORTAL_USERS_TOTAL.clone());
    register(registry, PORTAL_USERS_ONLINE.clone());
    register(registry, PORTAL_NOTIFICATIONS.clone());
    register(registry, PORTAL_PROCESSES_CREATED.clone());
    register(registry, PORTAL_NOTIFICATIONS_PRUNED.clone());
}

pub fn observe_stats(stats: &PortalStats) {
    PORTAL_PROCESSES
        .with_label_values(&["pending"])
        .set(stats.pending as i64);
    PORTAL_PROCESSES
        .with_label_values(&["in_progress"])
        .set(stats.in_progress as i64);
    PORTAL_PROCESSES
        .with_label_values(&["concluded"])
        .set(stats.concluded as i64);
    PORTAL_USERS_TOTAL.set(stats.total_users as i64);
    PORTAL_USERS_ONLINE.set(stats.online_users as i64);
    PORTAL_NOTIFICATIONS.set(stats.notifications as i64);
}

pub fn record_process_created() {
    PORTAL_PROCESSES_CREATED.inc();
}

pub fn record_notifications_pruned(count: usize) {
    PORTAL_NOTIFICATIONS_PRUNED.inc_by(count as u64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_once_and_tolerates_repeats() {
        let registry = Registry::new();
        register_metrics(&registry);
        register_metrics(&registry);
        observe_stats(&PortalStats {
            pending: 3,
            ..PortalStats::default()
        });
        let families = registry.gather();
        assert!(families
            .iter()
            .any(|family| family.get_name() == "courtportal_processes"));
    }
}
