use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{TimeZone, Utc};

use courtportal_core_types::{ManualClock, ProcessId, UserId};
use courtportal_event_bus::EventHub;
use courtportal_policy_center::default_policy;
use courtportal_registry::{Capability, NewProcess, RegistryImpl, Urgency, UserLogin};

pub(crate) fn registry() -> (Arc<RegistryImpl>, Arc<ManualClock>) {
    let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 6, 3, 8, 0, 0).unwrap());
    let hub = EventHub::detached(clock.clone());
    let registry = RegistryImpl::new(hub, clock.clone(), default_policy().notifications);
    (Arc::new(registry), clock)
}

pub(crate) fn judge(registry: &RegistryImpl, id: &str, level: u8) -> UserId {
    registry.login(UserLogin {
        id: UserId::from(id),
        name: format!("Judge {id}"),
        level,
        capabilities: BTreeSet::from([Capability::Judge]),
    });
    UserId::from(id)
}

pub(crate) fn pending(registry: &RegistryImpl, label: &str, urgency: Option<Urgency>) -> ProcessId {
    registry.create_process(NewProcess {
        process_type: "civil".into(),
        plaintiff: label.into(),
        defendant: "Defendant".into(),
        urgency,
        description: None,
    })
}
