use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::info;

use courtportal_core_types::{ProcessId, UserId};

use crate::{
    metrics,
    model::{NewProcess, Notification, Process, ProcessFilter, Urgency, User, UserFilter},
    state::RegistryImpl,
};

/// Whole-state image persisted under the state key.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortalSnapshot {
    pub processes: Vec<(ProcessId, Process)>,
    pub users: Vec<(UserId, User)>,
    pub notifications: Vec<Notification>,
    pub last_sync: Option<DateTime<Utc>>,
}

impl RegistryImpl {
    pub fn snapshot(&self) -> PortalSnapshot {
        PortalSnapshot {
            processes: self
                .processes(&ProcessFilter::default())
                .into_iter()
                .map(|process| (process.id.clone(), process))
                .collect(),
            users: self
                .users(&UserFilter::default())
                .into_iter()
                .map(|user| (user.id.clone(), user))
                .collect(),
            notifications: self.notifications.read().clone(),
            last_sync: self.last_sync(),
        }
    }

    /// Replaces every collection with the snapshot contents. Emits nothing.
    pub fn restore(&self, snapshot: PortalSnapshot) {
        self.processes.clear();
        for (id, process) in snapshot.processes {
            self.processes.insert(id, Arc::new(RwLock::new(process)));
        }
        self.users.clear();
        for (id, user) in snapshot.users {
            self.users.insert(id, Arc::new(RwLock::new(user)));
        }
        *self.notifications.write() = snapshot.notifications;
        *self.last_sync.write() = snapshot.last_sync;
        metrics::observe_stats(&self.stats());
    }

    /// Registers the two illustrative processes used when no prior state exists.
    pub fn seed_samples(&self) -> Vec<ProcessId> {
        let samples = [
            NewProcess {
                process_type: "Cível".into(),
                plaintiff: "Maria Silva".into(),
                defendant: "Banco Central S.A.".into(),
                urgency: Some(Urgency::Alta),
                description: Some("Revisão de contrato bancário".into()),
            },
            NewProcess {
                process_type: "Trabalhista".into(),
                plaintiff: "João Santos".into(),
                defendant: "Empresa XYZ Ltda".into(),
                urgency: Some(Urgency::Media),
                description: Some("Reclamação de horas extras".into()),
            },
        ];
        let ids: Vec<_> = samples
            .into_iter()
            .map(|sample| self.create_process(sample))
            .collect();
        info!(count = ids.len(), "seeded sample processes");
        ids
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use courtportal_core_types::UserId;

    use super::*;
    use crate::model::{Capability, NewNotification, NotificationKind, ProcessStatus, UserLogin};
    use crate::state::testing::registry;

    #[test]
    fn save_then_restore_reproduces_collections() {
        let (source, clock) = registry();
        let ids = source.seed_samples();
        source.login(UserLogin {
            id: UserId::from("j1"),
            name: "Judge".into(),
            level: 5,
            capabilities: BTreeSet::from([Capability::Judge]),
        });
        source.assume_process(&ids[0], &UserId::from("j1"), "Judge");
        source.create_notification(NewNotification::broadcast(
            NotificationKind::System,
            "hello",
            "world",
        ));
        source.record_sync(courtportal_core_types::Clock::now(clock.as_ref()));

        let snapshot = source.snapshot();
        let encoded = serde_json::to_string(&snapshot).unwrap();
        let decoded: PortalSnapshot = serde_json::from_str(&encoded).unwrap();

        let (target, _clock) = registry();
        target.restore(decoded);
        assert_eq!(target.snapshot(), snapshot);
        assert_eq!(
            target.process(&ids[0]).unwrap().status,
            ProcessStatus::InProgress
        );
    }

    #[test]
    fn wire_shape_uses_pairs_and_camel_case() {
        let (registry, _clock) = registry();
        registry.seed_samples();
        let value = serde_json::to_value(registry.snapshot()).unwrap();
        let first = &value["processes"][0];
        assert!(first.is_array());
        assert_eq!(first[0], first[1]["id"]);
        assert!(first[1].get("caseNumber").is_some());
        assert!(value.get("lastSync").is_some());
    }

    #[test]
    fn restore_emits_no_events() {
        let (source, _clock) = registry();
        source.seed_samples();
        let snapshot = source.snapshot();

        let (target, _clock) = registry();
        let seen = Arc::new(parking_lot::Mutex::new(0usize));
        for kind in courtportal_core_types::EventKind::ALL {
            let seen = Arc::clone(&seen);
            target.hub().subscribe(kind, move |_| {
                *seen.lock() += 1;
                Ok(())
            });
        }
        target.restore(snapshot);
        assert_eq!(*seen.lock(), 0);
        assert_eq!(target.processes(&ProcessFilter::default()).len(), 2);
    }
}
