use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::RwLock;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use courtportal_core_types::{
    Clock, EventKind, NotificationId, ProcessId, RequestId, UserId,
};
use courtportal_event_bus::EventHub;
use courtportal_policy_center::NotificationPolicy;

use crate::{
    api::Registry,
    errors::RegistryError,
    model::{
        NewNotification, NewProcess, Notification, Process, ProcessFilter, User, UserFilter,
        UserLogin,
    },
    patch::ProcessPatch,
    stats::{CounterDisplay, PortalStats},
};

/// In-memory registry of processes, users and notifications for one
/// portal instance.
pub struct RegistryImpl {
    pub(crate) processes: DashMap<ProcessId, Arc<RwLock<Process>>>,
    pub(crate) users: DashMap<UserId, Arc<RwLock<User>>>,
    pub(crate) notifications: RwLock<Vec<Notification>>,
    pub(crate) last_sync: RwLock<Option<DateTime<Utc>>>,
    hub: Arc<EventHub>,
    clock: Arc<dyn Clock>,
    policy: RwLock<NotificationPolicy>,
    display: RwLock<Option<Arc<dyn CounterDisplay>>>,
}

impl RegistryImpl {
    pub fn new(hub: Arc<EventHub>, clock: Arc<dyn Clock>, policy: NotificationPolicy) -> Self {
        Self {
            processes: DashMap::new(),
            users: DashMap::new(),
            notifications: RwLock::new(Vec::new()),
            last_sync: RwLock::new(None),
            hub,
            clock,
            policy: RwLock::new(policy),
            display: RwLock::new(None),
        }
    }

    pub fn hub(&self) -> &Arc<EventHub> {
        &self.hub
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn notification_policy(&self) -> NotificationPolicy {
        self.policy.read().clone()
    }

    pub fn update_notification_policy(&self, policy: NotificationPolicy) {
        *self.policy.write() = policy;
    }

    /// Counter elements are rewritten on every `refresh_stats`.
    pub fn set_display(&self, display: Arc<dyn CounterDisplay>) {
        *self.display.write() = Some(display);
    }

    pub(crate) fn display(&self) -> Option<Arc<dyn CounterDisplay>> {
        self.display.read().clone()
    }

    /// Publishes `payload` on the hub. Must be called with no record lock held.
    pub(crate) fn emit<T: Serialize>(&self, kind: EventKind, payload: &T) -> usize {
        match serde_json::to_value(payload) {
            Ok(data) => self.hub.publish(kind, data),
            Err(err) => {
                warn!(event = %kind, "failed to encode event payload: {err}");
                0
            }
        }
    }

    pub(crate) fn ensure_process(
        &self,
        id: &ProcessId,
    ) -> Result<Arc<RwLock<Process>>, RegistryError> {
        self.processes
            .get(id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| RegistryError::NotFound(format!("process {id}")))
    }

    pub(crate) fn ensure_user(&self, id: &UserId) -> Result<Arc<RwLock<User>>, RegistryError> {
        self.users
            .get(id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| RegistryError::NotFound(format!("user {id}")))
    }
}

impl Registry for RegistryImpl {
    fn now(&self) -> DateTime<Utc> {
        RegistryImpl::now(self)
    }

    fn create_process(&self, data: NewProcess) -> ProcessId {
        RegistryImpl::create_process(self, data)
    }

    fn update_process(&self, id: &ProcessId, patch: ProcessPatch, actor: &str) -> bool {
        RegistryImpl::update_process(self, id, patch, actor)
    }

    fn assume_process(&self, id: &ProcessId, judge_id: &UserId, judge_name: &str) -> bool {
        RegistryImpl::assume_process(self, id, judge_id, judge_name)
    }

    fn request_lawyer(
        &self,
        id: &ProcessId,
        judge_id: &UserId,
        lawyer_id: &UserId,
        reason: &str,
    ) -> Option<RequestId> {
        RegistryImpl::request_lawyer(self, id, judge_id, lawyer_id, reason)
    }

    fn processes(&self, filter: &ProcessFilter) -> Vec<Process> {
        RegistryImpl::processes(self, filter)
    }

    fn workload(&self, judge: &UserId) -> usize {
        RegistryImpl::workload(self, judge)
    }

    fn login(&self, data: UserLogin) -> User {
        RegistryImpl::login(self, data)
    }

    fn logout(&self, id: &UserId) -> bool {
        RegistryImpl::logout(self, id)
    }

    fn refresh_activity(&self) -> usize {
        RegistryImpl::refresh_activity(self)
    }

    fn users(&self, filter: &UserFilter) -> Vec<User> {
        RegistryImpl::users(self, filter)
    }

    fn create_notification(&self, data: NewNotification) -> NotificationId {
        RegistryImpl::create_notification(self, data)
    }

    fn notifications_for(&self, user: Option<&UserId>) -> Vec<Notification> {
        RegistryImpl::notifications_for(self, user)
    }

    fn prune_notifications(&self, now: DateTime<Utc>) -> usize {
        RegistryImpl::prune_notifications(self, now)
    }

    fn stats(&self) -> PortalStats {
        RegistryImpl::stats(self)
    }

    fn record_sync(&self, at: DateTime<Utc>) -> PortalStats {
        RegistryImpl::record_sync(self, at)
    }

    fn publish(&self, kind: EventKind, data: Value) -> usize {
        self.hub.publish(kind, data)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use chrono::TimeZone;
    use courtportal_core_types::ManualClock;
    use courtportal_policy_center::default_policy;

    pub(crate) fn registry() -> (Arc<RegistryImpl>, Arc<ManualClock>) {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap());
        let hub = EventHub::detached(clock.clone());
        let registry = RegistryImpl::new(hub, clock.clone(), default_policy().notifications);
        (Arc::new(registry), clock)
    }
}
