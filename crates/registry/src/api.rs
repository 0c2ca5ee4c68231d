use chrono::{DateTime, Utc};
use serde_json::Value;

use courtportal_core_types::{EventKind, NotificationId, ProcessId, RequestId, UserId};

use crate::model::{
    NewNotification, NewProcess, Notification, Process, ProcessFilter, User, UserFilter,
    UserLogin,
};
use crate::patch::ProcessPatch;
use crate::stats::PortalStats;

/// Operation surface consumed by the portal UIs and the sync driver.
///
/// Boolean results report precondition failures (unknown id, wrong status)
/// without saying which one; `RegistryImpl::try_*` variants carry the reason.
pub trait Registry: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    fn create_process(&self, data: NewProcess) -> ProcessId;
    fn update_process(&self, id: &ProcessId, patch: ProcessPatch, actor: &str) -> bool;
    fn assume_process(&self, id: &ProcessId, judge_id: &UserId, judge_name: &str) -> bool;
    fn request_lawyer(
        &self,
        id: &ProcessId,
        judge_id: &UserId,
        lawyer_id: &UserId,
        reason: &str,
    ) -> Option<RequestId>;
    fn processes(&self, filter: &ProcessFilter) -> Vec<Process>;
    /// Number of in-progress processes assigned to `judge`.
    fn workload(&self, judge: &UserId) -> usize;

    fn login(&self, data: UserLogin) -> User;
    fn logout(&self, id: &UserId) -> bool;
    fn refresh_activity(&self) -> usize;
    fn users(&self, filter: &UserFilter) -> Vec<User>;

    fn create_notification(&self, data: NewNotification) -> NotificationId;
    fn notifications_for(&self, user: Option<&UserId>) -> Vec<Notification>;
    fn prune_notifications(&self, now: DateTime<Utc>) -> usize;

    fn stats(&self) -> PortalStats;
    /// Stamps the last-sync time and republishes the counters.
    fn record_sync(&self, at: DateTime<Utc>) -> PortalStats;
    fn publish(&self, kind: EventKind, data: Value) -> usize;
}
