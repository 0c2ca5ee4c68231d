use chrono::{DateTime, Utc};
use serde::Serialize;

use courtportal_core_types::{ProcessId, UserId};
use courtportal_registry::PortalStats;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub process_id: ProcessId,
    pub judge_id: UserId,
}

/// What one sync tick did.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TickReport {
    pub at: DateTime<Utc>,
    pub stats: PortalStats,
    pub pruned: usize,
    pub assigned: Vec<Assignment>,
    pub refreshed_users: usize,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DriverState {
    Idle,
    Active,
}
