use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PortalPolicy {
    pub sync: SyncPolicy,
    pub distribution: DistributionPolicy,
    pub notifications: NotificationPolicy,
    pub storage: StoragePolicy,
    pub channel: ChannelPolicy,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub provenance: BTreeMap<String, PolicySource>,
}

/// One week.
pub const MAX_INTERVAL_SECS: u64 = 7 * 24 * 60 * 60;
/// Roughly a century.
pub const MAX_RETENTION_HOURS: u64 = 100 * 366 * 24;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SyncPolicy {
    pub interval_secs: u64,
}

impl SyncPolicy {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.min(MAX_INTERVAL_SECS))
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DistributionPolicy {
    pub enabled: bool,
    /// Upper bound on assignments per sync tick.
    pub max_per_cycle: usize,
    /// Hard cap on a judge's in-progress caseload.
    pub max_judge_workload: usize,
    pub min_judge_level: u8,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct NotificationPolicy {
    pub retention_hours: u64,
    pub oversight_portal: String,
    pub oversight_min_level: u8,
}

impl NotificationPolicy {
    pub fn retention(&self) -> chrono::Duration {
        let hours = self.retention_hours.min(MAX_RETENTION_HOURS);
        chrono::Duration::hours(hours as i64)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct StoragePolicy {
    pub state_key: String,
    pub signal_key: String,
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ChannelPolicy {
    pub capacity: usize,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PolicySource {
    Builtin,
    File,
    Env,
    Cli,
}
