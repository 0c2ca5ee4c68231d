use std::collections::BTreeMap;

use crate::model::{
    ChannelPolicy, DistributionPolicy, NotificationPolicy, PortalPolicy, StoragePolicy,
    SyncPolicy,
};

pub fn default_policy() -> PortalPolicy {
    PortalPolicy {
        sync: SyncPolicy { interval_secs: 30 },
        distribution: DistributionPolicy {
            enabled: true,
            max_per_cycle: 5,
            max_judge_workload: 10,
            min_judge_level: 4,
        },
        notifications: NotificationPolicy {
            retention_hours: 24,
            oversight_portal: "cnj".to_string(),
            oversight_min_level: 10,
        },
        storage: StoragePolicy {
            state_key: "portal_state".to_string(),
            signal_key: "portal_sync_signal".to_string(),
            dir: None,
        },
        channel: ChannelPolicy { capacity: 256 },
        provenance: BTreeMap::new(),
    }
}
