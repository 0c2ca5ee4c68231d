use std::fmt;

use serde::{Deserialize, Serialize};

/// Every name the portal broadcasts under.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    ProcessCreated,
    ProcessUpdated,
    LawyerRequested,
    UserLogin,
    UserLogout,
    NotificationCreated,
    StatsUpdated,
    SystemSync,
}

impl EventKind {
    pub const ALL: [EventKind; 8] = [
        EventKind::ProcessCreated,
        EventKind::ProcessUpdated,
        EventKind::LawyerRequested,
        EventKind::UserLogin,
        EventKind::UserLogout,
        EventKind::NotificationCreated,
        EventKind::StatsUpdated,
        EventKind::SystemSync,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::ProcessCreated => "process_created",
            EventKind::ProcessUpdated => "process_updated",
            EventKind::LawyerRequested => "lawyer_requested",
            EventKind::UserLogin => "user_login",
            EventKind::UserLogout => "user_logout",
            EventKind::NotificationCreated => "notification_created",
            EventKind::StatsUpdated => "stats_updated",
            EventKind::SystemSync => "system_sync",
        }
    }

    /// Sibling instances reload their full state when they observe one of these.
    pub fn triggers_reload(self) -> bool {
        matches!(
            self,
            EventKind::ProcessCreated | EventKind::ProcessUpdated | EventKind::UserLogin
        )
    }

    /// Events that change registry contents and must be persisted.
    pub fn is_mutation(self) -> bool {
        !matches!(self, EventKind::StatsUpdated | EventKind::SystemSync)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
