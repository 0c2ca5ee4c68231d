use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::trace;

use courtportal_core_types::EventKind;

use crate::{metrics, model::ProcessStatus, state::RegistryImpl};

pub const TOTAL_PROCESSES_ELEMENT: &str = "total-processes";
pub const PENDING_PROCESSES_ELEMENT: &str = "pending-processes";
pub const IN_PROGRESS_PROCESSES_ELEMENT: &str = "in-progress-processes";
pub const ONLINE_USERS_ELEMENT: &str = "online-users";

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortalStats {
    pub total_processes: usize,
    pub pending: usize,
    pub in_progress: usize,
    pub concluded: usize,
    pub total_users: usize,
    pub online_users: usize,
    pub notifications: usize,
    pub last_sync: Option<DateTime<Utc>>,
}

impl PortalStats {
    /// The four named counter elements and their current text.
    pub fn display_values(&self) -> [(&'static str, String); 4] {
        [
            (TOTAL_PROCESSES_ELEMENT, self.total_processes.to_string()),
            (PENDING_PROCESSES_ELEMENT, self.pending.to_string()),
            (IN_PROGRESS_PROCESSES_ELEMENT, self.in_progress.to_string()),
            (ONLINE_USERS_ELEMENT, self.online_users.to_string()),
        ]
    }
}

/// Sink for the counter elements a portal page shows.
pub trait CounterDisplay: Send + Sync {
    /// Returns `false` when the element does not exist.
    fn set_text(&self, element: &str, text: &str) -> bool;
}

/// Display holding a fixed set of named elements.
#[derive(Default)]
pub struct MemoryDisplay {
    elements: DashMap<String, String>,
}

impl MemoryDisplay {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_elements<I, S>(names: I) -> Arc<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let display = Self::default();
        for name in names {
            display.elements.insert(name.into(), String::new());
        }
        Arc::new(display)
    }

    pub fn text(&self, element: &str) -> Option<String> {
        self.elements.get(element).map(|entry| entry.value().clone())
    }
}

impl CounterDisplay for MemoryDisplay {
    fn set_text(&self, element: &str, text: &str) -> bool {
        match self.elements.get_mut(element) {
            Some(mut entry) => {
                *entry.value_mut() = text.to_string();
                true
            }
            None => false,
        }
    }
}

impl RegistryImpl {
    pub fn stats(&self) -> PortalStats {
        let mut stats = PortalStats {
            last_sync: *self.last_sync.read(),
            notifications: self.notifications.read().len(),
            ..PortalStats::default()
        };
        for entry in self.processes.iter() {
            stats.total_processes += 1;
            match entry.value().read().status {
                ProcessStatus::Pending => stats.pending += 1,
                ProcessStatus::InProgress => stats.in_progress += 1,
                ProcessStatus::Concluded => stats.concluded += 1,
            }
        }
        for entry in self.users.iter() {
            stats.total_users += 1;
            if entry.value().read().online {
                stats.online_users += 1;
            }
        }
        stats
    }

    /// Recomputes the counters, exports them and writes the display
    /// elements, then publishes `stats_updated`.
    pub fn refresh_stats(&self) -> PortalStats {
        let stats = self.stats();
        metrics::observe_stats(&stats);
        if let Some(display) = self.display() {
            for (element, text) in stats.display_values() {
                if !display.set_text(element, &text) {
                    trace!(element, "counter element absent");
                }
            }
        }
        self.emit(EventKind::StatsUpdated, &stats);
        stats
    }

    pub fn record_sync(&self, at: DateTime<Utc>) -> PortalStats {
        *self.last_sync.write() = Some(at);
        self.refresh_stats()
    }

    pub fn last_sync(&self) -> Option<DateTime<Utc>> {
        *self.last_sync.read()
    }
}
