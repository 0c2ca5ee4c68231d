//! Process, user and notification registries for the court portal.

pub mod api;
pub mod errors;
pub mod metrics;
pub mod model;
pub mod notifications;
pub mod patch;
pub mod processes;
pub mod snapshot;
pub mod state;
pub mod stats;
pub mod users;

pub use api::Registry;
pub use errors::RegistryError;
pub use metrics::register_metrics;
pub use model::{
    Capability, HistoryAction, HistoryEntry, LawyerRequest, LawyerRequestStatus, NewNotification,
    NewProcess, Notification, NotificationKind, PortalTag, Process, ProcessFilter, ProcessStatus,
    Urgency, User, UserFilter, UserLogin,
};
pub use patch::ProcessPatch;
pub use snapshot::PortalSnapshot;
pub use state::RegistryImpl;
pub use stats::{
    CounterDisplay, MemoryDisplay, PortalStats, IN_PROGRESS_PROCESSES_ELEMENT,
    ONLINE_USERS_ELEMENT, PENDING_PROCESSES_ELEMENT, TOTAL_PROCESSES_ELEMENT,
};
