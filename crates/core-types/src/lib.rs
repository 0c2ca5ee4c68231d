pub mod clock;
pub mod event;
pub mod ids;

use thiserror::Error;

pub use clock::{Clock, ManualClock, SystemClock};
pub use event::EventKind;
pub use ids::{case_number, InstanceId, NotificationId, ProcessId, RequestId, UserId};

/// Shared error type for the portal crates.
#[derive(Debug, Error, Clone)]
pub enum PortalError {
    #[error("{message}")]
    Message { message: String },
}

impl PortalError {
    pub fn new(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }
}
