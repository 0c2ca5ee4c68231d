use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("a sync tick is already running")]
    TickInFlight,
    #[error("sync interval must be greater than zero")]
    InvalidInterval,
}

impl From<SchedulerError> for courtportal_core_types::PortalError {
    fn from(value: SchedulerError) -> Self {
        courtportal_core_types::PortalError::new(value.to_string())
    }
}
