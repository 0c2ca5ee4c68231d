use thiserror::Error;

use courtportal_core_types::PortalError;
use courtportal_policy_center::PolicyError;
use courtportal_registry::RegistryError;
use courtportal_scheduler::SchedulerError;
use courtportal_state_center::StorageError;

/// Failures surfaced by the application context.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("policy: {0}")]
    Policy(#[from] PolicyError),
    #[error("storage: {0}")]
    Storage(#[from] StorageError),
    #[error("scheduler: {0}")]
    Scheduler(#[from] SchedulerError),
    #[error("registry: {0}")]
    Registry(#[from] RegistryError),
}

impl From<AppError> for PortalError {
    fn from(value: AppError) -> Self {
        PortalError::new(value.to_string())
    }
}
