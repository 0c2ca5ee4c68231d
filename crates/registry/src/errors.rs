use thiserror::Error;

use crate::model::ProcessStatus;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RegistryError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("process {id} is {status}")]
    InvalidState { id: String, status: ProcessStatus },
    #[error("invalid patch: {0}")]
    InvalidPatch(String),
}

impl RegistryError {
    pub fn into_portal_error(self, detail: impl Into<String>) -> courtportal_core_types::PortalError {
        let message = format!("{}: {}", self, detail.into());
        courtportal_core_types::PortalError::new(message)
    }
}
