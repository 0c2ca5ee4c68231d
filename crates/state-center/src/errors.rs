use courtportal_core_types::PortalError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error on {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid storage key: {0}")]
    InvalidKey(String),
    #[error("encode failed: {0}")]
    Encode(#[from] serde_json::Error),
}

impl From<StorageError> for PortalError {
    fn from(value: StorageError) -> Self {
        PortalError::new(value.to_string())
    }
}
