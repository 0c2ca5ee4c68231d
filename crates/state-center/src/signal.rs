use std::sync::Arc;

use courtportal_core_types::PortalError;
use courtportal_event_bus::{BroadcastEnvelope, SignalSlot};

use crate::slot::StorageSlot;

/// Writes each cross-instance envelope as JSON under the signal key.
pub struct StorageSignalSlot {
    slot: Arc<dyn StorageSlot>,
    key: String,
}

impl StorageSignalSlot {
    pub fn new(slot: Arc<dyn StorageSlot>, key: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            slot,
            key: key.into(),
        })
    }

    pub fn latest(&self) -> Option<BroadcastEnvelope> {
        let raw = self.slot.read(&self.key).ok().flatten()?;
        serde_json::from_str(&raw).ok()
    }
}

impl SignalSlot for StorageSignalSlot {
    fn write(&self, envelope: &BroadcastEnvelope) -> Result<(), PortalError> {
        let encoded =
            serde_json::to_string(envelope).map_err(|err| PortalError::new(err.to_string()))?;
        self.slot.write(&self.key, &encoded).map_err(PortalError::from)
    }
}
