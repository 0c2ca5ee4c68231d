use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::errors::StorageError;
use crate::slot::StorageSlot;

/// Saves and loads one serde value under a fixed storage key.
pub struct SnapshotStore<T> {
    slot: Arc<dyn StorageSlot>,
    key: String,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for SnapshotStore<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
            key: self.key.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> SnapshotStore<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(slot: Arc<dyn StorageSlot>, key: impl Into<String>) -> Self {
        Self {
            slot,
            key: key.into(),
            _marker: PhantomData,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn slot(&self) -> Arc<dyn StorageSlot> {
        Arc::clone(&self.slot)
    }

    /// Overwrites whatever snapshot was stored before.
    pub fn save(&self, value: &T) -> Result<(), StorageError> {
        let encoded = serde_json::to_string(value)?;
        self.slot.write(&self.key, &encoded)?;
        debug!(key = %self.key, bytes = encoded.len(), "snapshot saved");
        Ok(())
    }

    /// Absent, unreadable and unparsable snapshots all load as `None`.
    pub fn load(&self) -> Option<T> {
        let raw = match self.slot.read(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(err) => {
                warn!(key = %self.key, "snapshot read failed; treating as absent: {err}");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(key = %self.key, "snapshot corrupt; discarding: {err}");
                None
            }
        }
    }

    pub fn clear(&self) -> Result<(), StorageError> {
        self.slot.remove(&self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slot::{FileSlot, InMemorySlot};
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        name: String,
        count: u32,
    }

    #[test]
    fn save_then_load() {
        let store = SnapshotStore::<Sample>::new(InMemorySlot::new(), "sample");
        assert!(store.load().is_none());

        let value = Sample {
            name: "a".into(),
            count: 3,
        };
        store.save(&value).unwrap();
        assert_eq!(store.load(), Some(value));

        store
            .save(&Sample {
                name: "b".into(),
                count: 4,
            })
            .unwrap();
        assert_eq!(store.load().unwrap().name, "b");
    }

    #[test]
    fn corrupt_snapshot_loads_as_absent() {
        let slot = InMemorySlot::new();
        slot.write("sample", "{not json").unwrap();
        let store = SnapshotStore::<Sample>::new(slot.clone(), "sample");
        assert!(store.load().is_none());

        slot.write("sample", "{\"name\": 5}").unwrap();
        assert!(store.load().is_none());
    }

    #[test]
    fn file_backed_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = SnapshotStore::<Sample>::new(FileSlot::new(dir.path()).unwrap(), "s");
            store
                .save(&Sample {
                    name: "kept".into(),
                    count: 1,
                })
                .unwrap();
        }
        let reopened = SnapshotStore::<Sample>::new(FileSlot::new(dir.path()).unwrap(), "s");
        assert_eq!(reopened.load().unwrap().name, "kept");
        reopened.clear().unwrap();
        assert!(reopened.load().is_none());
    }
}
