pub mod errors;
pub mod signal;
pub mod slot;
pub mod snapshot;

pub use errors::StorageError;
pub use signal::StorageSignalSlot;
pub use slot::{FileSlot, InMemorySlot, StorageSlot};
pub use snapshot::SnapshotStore;

/// Key holding the full registry snapshot.
pub const DEFAULT_STATE_KEY: &str = "portal_state";
/// Key holding the most recent cross-instance signal.
pub const DEFAULT_SIGNAL_KEY: &str = "portal_sync_signal";
