//! Snapshot persistence backends
//!
//! The watchlist store owns a `SnapshotStore` collaborator rather than a
//! global storage handle, so tests can substitute an in-memory fake.

use super::kv::KvStore;
use super::snapshot::Snapshot;
use crate::Result;
use std::sync::{Arc, Mutex};

/// Fixed key the watchlist record is stored under
pub const STORAGE_NAME: &str = "watchlist-storage";

/// Durable home for watchlist snapshots
pub trait SnapshotStore {
    /// Read the stored snapshot, `None` if nothing was ever saved
    fn load(&self) -> Result<Option<Snapshot>>;

    /// Write the snapshot, replacing any previous one
    fn save(&self, snapshot: &Snapshot) -> Result<()>;
}

/// Snapshot store over the SQLite key-value layer
pub struct KvSnapshotStore {
    kv: KvStore,
}

impl KvSnapshotStore {
    pub fn new(kv: KvStore) -> Self {
        Self { kv }
    }
}

impl SnapshotStore for KvSnapshotStore {
    fn load(&self) -> Result<Option<Snapshot>> {
        match self.kv.get(STORAGE_NAME)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    fn save(&self, snapshot: &Snapshot) -> Result<()> {
        let raw = serde_json::to_string(snapshot)?;
        self.kv.put(STORAGE_NAME, &raw)
    }
}

/// In-memory snapshot store for tests.
///
/// Clones share the same cell, so a test can hand one clone to a store and
/// inspect the saved record through another.
#[derive(Clone, Default)]
pub struct MemorySnapshotStore {
    cell: Arc<Mutex<Option<String>>>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether anything has been saved yet
    pub fn is_empty(&self) -> bool {
        self.cell.lock().expect("snapshot cell poisoned").is_none()
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn load(&self) -> Result<Option<Snapshot>> {
        let cell = self.cell.lock().expect("snapshot cell poisoned");
        match cell.as_deref() {
            Some(raw) => Ok(Some(serde_json::from_str(raw)?)),
            None => Ok(None),
        }
    }

    fn save(&self, snapshot: &Snapshot) -> Result<()> {
        let raw = serde_json::to_string(snapshot)?;
        *self.cell.lock().expect("snapshot cell poisoned") = Some(raw);
        Ok(())
    }
}
