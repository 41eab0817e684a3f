//! Storage Layer - snapshot persistence
//!
//! The whole watchlist (items + groups + transient UI state) is serialized
//! as one JSON record and written to a local key-value layer:
//! - kv(name, value) - SQLite table, one row per named record
//! - the watchlist snapshot lives under the fixed key `watchlist-storage`
//!
//! Snapshots carry a schema version; loads run a migration chain anchored
//! at version 1.

pub mod kv;
pub mod persist;
pub mod snapshot;

pub use kv::KvStore;
pub use persist::{KvSnapshotStore, MemorySnapshotStore, SnapshotStore};
pub use snapshot::{migrate, Snapshot, SNAPSHOT_VERSION};
