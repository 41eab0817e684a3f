//! Snapshot record and schema migration

use crate::watchlist::{WatchlistGroup, WatchlistItem};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Current snapshot schema version
pub const SNAPSHOT_VERSION: u32 = 1;

/// Full serialized state of the watchlist store at a point in time.
///
/// Field names follow the persisted record format, camelCase on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Schema version of this record
    pub version: u32,
    /// Items relation
    #[serde(default)]
    pub items: Vec<WatchlistItem>,
    /// Groups relation
    #[serde(default)]
    pub groups: Vec<WatchlistGroup>,
    /// Transient UI state: currently selected group, if any
    #[serde(default)]
    pub selected_group_id: Option<String>,
    /// Transient UI state: current search box contents
    #[serde(default)]
    pub search_term: String,
}

impl Snapshot {
    /// An empty snapshot at the current schema version
    pub fn empty() -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            items: Vec::new(),
            groups: Vec::new(),
            selected_group_id: None,
            search_term: String::new(),
        }
    }
}

/// Walk a snapshot up the migration chain to the current version.
///
/// Version 1 is the anchor; records written by a newer build are rejected
/// rather than guessed at.
pub fn migrate(mut snapshot: Snapshot) -> Result<Snapshot> {
    if snapshot.version > SNAPSHOT_VERSION {
        return Err(Error::Snapshot(format!(
            "snapshot version {} is newer than supported version {}",
            snapshot.version, SNAPSHOT_VERSION
        )));
    }

    while snapshot.version < SNAPSHOT_VERSION {
        let from = snapshot.version;
        snapshot = migrate_step(snapshot)?;
        tracing::info!("Migrated snapshot from version {} to {}", from, snapshot.version);
    }

    Ok(snapshot)
}

/// Apply a single migration step.
///
/// No versions earlier than 1 ever shipped; anything below the anchor is a
/// corrupt record.
fn migrate_step(snapshot: Snapshot) -> Result<Snapshot> {
    match snapshot.version {
        0 => Err(Error::Snapshot(
            "snapshot version 0 was never a valid schema".to_string(),
        )),
        v => Err(Error::Snapshot(format!(
            "no migration path from snapshot version {}",
            v
        ))),
    }
}
