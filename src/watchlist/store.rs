//! Watchlist store - single source of truth for tracked symbols
//!
//! All mutations are total: a missing target is a silent no-op, never an
//! error. Persistence is best-effort and decoupled from the in-memory
//! relations; a failed write leaves memory authoritative and is retried on
//! the next flush.

use super::item::{WatchlistGroup, WatchlistItem, group_id_from_name};
use crate::storage::{Snapshot, SnapshotStore, migrate, SNAPSHOT_VERSION};
use std::time::{Duration, Instant};

/// Fields of an item that can be merged in place.
///
/// `None` leaves the existing value untouched.
#[derive(Debug, Default, Clone)]
pub struct ItemUpdate {
    pub notes: Option<String>,
}

/// The watchlist store.
///
/// Owns the items and groups relations plus transient UI selection state,
/// answers relational queries, and persists itself through an injected
/// [`SnapshotStore`]. Mutations mark the store dirty; writes happen on an
/// explicit [`flush`](Self::flush) or a debounced
/// [`maybe_flush`](Self::maybe_flush).
pub struct WatchlistStore {
    items: Vec<WatchlistItem>,
    groups: Vec<WatchlistGroup>,
    selected_group_id: Option<String>,
    search_term: String,

    persist: Box<dyn SnapshotStore>,
    dirty: bool,
    last_mutation: Option<Instant>,
}

impl WatchlistStore {
    /// Create an empty store backed by the given persistence collaborator
    pub fn new(persist: Box<dyn SnapshotStore>) -> Self {
        Self {
            items: Vec::new(),
            groups: Vec::new(),
            selected_group_id: None,
            search_term: String::new(),
            persist,
            dirty: false,
            last_mutation: None,
        }
    }

    /// Rehydrate from the persisted snapshot, falling back to an empty store.
    ///
    /// A missing record yields a fresh store; a corrupt or unsupported one is
    /// logged and discarded. Memory is authoritative from here on, so load
    /// problems are never fatal.
    pub fn load_or_default(persist: Box<dyn SnapshotStore>) -> Self {
        let snapshot = match persist.load() {
            Ok(Some(raw)) => match migrate(raw) {
                Ok(snapshot) => Some(snapshot),
                Err(e) => {
                    tracing::warn!("Discarding unusable watchlist snapshot: {}", e);
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                tracing::warn!("Failed to load watchlist snapshot: {}", e);
                None
            }
        };

        let mut store = Self::new(persist);
        if let Some(snapshot) = snapshot {
            store.items = snapshot.items;
            store.groups = snapshot.groups;
            store.selected_group_id = snapshot.selected_group_id;
            store.search_term = snapshot.search_term;
        }
        store
    }

    // ========== Item Mutations ==========

    /// Track a symbol, seeding it with tags.
    ///
    /// The symbol is uppercased. Re-adding an existing symbol is a no-op:
    /// the first insertion wins and `added_at`/`tags` are not overwritten.
    pub fn add_symbol(&mut self, symbol: &str, tags: Vec<String>) {
        let symbol = symbol.to_uppercase();
        if self.items.iter().any(|item| item.symbol == symbol) {
            return;
        }

        self.items.push(WatchlistItem::new(symbol, tags));
        self.touch();
    }

    /// Stop tracking a symbol, cascading into every group's symbol list.
    ///
    /// No-op if the symbol is not tracked and no group references it.
    pub fn remove_symbol(&mut self, symbol: &str) {
        let symbol = symbol.to_uppercase();

        let before = self.items.len();
        self.items.retain(|item| item.symbol != symbol);
        let mut changed = self.items.len() != before;

        for group in &mut self.groups {
            let before = group.symbols.len();
            group.symbols.retain(|s| s != &symbol);
            changed |= group.symbols.len() != before;
        }

        if changed {
            self.touch();
        }
    }

    /// Merge the supplied fields into an existing item; no-op if absent
    pub fn update_symbol(&mut self, symbol: &str, update: ItemUpdate) {
        let symbol = symbol.to_uppercase();
        let Some(item) = self.items.iter_mut().find(|item| item.symbol == symbol) else {
            return;
        };

        let mut changed = false;
        if let Some(notes) = update.notes {
            item.notes = Some(notes);
            changed = true;
        }

        if changed {
            self.touch();
        }
    }

    /// Attach a tag to an item; no-op if the item is absent or already tagged
    pub fn add_tag(&mut self, symbol: &str, tag: &str) {
        let symbol = symbol.to_uppercase();
        let Some(item) = self.items.iter_mut().find(|item| item.symbol == symbol) else {
            return;
        };

        if item.has_tag(tag) {
            return;
        }
        item.tags.push(tag.to_string());
        self.touch();
    }

    /// Detach a tag from an item; no-op if absent
    pub fn remove_tag(&mut self, symbol: &str, tag: &str) {
        let symbol = symbol.to_uppercase();
        let Some(item) = self.items.iter_mut().find(|item| item.symbol == symbol) else {
            return;
        };

        let before = item.tags.len();
        item.tags.retain(|t| t != tag);
        if item.tags.len() != before {
            self.touch();
        }
    }

    // ========== Group Mutations ==========

    /// Create an empty group and return its id.
    ///
    /// The id is derived from the name; when the slug is already taken a
    /// numeric suffix keeps it unique ("tech", "tech-2", ...), so creation
    /// never fails.
    pub fn create_group(&mut self, name: &str, color: &str) -> String {
        let base = group_id_from_name(name);
        let mut id = base.clone();
        let mut n = 2;
        while self.groups.iter().any(|g| g.id == id) {
            id = format!("{}-{}", base, n);
            n += 1;
        }

        self.groups.push(WatchlistGroup::new(&id, name, color));
        self.touch();
        id
    }

    /// Delete a group; clears the selection if it pointed at the group.
    ///
    /// The items relation is untouched. No-op if the group is absent.
    pub fn delete_group(&mut self, group_id: &str) {
        let before = self.groups.len();
        self.groups.retain(|g| g.id != group_id);
        if self.groups.len() == before {
            return;
        }

        if self.selected_group_id.as_deref() == Some(group_id) {
            self.selected_group_id = None;
        }
        self.touch();
    }

    /// Append a symbol to a group's list.
    ///
    /// No-op if the group is absent or already lists the symbol. The symbol
    /// does not have to be tracked: groups may pre-reference symbols.
    pub fn add_to_group(&mut self, group_id: &str, symbol: &str) {
        let symbol = symbol.to_uppercase();
        let Some(group) = self.groups.iter_mut().find(|g| g.id == group_id) else {
            return;
        };

        if group.contains(&symbol) {
            return;
        }
        group.symbols.push(symbol);
        self.touch();
    }

    /// Drop a symbol from a group's list; no-op if absent
    pub fn remove_from_group(&mut self, group_id: &str, symbol: &str) {
        let symbol = symbol.to_uppercase();
        let Some(group) = self.groups.iter_mut().find(|g| g.id == group_id) else {
            return;
        };

        let before = group.symbols.len();
        group.symbols.retain(|s| s != &symbol);
        if group.symbols.len() != before {
            self.touch();
        }
    }

    // ========== UI State ==========

    /// Select a group (or clear the selection with `None`)
    pub fn set_selected_group(&mut self, group_id: Option<&str>) {
        let group_id = group_id.map(str::to_string);
        if self.selected_group_id != group_id {
            self.selected_group_id = group_id;
            self.touch();
        }
    }

    /// Update the search box contents
    pub fn set_search_term(&mut self, term: &str) {
        if self.search_term != term {
            self.search_term = term.to_string();
            self.touch();
        }
    }

    // ========== Queries ==========

    /// All tracked items, in insertion order
    pub fn items(&self) -> &[WatchlistItem] {
        &self.items
    }

    /// All groups, in creation order
    pub fn groups(&self) -> &[WatchlistGroup] {
        &self.groups
    }

    /// Look up a tracked item by symbol
    pub fn get_item(&self, symbol: &str) -> Option<&WatchlistItem> {
        let symbol = symbol.to_uppercase();
        self.items.iter().find(|item| item.symbol == symbol)
    }

    /// Look up a group by id
    pub fn get_group(&self, group_id: &str) -> Option<&WatchlistGroup> {
        self.groups.iter().find(|g| g.id == group_id)
    }

    /// Ordered symbols of a group, empty if the group is absent
    pub fn symbols_by_group(&self, group_id: &str) -> Vec<String> {
        self.get_group(group_id)
            .map(|g| g.symbols.clone())
            .unwrap_or_default()
    }

    /// Symbols carrying a tag, in items-relation order
    pub fn symbols_by_tag(&self, tag: &str) -> Vec<String> {
        self.items
            .iter()
            .filter(|item| item.has_tag(tag))
            .map(|item| item.symbol.clone())
            .collect()
    }

    /// Every tag across all items, deduplicated
    pub fn all_tags(&self) -> Vec<String> {
        let mut tags: Vec<String> = Vec::new();
        for item in &self.items {
            for tag in &item.tags {
                if !tags.contains(tag) {
                    tags.push(tag.clone());
                }
            }
        }
        tags
    }

    /// Currently selected group id, if any
    pub fn selected_group_id(&self) -> Option<&str> {
        self.selected_group_id.as_deref()
    }

    /// Current search box contents
    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    // ========== Persistence ==========

    /// Capture the full store state as a snapshot record
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            version: SNAPSHOT_VERSION,
            items: self.items.clone(),
            groups: self.groups.clone(),
            selected_group_id: self.selected_group_id.clone(),
            search_term: self.search_term.clone(),
        }
    }

    /// Whether mutations are waiting to be written
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Write the snapshot if mutations are pending.
    ///
    /// Returns `false` when the write failed; the store stays dirty and the
    /// next flush retries. In-memory state is never rolled back.
    pub fn flush(&mut self) -> bool {
        if !self.dirty {
            return true;
        }

        match self.persist.save(&self.snapshot()) {
            Ok(()) => {
                self.dirty = false;
                true
            }
            Err(e) => {
                tracing::warn!("Failed to persist watchlist snapshot: {}", e);
                false
            }
        }
    }

    /// Flush only after a quiescence window has passed since the last
    /// mutation, so bursts of edits coalesce into one write.
    pub fn maybe_flush(&mut self, window: Duration) -> bool {
        let quiesced = self
            .last_mutation
            .map(|at| at.elapsed() >= window)
            .unwrap_or(false);

        if self.dirty && quiesced {
            self.flush()
        } else {
            false
        }
    }

    fn touch(&mut self) {
        self.dirty = true;
        self.last_mutation = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemorySnapshotStore;
    use crate::{Error, Result};

    fn store() -> WatchlistStore {
        WatchlistStore::new(Box::new(MemorySnapshotStore::new()))
    }

    #[test]
    fn test_add_symbol_is_idempotent() {
        let mut store = store();
        store.add_symbol("AAPL", vec!["tech".into()]);
        let added_at = store.get_item("AAPL").unwrap().added_at;

        store.add_symbol("AAPL", vec!["other".into()]);

        assert_eq!(store.items().len(), 1);
        let item = store.get_item("AAPL").unwrap();
        assert_eq!(item.tags, vec!["tech"]);
        assert_eq!(item.added_at, added_at);
    }

    #[test]
    fn test_add_symbol_normalizes_case() {
        let mut store = store();
        store.add_symbol("aapl", vec![]);
        store.add_symbol("AAPL", vec![]);

        assert_eq!(store.items().len(), 1);
        assert_eq!(store.items()[0].symbol, "AAPL");

        store.remove_symbol("aapl");
        assert!(store.items().is_empty());
    }

    #[test]
    fn test_remove_symbol_cascades_into_groups() {
        let mut store = store();
        store.add_symbol("AAPL", vec!["tech".into()]);
        store.add_symbol("MSFT", vec!["tech".into()]);
        let g1 = store.create_group("Tech Giants", "blue");
        store.add_to_group(&g1, "AAPL");
        store.add_to_group(&g1, "MSFT");

        store.remove_symbol("AAPL");

        assert_eq!(store.items().len(), 1);
        assert_eq!(store.items()[0].symbol, "MSFT");
        assert_eq!(store.symbols_by_group(&g1), vec!["MSFT"]);
    }

    #[test]
    fn test_remove_symbol_scrubs_every_group() {
        let mut store = store();
        store.add_symbol("TSLA", vec![]);
        let a = store.create_group("Growth", "green");
        let b = store.create_group("Momentum", "red");
        store.add_to_group(&a, "TSLA");
        store.add_to_group(&b, "TSLA");

        store.remove_symbol("TSLA");

        for group in store.groups() {
            assert!(!group.contains("TSLA"));
        }
    }

    #[test]
    fn test_tag_add_then_remove_restores_set() {
        let mut store = store();
        store.add_symbol("AAPL", vec!["tech".into()]);

        store.add_tag("AAPL", "dividend");
        assert_eq!(store.get_item("AAPL").unwrap().tags, vec!["tech", "dividend"]);

        store.remove_tag("AAPL", "dividend");
        assert_eq!(store.get_item("AAPL").unwrap().tags, vec!["tech"]);
    }

    #[test]
    fn test_add_tag_does_not_duplicate() {
        let mut store = store();
        store.add_symbol("AAPL", vec!["tech".into()]);
        store.add_tag("AAPL", "tech");
        assert_eq!(store.get_item("AAPL").unwrap().tags, vec!["tech"]);
    }

    #[test]
    fn test_tag_ops_on_missing_item_are_noops() {
        let mut store = store();
        store.add_tag("NOPE", "tech");
        store.remove_tag("NOPE", "tech");
        store.update_symbol("NOPE", ItemUpdate { notes: Some("x".into()) });
        assert!(store.items().is_empty());
    }

    #[test]
    fn test_all_tags_tracks_liveness() {
        let mut store = store();
        store.add_symbol("AAPL", vec!["tech".into()]);
        store.add_symbol("TSLA", vec!["tech".into(), "automotive".into()]);

        assert_eq!(store.all_tags(), vec!["tech", "automotive"]);

        store.remove_tag("TSLA", "automotive");
        assert_eq!(store.all_tags(), vec!["tech"]);

        store.remove_symbol("AAPL");
        store.remove_symbol("TSLA");
        assert!(store.all_tags().is_empty());
    }

    #[test]
    fn test_symbols_by_tag_in_items_order() {
        let mut store = store();
        store.add_symbol("AAPL", vec!["tech".into()]);
        store.add_symbol("TSLA", vec!["tech".into(), "automotive".into()]);

        assert_eq!(store.symbols_by_tag("tech"), vec!["AAPL", "TSLA"]);
        assert_eq!(store.symbols_by_tag("automotive"), vec!["TSLA"]);
        assert!(store.symbols_by_tag("missing").is_empty());
    }

    #[test]
    fn test_update_symbol_merges_notes() {
        let mut store = store();
        store.add_symbol("AAPL", vec![]);

        store.update_symbol("AAPL", ItemUpdate { notes: Some("earnings in May".into()) });
        assert_eq!(
            store.get_item("AAPL").unwrap().notes.as_deref(),
            Some("earnings in May")
        );

        // None leaves the field untouched
        store.update_symbol("AAPL", ItemUpdate::default());
        assert_eq!(
            store.get_item("AAPL").unwrap().notes.as_deref(),
            Some("earnings in May")
        );
    }

    #[test]
    fn test_new_group_starts_empty() {
        let mut store = store();
        let id = store.create_group("Growth Stocks", "green");
        assert_eq!(id, "growth-stocks");
        assert!(store.symbols_by_group(&id).is_empty());
    }

    #[test]
    fn test_create_group_suffixes_colliding_ids() {
        let mut store = store();
        assert_eq!(store.create_group("Tech", "blue"), "tech");
        assert_eq!(store.create_group("Tech", "red"), "tech-2");
        assert_eq!(store.create_group("  tech ", "green"), "tech-3");
        assert_eq!(store.groups().len(), 3);
    }

    #[test]
    fn test_delete_group_clears_stale_selection() {
        let mut store = store();
        let id = store.create_group("Tech", "blue");
        store.set_selected_group(Some(&id));

        store.delete_group(&id);

        assert!(store.selected_group_id().is_none());
        assert!(store.get_group(&id).is_none());
    }

    #[test]
    fn test_delete_group_keeps_unrelated_selection() {
        let mut store = store();
        let keep = store.create_group("Keep", "blue");
        let drop = store.create_group("Drop", "red");
        store.set_selected_group(Some(&keep));

        store.delete_group(&drop);

        assert_eq!(store.selected_group_id(), Some(keep.as_str()));
    }

    #[test]
    fn test_delete_group_leaves_items_alone() {
        let mut store = store();
        store.add_symbol("AAPL", vec![]);
        let id = store.create_group("Tech", "blue");
        store.add_to_group(&id, "AAPL");

        store.delete_group(&id);

        assert_eq!(store.items().len(), 1);
    }

    #[test]
    fn test_group_may_pre_reference_untracked_symbol() {
        let mut store = store();
        let id = store.create_group("Wishlist", "gray");

        store.add_to_group(&id, "NVDA");

        assert!(store.get_item("NVDA").is_none());
        assert_eq!(store.symbols_by_group(&id), vec!["NVDA"]);
    }

    #[test]
    fn test_group_ops_on_missing_group_are_noops() {
        let mut store = store();
        store.add_to_group("nope", "AAPL");
        store.remove_from_group("nope", "AAPL");
        store.delete_group("nope");
        assert!(store.groups().is_empty());
    }

    #[test]
    fn test_symbols_by_group_preserves_order() {
        let mut store = store();
        let id = store.create_group("Ordered", "blue");
        store.add_to_group(&id, "MSFT");
        store.add_to_group(&id, "AAPL");
        store.add_to_group(&id, "MSFT"); // already listed

        assert_eq!(store.symbols_by_group(&id), vec!["MSFT", "AAPL"]);
    }

    #[test]
    fn test_flush_roundtrip_reproduces_relations() {
        let backend = MemorySnapshotStore::new();

        let mut store = WatchlistStore::new(Box::new(backend.clone()));
        store.add_symbol("AAPL", vec!["tech".into()]);
        store.add_symbol("TSLA", vec!["tech".into(), "automotive".into()]);
        let id = store.create_group("Tech Giants", "blue");
        store.add_to_group(&id, "TSLA");
        store.add_to_group(&id, "AAPL");
        store.update_symbol("TSLA", ItemUpdate { notes: Some("volatile".into()) });
        store.set_selected_group(Some(&id));
        store.set_search_term("te");
        assert!(store.flush());

        let reloaded = WatchlistStore::load_or_default(Box::new(backend));
        assert_eq!(reloaded.items().len(), 2);
        assert_eq!(reloaded.get_item("TSLA").unwrap().notes.as_deref(), Some("volatile"));
        assert_eq!(reloaded.get_item("TSLA").unwrap().tags, vec!["tech", "automotive"]);
        // Group symbol order survives the round trip
        assert_eq!(reloaded.symbols_by_group(&id), vec!["TSLA", "AAPL"]);
        assert_eq!(reloaded.selected_group_id(), Some(id.as_str()));
        assert_eq!(reloaded.search_term(), "te");
    }

    #[test]
    fn test_load_or_default_survives_corrupt_snapshot() {
        let backend = MemorySnapshotStore::new();
        let mut future = Snapshot::empty();
        future.version = SNAPSHOT_VERSION + 1;
        backend.save(&future).unwrap();

        let store = WatchlistStore::load_or_default(Box::new(backend));
        assert!(store.items().is_empty());
        assert!(!store.is_dirty());
    }

    #[test]
    fn test_flush_without_mutations_writes_nothing() {
        let backend = MemorySnapshotStore::new();
        let mut store = WatchlistStore::new(Box::new(backend.clone()));

        assert!(store.flush());
        assert!(backend.is_empty());
    }

    #[test]
    fn test_maybe_flush_debounces() {
        let mut store = store();
        store.add_symbol("AAPL", vec![]);

        // Inside the quiescence window nothing is written
        assert!(!store.maybe_flush(Duration::from_secs(60)));
        assert!(store.is_dirty());

        // A zero window flushes immediately
        assert!(store.maybe_flush(Duration::ZERO));
        assert!(!store.is_dirty());
    }

    struct FailingSnapshotStore;

    impl SnapshotStore for FailingSnapshotStore {
        fn load(&self) -> Result<Option<Snapshot>> {
            Ok(None)
        }

        fn save(&self, _snapshot: &Snapshot) -> Result<()> {
            Err(Error::Snapshot("disk on fire".to_string()))
        }
    }

    #[test]
    fn test_write_failure_keeps_memory_authoritative() {
        let mut store = WatchlistStore::new(Box::new(FailingSnapshotStore));
        store.add_symbol("AAPL", vec!["tech".into()]);

        assert!(!store.flush());

        // The mutation survives and the store stays dirty for a retry
        assert_eq!(store.items().len(), 1);
        assert!(store.is_dirty());
    }
}
