//! Watchlist - normalized relations over tracked symbols
//!
//! Three relations with the store as single source of truth:
//! - items(symbol, added_at, tags, notes) - symbol is the primary key
//! - tags-per-item - free-form labels, many-to-many
//! - groups(id, name, symbols, color) - ordered symbol references
//!
//! Removing an item cascades into every group's symbol list. Groups may
//! reference symbols that are not (yet) tracked; the cascade is the only
//! integrity guarantee in that direction.

pub mod item;
pub mod store;

pub use item::{group_id_from_name, WatchlistGroup, WatchlistItem};
pub use store::{ItemUpdate, WatchlistStore};
