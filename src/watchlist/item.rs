//! Watchlist records - tracked items and user-defined groups

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A tracked ticker symbol with its metadata.
///
/// The symbol is the primary key of the items relation and is always stored
/// uppercase. `added_at` is set on first insertion and never overwritten.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchlistItem {
    /// Ticker symbol, uppercase
    pub symbol: String,
    /// Timestamp of first insertion
    pub added_at: DateTime<Utc>,
    /// Free-form labels, no duplicates, case-sensitive
    #[serde(default)]
    pub tags: Vec<String>,
    /// Optional free text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl WatchlistItem {
    /// Create a new item, uppercasing the symbol and collapsing duplicate tags
    pub fn new(symbol: impl Into<String>, tags: Vec<String>) -> Self {
        let mut deduped: Vec<String> = Vec::with_capacity(tags.len());
        for tag in tags {
            if !deduped.contains(&tag) {
                deduped.push(tag);
            }
        }

        Self {
            symbol: symbol.into().to_uppercase(),
            added_at: Utc::now(),
            tags: deduped,
            notes: None,
        }
    }

    /// Check whether the item carries a tag (exact, case-sensitive match)
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// A named, user-defined, ordered subset of symbols.
///
/// Groups reference symbols, they do not own them: a symbol may appear in
/// zero, one, or many groups.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchlistGroup {
    /// Unique id derived from the display name at creation time
    pub id: String,
    /// Display label
    pub name: String,
    /// Ordered symbol references
    #[serde(default)]
    pub symbols: Vec<String>,
    /// Display tag, opaque to the store
    pub color: String,
}

impl WatchlistGroup {
    /// Create an empty group with the given id
    pub fn new(id: impl Into<String>, name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            symbols: Vec::new(),
            color: color.into(),
        }
    }

    /// Check whether the group references a symbol
    pub fn contains(&self, symbol: &str) -> bool {
        self.symbols.iter().any(|s| s == symbol)
    }
}

/// Derive a group id slug from a display name.
///
/// Lowercases the name and replaces whitespace runs with a single dash.
/// Leading and trailing whitespace is dropped, so "Tech" and "  tech " yield
/// the same slug; uniqueness against existing ids is handled by the store.
pub fn group_id_from_name(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}
