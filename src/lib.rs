//! # Folio - Investment Tracking Platform Core
//!
//! Watchlist-centric core for the Folio investment tracker.
//!
//! Folio provides:
//! - A normalized watchlist store (tracked symbols, free-form tags, user groups)
//! - Snapshot persistence over a SQLite key-value layer with versioned migration
//! - A mock-data REST backend for investments and recommendations
//! - A docker-compose backend service manager
//! - An HTTP client with host-header based service routing

pub mod backend;
pub mod client;
pub mod config;
pub mod server;
pub mod storage;
pub mod ui;
pub mod watchlist;

// Re-exports for convenient access
pub use storage::{KvStore, Snapshot, SnapshotStore};
pub use watchlist::{WatchlistGroup, WatchlistItem, WatchlistStore};

/// Result type alias for Folio operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Folio operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Snapshot error: {0}")]
    Snapshot(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
