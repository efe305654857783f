//! Durable storage of score entries.
//!
//! [`ScoreStore`] is the one seam between the ledger and a database. Two
//! implementations exist and must be observably identical:
//!
//! | Type | Backend | Write serialization |
//! |------|---------|---------------------|
//! | [`SqliteStore`] | embedded file | one in-process write lock + transaction |
//! | [`PostgresStore`] | networked pool | transaction + per-nickname advisory lock |
//!
//! Every multi-statement write (activating insert, activate) runs inside a
//! transaction. A transaction that is dropped before commit, including when
//! the calling future is cancelled, rolls back.

mod postgres;
mod sqlite;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{LeaderboardRow, ScoreEntry, Stats};

pub use postgres::PostgresStore;
pub use sqlite::SqliteStore;

#[async_trait]
pub trait ScoreStore: Send + Sync + std::fmt::Debug {
    /// Short backend name for logs.
    fn backend(&self) -> &'static str;

    /// Creates the table and indexes if missing. Never drops data.
    async fn initialize(&self) -> Result<()>;

    /// Appends an entry and returns its id.
    ///
    /// With `active` set, every other entry of `nickname` is cleared in the
    /// same transaction so the new row is the only active one.
    async fn insert(&self, nickname: &str, score: i32, active: bool) -> Result<i64>;

    /// All entries of `nickname`, newest first.
    async fn list_by_nickname(&self, nickname: &str) -> Result<Vec<ScoreEntry>>;

    /// Makes entry `id` the sole active entry of `nickname`.
    ///
    /// Returns `Ok(false)` without touching anything when `id` does not exist
    /// or belongs to someone else.
    async fn activate(&self, nickname: &str, id: i64) -> Result<bool>;

    /// Clears the active flag on every entry of `nickname`. Always `Ok(true)`.
    async fn deactivate_all(&self, nickname: &str) -> Result<bool>;

    /// Active entries by score descending, earlier submissions first on ties.
    async fn active_leaderboard(&self, limit: u32) -> Result<Vec<LeaderboardRow>>;

    /// Every recorded total, active or not.
    async fn all_scores(&self) -> Result<Vec<i32>>;

    async fn stats(&self) -> Result<Stats>;

    /// Waits for in-flight operations and releases every pooled connection.
    async fn close(&self);
}

/// Connection pool sizing shared by both backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSettings {
    /// Upper bound on concurrently open connections, and so on in-flight
    /// transactions. Callers wait for a free connection instead of failing.
    pub max_connections: u32,
    /// How long a caller waits for a connection before `StorageUnavailable`.
    pub acquire_timeout: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 5,
            acquire_timeout: Duration::from_secs(30),
        }
    }
}

/// Reads shared by both backends; the SQL is portable.
pub(crate) mod sql {
    pub(crate) const STATS: &str = "SELECT \
        (SELECT COUNT(DISTINCT nickname) FROM scores WHERE is_active) AS distinct_active_nicknames, \
        (SELECT COUNT(*) FROM scores) AS total_entries";

    pub(crate) const ALL_SCORES: &str = "SELECT score FROM scores";
}
