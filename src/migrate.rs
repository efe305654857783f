use sqlx::{PgPool, SqlitePool};
use tracing::debug;

use crate::error::Result;

/// Partial unique index backing the one-active-score-per-nickname rule.
pub const ACTIVE_INDEX: &str = "scores_one_active_per_nickname";

/// SQLite's message when [`ACTIVE_INDEX`] fires. SQLite reports columns, not
/// index names, so this is only unambiguous while no other unique index
/// covers `scores(nickname)` alone.
pub const SQLITE_ACTIVE_INDEX_VIOLATION: &str = "UNIQUE constraint failed: scores.nickname";

const SQLITE_SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS scores (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        nickname TEXT NOT NULL,
        score INTEGER NOT NULL,
        is_active BOOLEAN NOT NULL DEFAULT 0,
        created_at DATETIME NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now'))
    )",
    "CREATE INDEX IF NOT EXISTS scores_nickname_created_at ON scores (nickname, created_at)",
    "CREATE UNIQUE INDEX IF NOT EXISTS scores_one_active_per_nickname
        ON scores (nickname) WHERE is_active",
];

const POSTGRES_SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS scores (
        id BIGSERIAL PRIMARY KEY,
        nickname TEXT NOT NULL,
        score INTEGER NOT NULL,
        is_active BOOLEAN NOT NULL DEFAULT FALSE,
        created_at TIMESTAMP NOT NULL DEFAULT (clock_timestamp() AT TIME ZONE 'utc')
    )",
    "CREATE INDEX IF NOT EXISTS scores_nickname_created_at ON scores (nickname, created_at)",
    "CREATE UNIQUE INDEX IF NOT EXISTS scores_one_active_per_nickname
        ON scores (nickname) WHERE is_active",
];

pub async fn migrate_sqlite(pool: &SqlitePool) -> Result<()> {
    for statement in SQLITE_SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    debug!(backend = "sqlite", "schema ready");
    Ok(())
}

pub async fn migrate_postgres(pool: &PgPool) -> Result<()> {
    // one transaction so concurrent starters do not observe a half-built schema
    let mut tx = pool.begin().await?;
    for statement in POSTGRES_SCHEMA {
        sqlx::query(statement).execute(&mut *tx).await?;
    }
    tx.commit().await?;
    debug!(backend = "postgres", "schema ready");
    Ok(())
}
