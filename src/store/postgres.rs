use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Postgres, Transaction};
use tracing::{debug, info, warn};

use super::{sql, PoolSettings, ScoreStore};
use crate::error::Result;
use crate::migrate::migrate_postgres;
use crate::models::{LeaderboardRow, ScoreEntry, Stats};

/// Networked store over a Postgres connection pool.
///
/// Activation-changing writes take a transaction-scoped advisory lock keyed on
/// the nickname, so writers for one player are linearized while different
/// players proceed in parallel. The lock is released on commit or rollback.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub async fn connect(url: &str, settings: PoolSettings) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections.max(1))
            .acquire_timeout(settings.acquire_timeout)
            .connect(url)
            .await?;
        debug!(max_connections = settings.max_connections, "opened postgres store");
        Ok(Self { pool })
    }

    /// Starts a transaction holding the advisory lock for `nickname`.
    async fn lock_nickname(&self, nickname: &str) -> Result<Transaction<'static, Postgres>> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(nickname)
            .execute(&mut *tx)
            .await?;
        Ok(tx)
    }
}

#[async_trait]
impl ScoreStore for PostgresStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn initialize(&self) -> Result<()> {
        migrate_postgres(&self.pool).await
    }

    async fn insert(&self, nickname: &str, score: i32, active: bool) -> Result<i64> {
        let mut tx = self.lock_nickname(nickname).await?;
        if active {
            sqlx::query("UPDATE scores SET is_active = FALSE WHERE nickname = $1 AND is_active")
                .bind(nickname)
                .execute(&mut *tx)
                .await?;
        }
        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO scores (nickname, score, is_active) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(nickname)
        .bind(score)
        .bind(active)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;
        info!(nickname, score, active, id, "score recorded");
        Ok(id)
    }

    async fn list_by_nickname(&self, nickname: &str) -> Result<Vec<ScoreEntry>> {
        let entries = sqlx::query_as::<_, ScoreEntry>(
            "SELECT id, nickname, score, is_active, created_at FROM scores \
             WHERE nickname = $1 ORDER BY created_at DESC, id DESC",
        )
        .bind(nickname)
        .fetch_all(&self.pool)
        .await?;
        debug!(nickname, count = entries.len(), "listed scores");
        Ok(entries)
    }

    async fn activate(&self, nickname: &str, id: i64) -> Result<bool> {
        let mut tx = self.lock_nickname(nickname).await?;
        let owned = sqlx::query_scalar::<_, i64>(
            "SELECT id FROM scores WHERE id = $1 AND nickname = $2",
        )
        .bind(id)
        .bind(nickname)
        .fetch_optional(&mut *tx)
        .await?;
        if owned.is_none() {
            tx.rollback().await?;
            warn!(nickname, id, "activation target not found");
            return Ok(false);
        }
        sqlx::query("UPDATE scores SET is_active = FALSE WHERE nickname = $1 AND is_active")
            .bind(nickname)
            .execute(&mut *tx)
            .await?;
        sqlx::query("UPDATE scores SET is_active = TRUE WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        info!(nickname, id, "score activated");
        Ok(true)
    }

    async fn deactivate_all(&self, nickname: &str) -> Result<bool> {
        let mut tx = self.lock_nickname(nickname).await?;
        let cleared =
            sqlx::query("UPDATE scores SET is_active = FALSE WHERE nickname = $1 AND is_active")
                .bind(nickname)
                .execute(&mut *tx)
                .await?
                .rows_affected();
        tx.commit().await?;
        info!(nickname, cleared, "scores deactivated");
        Ok(true)
    }

    async fn active_leaderboard(&self, limit: u32) -> Result<Vec<LeaderboardRow>> {
        let rows = sqlx::query_as::<_, LeaderboardRow>(
            "SELECT nickname, score FROM scores WHERE is_active \
             ORDER BY score DESC, created_at ASC, id ASC LIMIT $1",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;
        debug!(limit, count = rows.len(), "read leaderboard");
        Ok(rows)
    }

    async fn all_scores(&self) -> Result<Vec<i32>> {
        Ok(sqlx::query_scalar::<_, i32>(sql::ALL_SCORES)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn stats(&self) -> Result<Stats> {
        let (distinct_active_nicknames, total_entries) =
            sqlx::query_as::<_, (i64, i64)>(sql::STATS)
                .fetch_one(&self.pool)
                .await?;
        Ok(Stats {
            distinct_active_nicknames,
            total_entries,
        })
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
