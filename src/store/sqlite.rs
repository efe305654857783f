use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::{sql, PoolSettings, ScoreStore};
use crate::error::Result;
use crate::migrate::migrate_sqlite;
use crate::models::{LeaderboardRow, ScoreEntry, Stats};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Embedded, file-backed store.
///
/// SQLite allows a single writer, so every write goes through `write_lock`
/// and runs on one pooled connection at a time. Readers use the rest of the
/// pool and, under WAL, see the state just before or just after a concurrent
/// write.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
    write_lock: Arc<Mutex<()>>,
}

impl SqliteStore {
    /// Opens (creating if needed) the database file at `path`.
    pub async fn connect(path: impl AsRef<Path>, settings: PoolSettings) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path.as_ref())
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(BUSY_TIMEOUT);
        let pool = SqlitePoolOptions::new()
            .max_connections(settings.max_connections.max(1))
            .acquire_timeout(settings.acquire_timeout)
            .connect_with(options)
            .await?;
        debug!(path = %path.as_ref().display(), "opened sqlite store");
        Ok(Self {
            pool,
            write_lock: Arc::new(Mutex::new(())),
        })
    }
}

#[async_trait]
impl ScoreStore for SqliteStore {
    fn backend(&self) -> &'static str {
        "sqlite"
    }

    async fn initialize(&self) -> Result<()> {
        let _writer = self.write_lock.lock().await;
        migrate_sqlite(&self.pool).await
    }

    async fn insert(&self, nickname: &str, score: i32, active: bool) -> Result<i64> {
        let _writer = self.write_lock.lock().await;
        let mut tx = self.pool.begin().await?;
        if active {
            sqlx::query("UPDATE scores SET is_active = 0 WHERE nickname = ? AND is_active")
                .bind(nickname)
                .execute(&mut *tx)
                .await?;
        }
        let id = sqlx::query("INSERT INTO scores (nickname, score, is_active) VALUES (?, ?, ?)")
            .bind(nickname)
            .bind(score)
            .bind(active)
            .execute(&mut *tx)
            .await?
            .last_insert_rowid();
        tx.commit().await?;
        info!(nickname, score, active, id, "score recorded");
        Ok(id)
    }

    async fn list_by_nickname(&self, nickname: &str) -> Result<Vec<ScoreEntry>> {
        let entries = sqlx::query_as::<_, ScoreEntry>(
            "SELECT id, nickname, score, is_active, created_at FROM scores \
             WHERE nickname = ? ORDER BY created_at DESC, id DESC",
        )
        .bind(nickname)
        .fetch_all(&self.pool)
        .await?;
        debug!(nickname, count = entries.len(), "listed scores");
        Ok(entries)
    }

    async fn activate(&self, nickname: &str, id: i64) -> Result<bool> {
        let _writer = self.write_lock.lock().await;
        let mut tx = self.pool.begin().await?;
        let owned = sqlx::query_scalar::<_, i64>(
            "SELECT id FROM scores WHERE id = ? AND nickname = ?",
        )
        .bind(id)
        .bind(nickname)
        .fetch_optional(&mut *tx)
        .await?;
        if owned.is_none() {
            warn!(nickname, id, "activation target not found");
            return Ok(false);
        }
        sqlx::query("UPDATE scores SET is_active = 0 WHERE nickname = ? AND is_active")
            .bind(nickname)
            .execute(&mut *tx)
            .await?;
        sqlx::query("UPDATE scores SET is_active = 1 WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        info!(nickname, id, "score activated");
        Ok(true)
    }

    async fn deactivate_all(&self, nickname: &str) -> Result<bool> {
        let _writer = self.write_lock.lock().await;
        let cleared = sqlx::query("UPDATE scores SET is_active = 0 WHERE nickname = ? AND is_active")
            .bind(nickname)
            .execute(&self.pool)
            .await?
            .rows_affected();
        info!(nickname, cleared, "scores deactivated");
        Ok(true)
    }

    async fn active_leaderboard(&self, limit: u32) -> Result<Vec<LeaderboardRow>> {
        let rows = sqlx::query_as::<_, LeaderboardRow>(
            "SELECT nickname, score FROM scores WHERE is_active \
             ORDER BY score DESC, created_at ASC, id ASC LIMIT ?",
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

#[cfg(test)]
mod test {
    use super::*;

    async fn open(dir: &tempfile::TempDir) -> SqliteStore {
        let store = SqliteStore::connect(dir.path().join("game.db"), PoolSettings::default())
            .await
            .unwrap();
        store.initialize().await.unwrap();
        store
    }

    #[tokio::test]
    async fn initialize_keeps_existing_rows() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(&dir).await;
        store.insert("ada", 120, true).await.unwrap();
        store.initialize().await.unwrap();
        store.close().await;

        let reopened = open(&dir).await;
        let entries = reopened.list_by_nickname("ada").await.unwrap();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].is_active);
    }

    #[tokio::test]
    async fn abandoned_transaction_leaves_no_trace() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(&dir).await;
        let first = store.insert("ada", 100, true).await.unwrap();

        {
            let mut tx = store.pool.begin().await.unwrap();
            sqlx::query("UPDATE scores SET is_active = 0 WHERE nickname = ?")
                .bind("ada")
                .execute(&mut *tx)
                .await
                .unwrap();
            // dropped without commit
        }

        let entries = store.list_by_nickname("ada").await.unwrap();
        assert_eq!(entries[0].id, first);
        assert!(entries[0].is_active);
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn second_active_row_is_rejected_by_the_schema() {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::ERROR)
            .finish();
        let _logger = tracing::subscriber::set_default(subscriber);

        let dir = tempfile::tempdir().unwrap();
        let store = open(&dir).await;
        store.insert("ada", 100, true).await.unwrap();

        let err = sqlx::query("INSERT INTO scores (nickname, score, is_active) VALUES (?, ?, 1)")
            .bind("ada")
            .bind(50)
            .execute(&store.pool)
            .await
            .map_err(crate::error::LedgerError::from)
            .unwrap_err();
        assert!(matches!(
            err,
            crate::error::LedgerError::InvariantViolation(_)
        ));

        let logged = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert!(logged.contains("ERROR"), "{logged}");
        assert!(logged.contains("second active score rejected"), "{logged}");
    }

    #[tokio::test]
    async fn other_constraint_failures_stay_storage_errors() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(&dir).await;
        let id = store.insert("ada", 100, false).await.unwrap();

        let err = sqlx::query("INSERT INTO scores (id, nickname, score) VALUES (?, ?, ?)")
            .bind(id)
            .bind("bob")
            .bind(10)
            .execute(&store.pool)
            .await
            .map_err(crate::error::LedgerError::from)
            .unwrap_err();
        assert!(matches!(
            err,
            crate::error::LedgerError::StorageUnavailable(_)
        ));
    }
}
