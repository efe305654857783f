//! Backend selection.
//!
//! A `DATABASE_URL` picks the networked Postgres store; without one the
//! embedded SQLite file at `DB_PATH` is used. The choice is made once and the
//! resulting store is shared immutably for the life of the process.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use tracing::info;

use crate::error::Result;
use crate::store::{PoolSettings, PostgresStore, ScoreStore, SqliteStore};

/// Database configuration.
#[derive(Debug, Args, Clone)]
#[command(next_help_heading = "Database")]
pub struct DatabaseArgs {
    /// Postgres connection string. When unset the embedded database is used.
    #[arg(long = "database-url", env = "DATABASE_URL", value_name = "URL")]
    pub database_url: Option<String>,

    /// Embedded database file.
    #[arg(long = "db.path", env = "DB_PATH", default_value = "game.db", value_name = "PATH")]
    pub db_path: PathBuf,

    /// Pooled connections. Callers wait when all are busy.
    #[arg(long = "db.max-connections", default_value_t = 5, value_name = "N")]
    pub max_connections: u32,

    /// Seconds to wait for a pooled connection before giving up.
    #[arg(long = "db.acquire-timeout", default_value_t = 30, value_name = "SECS")]
    pub acquire_timeout: u64,
}

impl Default for DatabaseArgs {
    fn default() -> Self {
        Self {
            database_url: None,
            db_path: PathBuf::from("game.db"),
            max_connections: 5,
            acquire_timeout: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend {
    Embedded(PathBuf),
    Networked(String),
}

impl DatabaseArgs {
    pub fn backend(&self) -> Backend {
        match self.database_url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => Backend::Networked(url.to_owned()),
            _ => Backend::Embedded(self.db_path.clone()),
        }
    }

    pub fn pool_settings(&self) -> PoolSettings {
        PoolSettings {
            max_connections: self.max_connections,
            acquire_timeout: Duration::from_secs(self.acquire_timeout),
        }
    }

    /// Connects the selected backend and makes sure the schema exists.
    pub async fn open(&self) -> Result<Arc<dyn ScoreStore>> {
        let settings = self.pool_settings();
        let store: Arc<dyn ScoreStore> = match self.backend() {
            Backend::Embedded(path) => Arc::new(SqliteStore::connect(path, settings).await?),
            Backend::Networked(url) => Arc::new(PostgresStore::connect(&url, settings).await?),
        };
        store.initialize().await?;
        info!(backend = store.backend(), "score store ready");
        Ok(store)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn url_selects_networked_backend() {
        let args = DatabaseArgs {
            database_url: Some("postgres://localhost/game".into()),
            ..Default::default()
        };
        assert_eq!(
            args.backend(),
            Backend::Networked("postgres://localhost/game".into())
        );
    }

    #[test]
    fn missing_or_blank_url_selects_embedded_backend() {
        let mut args = DatabaseArgs::default();
        assert_eq!(args.backend(), Backend::Embedded("game.db".into()));
        args.database_url = Some("  ".into());
        assert_eq!(args.backend(), Backend::Embedded("game.db".into()));
    }

    #[tokio::test]
    async fn open_initializes_embedded_store() {
        let dir = tempfile::tempdir().unwrap();
        let args = DatabaseArgs {
            db_path: dir.path().join("game.db"),
            ..Default::default()
        };
        let store = args.open().await.unwrap();
        assert_eq!(store.backend(), "sqlite");
        assert_eq!(store.stats().await.unwrap().total_entries, 0);
        store.close().await;
    }
}
