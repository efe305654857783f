use clap::{Parser, Subcommand};
use serde_json::{json, Value};

use crate::config::DatabaseArgs;
use crate::error::Result;
use crate::ledger::Ledger;
use crate::logging::LogArgs;
use crate::models::{Nickname, RoundScore, TotalScore};

/// Records game scores and answers leaderboard queries.
#[derive(Debug, Parser)]
#[command(name = "score-ledger", version, about)]
pub struct Cli {
    #[command(flatten)]
    pub database: DatabaseArgs,

    #[command(flatten)]
    pub log: LogArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Record a game. It becomes the displayed score unless --inactive.
    Submit {
        nickname: String,
        score: i32,
        #[arg(long)]
        inactive: bool,
    },
    /// Record a game and make it the only displayed score.
    Replace { nickname: String, score: i32 },
    /// List a player's games, newest first.
    History { nickname: String },
    /// Display one of the player's earlier games instead.
    Activate { nickname: String, id: i64 },
    /// Hide the player from the leaderboard.
    Deactivate { nickname: String },
    /// Ranked displayed scores.
    Leaderboard {
        #[arg(long)]
        limit: Option<u32>,
    },
    /// How a single round result compares with every recorded game.
    Percentile { round_score: i32 },
    /// Player and submission counts.
    Stats,
}

impl Command {
    /// Runs the command and returns the JSON body to print.
    pub async fn execute(self, ledger: &Ledger) -> Result<Value> {
        match self {
            Command::Submit {
                nickname,
                score,
                inactive,
            } => {
                let nickname = Nickname::parse(nickname)?;
                let id = ledger
                    .submit(&nickname, TotalScore::new(score)?, !inactive)
                    .await?;
                Ok(json!({ "ok": true, "id": id }))
            }
            Command::Replace { nickname, score } => {
                let nickname = Nickname::parse(nickname)?;
                let id = ledger.replace(&nickname, TotalScore::new(score)?).await?;
                Ok(json!({ "ok": true, "id": id }))
            }
            Command::History { nickname } => {
                let scores = ledger.history(&Nickname::parse(nickname)?).await?;
                Ok(json!({ "scores": scores }))
            }
            Command::Activate { nickname, id } => {
                ledger
                    .activate_or_err(&Nickname::parse(nickname)?, id)
                    .await?;
                Ok(json!({ "ok": true }))
            }
            Command::Deactivate { nickname } => {
                let ok = ledger.deactivate_all(&Nickname::parse(nickname)?).await?;
                Ok(json!({ "ok": ok }))
            }
            Command::Leaderboard { limit } => {
                let entries = ledger.leaderboard(limit).await?;
                Ok(json!({ "entries": entries }))
            }
            Command::Percentile { round_score } => {
                let percentile = ledger.percentile(RoundScore::new(round_score)?).await?;
                Ok(json!({ "percentile": percentile }))
            }
            Command::Stats => {
                let stats = ledger.stats().await?;
                Ok(json!({
                    "players": stats.distinct_active_nicknames,
                    "submissions": stats.total_entries,
                }))
            }
        }
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use super::*;
    use crate::error::LedgerError;
    use crate::store::{PoolSettings, SqliteStore};

    async fn ledger(dir: &tempfile::TempDir) -> Ledger {
        let store = SqliteStore::connect(dir.path().join("game.db"), PoolSettings::default())
            .await
            .unwrap();
        crate::store::ScoreStore::initialize(&store).await.unwrap();
        Ledger::new(Arc::new(store))
    }

    #[test]
    fn parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "score-ledger",
            "--db.path",
            "other.db",
            "leaderboard",
            "--limit",
            "3",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.log.verbosity, 2);
        assert_eq!(cli.database.db_path, std::path::PathBuf::from("other.db"));
        assert!(matches!(cli.command, Command::Leaderboard { limit: Some(3) }));
    }

    #[tokio::test]
    async fn submit_then_leaderboard() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = ledger(&dir).await;
        let out = Command::Submit {
            nickname: "ada".into(),
            score: 320,
            inactive: false,
        }
        .execute(&ledger)
        .await
        .unwrap();
        assert_eq!(out["ok"], true);

        let out = Command::Leaderboard { limit: None }
            .execute(&ledger)
            .await
            .unwrap();
        assert_eq!(out["entries"][0]["rank"], 1);
        assert_eq!(out["entries"][0]["nickname"], "ada");
        assert_eq!(out["entries"][0]["score"], 320);
    }

    #[tokio::test]
    async fn rejects_out_of_range_input_before_storage() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = ledger(&dir).await;
        let err = Command::Submit {
            nickname: "ada".into(),
            score: 401,
            inactive: false,
        }
        .execute(&ledger)
        .await
        .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidInput(_)));

        let err = Command::Percentile { round_score: -1 }
            .execute(&ledger)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidInput(_)));
        assert_eq!(ledger.stats().await.unwrap().total_entries, 0);
    }

    #[tokio::test]
    async fn activate_missing_entry_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = ledger(&dir).await;
        let err = Command::Activate {
            nickname: "ada".into(),
            id: 42,
        }
        .execute(&ledger)
        .await
        .unwrap_err();
        assert!(matches!(err, LedgerError::NotFound { .. }));
    }
}
