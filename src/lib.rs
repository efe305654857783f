//! Score ledger for the colour-guessing game.
//!
//! Players submit game totals (four rounds of up to 100 points each). Each
//! player has at most one displayed score at a time; the leaderboard ranks
//! displayed scores and the percentile compares one round against every game
//! ever recorded.

pub mod cli;
pub mod config;
pub mod error;
pub mod ledger;
pub mod logging;
pub mod migrate;
pub mod models;
pub mod percentile;
pub mod ranking;
pub mod store;

pub use error::{LedgerError, Result};
pub use ledger::Ledger;
pub use models::{LeaderboardRow, Nickname, RankedEntry, RoundScore, ScoreEntry, Stats, TotalScore};
pub use store::{PoolSettings, PostgresStore, ScoreStore, SqliteStore};
