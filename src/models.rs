use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, Result};

/// Rounds that add up to one total score.
pub const ROUNDS_PER_GAME: u32 = 4;
/// Highest score a single round can award.
pub const MAX_ROUND_SCORE: i32 = 100;
/// Highest total score a game can reach.
pub const MAX_TOTAL_SCORE: i32 = MAX_ROUND_SCORE * ROUNDS_PER_GAME as i32;
/// Longest nickname accepted, in characters.
pub const MAX_NICKNAME_LEN: usize = 64;
/// Rows returned by a leaderboard query when the caller does not pick a limit.
pub const DEFAULT_LEADERBOARD_LIMIT: u32 = 50;

/// One submitted game result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ScoreEntry {
    pub id: i64,
    pub nickname: String,
    pub score: i32,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
}

/// An active entry as read for the leaderboard, already ordered by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct LeaderboardRow {
    pub nickname: String,
    pub score: i32,
}

/// A leaderboard row with its competition rank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedEntry {
    pub rank: u32,
    pub nickname: String,
    pub score: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Stats {
    /// Players with a displayed score.
    pub distinct_active_nicknames: i64,
    /// Every submission ever recorded.
    pub total_entries: i64,
}

/// A player name checked against the 1..=64 character bound.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Nickname(String);

impl Nickname {
    pub fn parse(raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into();
        let len = raw.chars().count();
        if len == 0 || len > MAX_NICKNAME_LEN {
            return Err(LedgerError::InvalidInput(format!(
                "nickname must be 1 to {MAX_NICKNAME_LEN} characters, got {len}"
            )));
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Nickname {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Nickname {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A game total in `0..=MAX_TOTAL_SCORE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TotalScore(i32);

impl TotalScore {
    pub fn new(score: i32) -> Result<Self> {
        if !(0..=MAX_TOTAL_SCORE).contains(&score) {
            return Err(LedgerError::InvalidInput(format!(
                "score must be between 0 and {MAX_TOTAL_SCORE}, got {score}"
            )));
        }
        Ok(Self(score))
    }

    pub fn get(self) -> i32 {
        self.0
    }
}

/// A single round result in `0..=MAX_ROUND_SCORE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RoundScore(i32);

impl RoundScore {
    pub fn new(score: i32) -> Result<Self> {
        if !(0..=MAX_ROUND_SCORE).contains(&score) {
            return Err(LedgerError::InvalidInput(format!(
                "round score must be between 0 and {MAX_ROUND_SCORE}, got {score}"
            )));
        }
        Ok(Self(score))
    }

    pub fn get(self) -> i32 {
        self.0
    }
}
