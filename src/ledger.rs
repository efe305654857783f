//! The engine adapters talk to.
//!
//! [`Ledger`] owns a shared handle to whichever [`ScoreStore`] was chosen at
//! startup and layers ranking, percentile and validation on top of it.

use std::sync::Arc;

use tracing::debug;

use crate::error::{LedgerError, Result};
use crate::models::{
    Nickname, RankedEntry, RoundScore, ScoreEntry, Stats, TotalScore, DEFAULT_LEADERBOARD_LIMIT,
    ROUNDS_PER_GAME,
};
use crate::percentile::percentile;
use crate::ranking::rank;
use crate::store::ScoreStore;

#[derive(Debug, Clone)]
pub struct Ledger {
    store: Arc<dyn ScoreStore>,
    total_rounds: u32,
}

impl Ledger {
    pub fn new(store: Arc<dyn ScoreStore>) -> Self {
        Self {
            store,
            total_rounds: ROUNDS_PER_GAME,
        }
    }

    /// Overrides how many rounds make up one total for percentile scaling.
    pub fn with_total_rounds(mut self, total_rounds: u32) -> Self {
        self.total_rounds = total_rounds;
        self
    }

    /// Records a game. An `active` submission replaces the displayed score.
    pub async fn submit(&self, nickname: &Nickname, score: TotalScore, active: bool) -> Result<i64> {
        self.store
            .insert(nickname.as_str(), score.get(), active)
            .await
    }

    /// Records a game and makes it the player's only displayed score.
    pub async fn replace(&self, nickname: &Nickname, score: TotalScore) -> Result<i64> {
        self.submit(nickname, score, true).await
    }

    /// Every game the player submitted, newest first.
    pub async fn history(&self, nickname: &Nickname) -> Result<Vec<ScoreEntry>> {
        self.store.list_by_nickname(nickname.as_str()).await
    }

    /// Displays entry `id` instead of the current one. `false` if the entry
    /// is missing or not the player's.
    pub async fn activate(&self, nickname: &Nickname, id: i64) -> Result<bool> {
        self.store.activate(nickname.as_str(), id).await
    }

    /// Like [`Ledger::activate`] but reports a missing target as
    /// [`LedgerError::NotFound`].
    pub async fn activate_or_err(&self, nickname: &Nickname, id: i64) -> Result<()> {
        if self.activate(nickname, id).await? {
            Ok(())
        } else {
            Err(LedgerError::NotFound {
                nickname: nickname.to_string(),
                id,
            })
        }
    }

    /// Hides the player from the leaderboard without removing history.
    pub async fn deactivate_all(&self, nickname: &Nickname) -> Result<bool> {
        self.store.deactivate_all(nickname.as_str()).await
    }

    /// Ranked active scores, `DEFAULT_LEADERBOARD_LIMIT` rows unless told otherwise.
    pub async fn leaderboard(&self, limit: Option<u32>) -> Result<Vec<RankedEntry>> {
        let limit = limit.unwrap_or(DEFAULT_LEADERBOARD_LIMIT);
        let rows = self.store.active_leaderboard(limit).await?;
        Ok(rank(rows))
    }

    /// How many recorded games, scaled to one round, `round_score` beats.
    pub async fn percentile(&self, round_score: RoundScore) -> Result<u8> {
        let totals = self.store.all_scores().await?;
        let value = percentile(round_score.get(), &totals, self.total_rounds);
        debug!(
            round_score = round_score.get(),
            population = totals.len(),
            percentile = value,
            "computed percentile"
        );
        Ok(value)
    }

    pub async fn stats(&self) -> Result<Stats> {
        self.store.stats().await
    }
}
