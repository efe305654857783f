//! Competition ranking over the active leaderboard.

use crate::models::{LeaderboardRow, RankedEntry};

/// Assigns "1224" style competition ranks.
///
/// `rows` must already be ordered by score descending. Equal scores share the
/// rank of the first row in their run; the next distinct score takes its
/// 1-based position. Ranks are derived on every call and never stored.
pub fn rank(rows: Vec<LeaderboardRow>) -> Vec<RankedEntry> {
    let mut ranked = Vec::with_capacity(rows.len());
    let mut current_rank = 0;
    let mut prev_score = None;
    for (position, row) in (1u32..).zip(rows) {
        if prev_score != Some(row.score) {
            current_rank = position;
            prev_score = Some(row.score);
        }
        ranked.push(RankedEntry {
            rank: current_rank,
            nickname: row.nickname,
            score: row.score,
        });
    }
    ranked
}

#[cfg(test)]
mod test {
    use super::*;

    fn rows(scores: &[i32]) -> Vec<LeaderboardRow> {
        scores
            .iter()
            .enumerate()
            .map(|(i, &score)| LeaderboardRow {
                nickname: format!("player{i}"),
                score,
            })
            .collect()
    }

    fn ranks(scores: &[i32]) -> Vec<u32> {
        rank(rows(scores)).into_iter().map(|e| e.rank).collect()
    }

    #[test]
    fn ties_share_rank_and_next_score_jumps() {
        assert_eq!(ranks(&[400, 400, 390, 390, 390, 200]), [1, 1, 3, 3, 3, 6]);
    }

    #[test]
    fn distinct_scores_rank_by_position() {
        assert_eq!(ranks(&[300, 250, 100]), [1, 2, 3]);
    }

    #[test]
    fn all_equal_scores_share_first_place() {
        assert_eq!(ranks(&[0, 0, 0]), [1, 1, 1]);
    }

    #[test]
    fn empty_board_is_empty() {
        assert!(rank(Vec::new()).is_empty());
    }

    #[test]
    fn keeps_row_order_and_names() {
        let ranked = rank(rows(&[10, 10]));
        assert_eq!(ranked[0].nickname, "player0");
        assert_eq!(ranked[1].nickname, "player1");
    }
}
