//! Where one round result sits among every recorded game.

/// Percentile reported when nothing has been recorded yet.
pub const EMPTY_POPULATION_PERCENTILE: u8 = 100;

/// Share of historical totals, scaled to one round, that `round_score` beats.
///
/// Each total is divided by `total_rounds` as a real number and counted when
/// strictly below `round_score`. The share is rounded half away from zero
/// (`12.5` becomes `13`). An empty history yields
/// [`EMPTY_POPULATION_PERCENTILE`]. A `total_rounds` of zero is treated as one.
pub fn percentile(round_score: i32, totals: &[i32], total_rounds: u32) -> u8 {
    if totals.is_empty() {
        return EMPTY_POPULATION_PERCENTILE;
    }
    let rounds = f64::from(total_rounds.max(1));
    let threshold = f64::from(round_score);
    let below = totals
        .iter()
        .filter(|&&total| f64::from(total) / rounds < threshold)
        .count();
    let share = below as f64 / totals.len() as f64 * 100.0;
    // share is within 0..=100
    share.round() as u8
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn empty_history_is_best_possible() {
        assert_eq!(percentile(0, &[], 4), 100);
        assert_eq!(percentile(100, &[], 4), 100);
    }

    #[test]
    fn known_population() {
        // per-round equivalents 100, 50, 50, 0
        assert_eq!(percentile(60, &[400, 200, 200, 0], 4), 75);
    }

    #[test]
    fn equal_equivalent_does_not_count_as_below() {
        assert_eq!(percentile(50, &[200, 200], 4), 0);
    }

    #[test]
    fn fractional_equivalents_compare_exactly() {
        // 49.75 is below 50, 50.75 is not
        assert_eq!(percentile(50, &[199, 203], 4), 50);
    }

    #[test]
    fn half_rounds_away_from_zero() {
        // 1 of 8 below = 12.5
        let totals = [0, 400, 400, 400, 400, 400, 400, 400];
        assert_eq!(percentile(1, &totals, 4), 13);
    }

    #[test]
    fn zero_rounds_treated_as_one() {
        assert_eq!(percentile(10, &[5, 20], 0), 50);
    }
}
