use crate::sr::LevelRow;

/// Tolerance on the gap comparison so ladder rounding does not merge levels
/// sitting exactly `min_gap` apart
const GAP_EPSILON: f64 = 1e-9;

/// Which of two neighbouring levels gives way
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeDecision {
    DropCurrent,
    DropPrevious,
}

/// Pick the survivor of two levels that sit too close together
///
/// `prev` is the lower-priced level. Rules are checked in order and the
/// first match wins; a current level that is no better on both bounces and
/// score always gives way, so exact ties keep the lower level.
pub fn resolve(prev: &LevelRow, cur: &LevelRow) -> MergeDecision {
    let (b, pb) = (cur.bounces, prev.bounces);
    let (s, ps) = (cur.total_score, prev.total_score);

    if b <= pb && s <= ps {
        MergeDecision::DropCurrent
    } else if b >= pb && s >= ps {
        MergeDecision::DropPrevious
    } else if b <= pb && s > ps {
        // score outweighs bounces
        MergeDecision::DropPrevious
    } else if b >= pb && s < ps {
        MergeDecision::DropCurrent
    } else {
        MergeDecision::DropCurrent
    }
}

/// One pass over price-sorted rows; returns the survivors and the number
/// of rows dropped
fn merge_pass(rows: &[LevelRow], min_gap: f64) -> (Vec<LevelRow>, usize) {
    let mut kept: Vec<LevelRow> = Vec::with_capacity(rows.len());
    let mut dropped = 0;

    for cur in rows {
        let Some(prev) = kept.last_mut() else {
            kept.push(cur.clone());
            continue;
        };

        if cur.price - prev.price >= min_gap - GAP_EPSILON {
            kept.push(cur.clone());
            continue;
        }

        dropped += 1;
        match resolve(prev, cur) {
            MergeDecision::DropCurrent => {
                tracing::debug!("Merge: {:.5} absorbed by {:.5}", cur.price, prev.price);
            }
            MergeDecision::DropPrevious => {
                tracing::debug!("Merge: {:.5} absorbed by {:.5}", prev.price, cur.price);
                *prev = cur.clone();
            }
        }
    }

    (kept, dropped)
}

/// Collapse levels closer than `min_gap` until a pass drops nothing
///
/// Input order does not matter; the output is sorted by ascending price and
/// every pair of neighbours is at least `min_gap` apart.
pub fn merge_levels(rows: &[LevelRow], min_gap: f64) -> Vec<LevelRow> {
    let mut current = rows.to_vec();
    current.sort_by(|a, b| a.price.total_cmp(&b.price));

    let mut passes = 0;
    loop {
        let (next, dropped) = merge_pass(&current, min_gap);
        passes += 1;
        current = next;
        if dropped == 0 {
            break;
        }
    }

    tracing::debug!(
        "Merged {} levels into {} after {} passes",
        rows.len(),
        current.len(),
        passes
    );
    current
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn row(price: f64, bounces: usize, total_score: f64) -> LevelRow {
        LevelRow {
            price,
            bounces,
            score_per_bounce: 0.0,
            total_score,
        }
    }

    #[test]
    fn test_weaker_current_is_dropped() {
        let prev = row(1.0, 3, 30.0);
        assert_eq!(resolve(&prev, &row(1.001, 2, 20.0)), MergeDecision::DropCurrent);
        assert_eq!(resolve(&prev, &row(1.001, 3, 20.0)), MergeDecision::DropCurrent);
    }

    #[test]
    fn test_stronger_current_replaces_previous() {
        let prev = row(1.0, 3, 30.0);
        assert_eq!(resolve(&prev, &row(1.001, 4, 40.0)), MergeDecision::DropPrevious);
        assert_eq!(resolve(&prev, &row(1.001, 3, 31.0)), MergeDecision::DropPrevious);
    }

    #[test]
    fn test_score_beats_bounces() {
        let prev = row(1.0, 5, 30.0);
        // Fewer bounces but a higher score wins
        assert_eq!(resolve(&prev, &row(1.001, 2, 45.0)), MergeDecision::DropPrevious);
        // More bounces but a lower score loses
        assert_eq!(resolve(&row(1.0, 2, 45.0), &row(1.001, 5, 30.0)), MergeDecision::DropCurrent);
    }

    #[test]
    fn test_exact_tie_keeps_lower_level() {
        let prev = row(1.0, 3, 30.0);
        assert_eq!(resolve(&prev, &row(1.001, 3, 30.0)), MergeDecision::DropCurrent);
    }

    #[test]
    fn test_distant_levels_untouched() {
        let rows = vec![row(1.0, 1, 5.0), row(1.002, 1, 5.0), row(1.004, 1, 5.0)];
        let merged = merge_levels(&rows, 0.0018);
        assert_eq!(merged, rows);
    }

    #[test]
    fn test_exact_gap_is_not_merged() {
        // 3 x 0.0006 with ladder rounding noise
        let rows = vec![row(1.0, 1, 5.0), row(1.0018, 1, 5.0)];
        assert_eq!(merge_levels(&rows, 3.0 * 0.0006).len(), 2);
    }

    #[test]
    fn test_chain_collapses_to_strongest() {
        let rows = vec![
            row(1.0000, 2, 10.0),
            row(1.0006, 4, 40.0),
            row(1.0012, 3, 20.0),
            row(1.0018, 1, 5.0),
        ];
        let merged = merge_levels(&rows, 0.0018);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].price, 1.0006);
    }

    #[test]
    fn test_rising_chain_keeps_last() {
        let rows = vec![row(1.000, 1, 5.0), row(1.001, 2, 10.0), row(1.002, 3, 20.0)];
        let merged = merge_levels(&rows, 0.0015);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].price, 1.002);
    }

    #[test]
    fn test_unsorted_input_is_sorted() {
        let rows = vec![row(1.004, 1, 5.0), row(1.000, 1, 5.0)];
        let merged = merge_levels(&rows, 0.0018);
        assert_eq!(merged[0].price, 1.000);
        assert_eq!(merged[1].price, 1.004);
    }

    #[test]
    fn test_random_rows_respect_min_gap() {
        let mut rng = StdRng::seed_from_u64(7);
        let step = 0.0006;
        let min_gap = 3.0 * step;

        for _ in 0..50 {
            let rows: Vec<LevelRow> = (0..40)
                .filter_map(|k| {
                    if !rng.gen_bool(0.5) {
                        return None;
                    }
                    let bounces: usize = rng.gen_range(1..6);
                    let score: u32 = rng.gen_range(1..50);
                    Some(row(1.0 + k as f64 * step, bounces, f64::from(score)))
                })
                .collect();

            let merged = merge_levels(&rows, min_gap);
            for pair in merged.windows(2) {
                assert!(pair[1].price - pair[0].price >= min_gap - 1e-9);
            }
            // Survivors come from the input
            for m in &merged {
                assert!(rows.contains(m));
            }
            // Idempotent at the fixed point
            assert_eq!(merge_levels(&merged, min_gap), merged);
        }
    }
}
