use crate::sr::LevelRow;

/// Quantile of `values` using linear interpolation between closest ranks
///
/// `q` is a fraction in `[0, 1]`. Returns `None` for an empty slice.
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;

    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Bounce and score cut-offs for one ladder scan
///
/// A threshold is `None` when no row had positive activity for it; that
/// criterion then selects nothing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub bounces: Option<f64>,
    pub score: Option<f64>,
}

impl Thresholds {
    /// Quantile `q` over rows with positive bounces / positive total score
    pub fn compute(rows: &[LevelRow], q: f64) -> Self {
        let bounces: Vec<f64> = rows
            .iter()
            .filter(|r| r.bounces > 0)
            .map(|r| r.bounces as f64)
            .collect();
        let scores: Vec<f64> = rows
            .iter()
            .filter(|r| r.total_score > 0.0)
            .map(|r| r.total_score)
            .collect();

        Self {
            bounces: quantile(&bounces, q),
            score: quantile(&scores, q),
        }
    }

    pub fn admits(&self, row: &LevelRow) -> bool {
        let over_bounces = self.bounces.is_some_and(|th| row.bounces as f64 > th);
        let over_score = self.score.is_some_and(|th| row.total_score > th);
        over_bounces || over_score
    }
}

/// Keep the rows above either threshold
pub fn select_levels(rows: &[LevelRow], q: f64) -> (Vec<LevelRow>, Thresholds) {
    let thresholds = Thresholds::compute(rows, q);

    match (thresholds.bounces, thresholds.score) {
        (Some(b), Some(s)) => {
            tracing::debug!("Bounce threshold {:.2}, total score threshold {:.2}", b, s)
        }
        _ => tracing::debug!(
            "Insufficient data for thresholds ({:?}); affected criteria select nothing",
            thresholds
        ),
    }

    let selected = rows
        .iter()
        .filter(|r| thresholds.admits(r))
        .cloned()
        .collect();

    (selected, thresholds)
}
