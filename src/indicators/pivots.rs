//! Zig-zag pivot detection
//!
//! A pivot is a local reversal: the close where price turned after moving at
//! least `threshold` (a fraction of price) in the opposite direction.
//! Each pivot is scored by the number of candles in the legs arriving at and
//! leaving it, so long-lasting reversals weigh more than short wiggles.

use crate::models::{Candle, CandleSeries};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PivotKind {
    Peak,
    Valley,
}

impl PivotKind {
    fn opposite(self) -> Self {
        match self {
            PivotKind::Peak => PivotKind::Valley,
            PivotKind::Valley => PivotKind::Peak,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pivot {
    /// Position of the pivot candle in the analysed series
    pub index: usize,
    pub time: DateTime<Utc>,
    pub kind: PivotKind,
    pub close: f64,
    /// High for a peak, low for a valley
    pub extreme: f64,
    pub score: f64,
}

impl Pivot {
    fn from_candle(index: usize, candle: &Candle, kind: PivotKind, score: f64) -> Self {
        let extreme = match kind {
            PivotKind::Peak => candle.high,
            PivotKind::Valley => candle.low,
        };
        Self {
            index,
            time: candle.time,
            kind,
            close: candle.close,
            extreme,
            score,
        }
    }

    /// True when the close or the extreme lies within `[lower, upper]`
    pub fn touches(&self, lower: f64, upper: f64) -> bool {
        let inside = |p: f64| p >= lower && p <= upper;
        inside(self.close) || inside(self.extreme)
    }
}

/// Pivots of one series, in time order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PivotList {
    pivots: Vec<Pivot>,
}

impl PivotList {
    pub fn new(pivots: Vec<Pivot>) -> Self {
        Self { pivots }
    }

    pub fn pivots(&self) -> &[Pivot] {
        &self.pivots
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Pivot> {
        self.pivots.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.pivots.is_empty()
    }

    /// Pivots within `[price - half_width, price + half_width]`
    pub fn in_band(&self, price: f64, half_width: f64) -> PivotList {
        let (lower, upper) = (price - half_width, price + half_width);
        PivotList {
            pivots: self
                .pivots
                .iter()
                .filter(|p| p.touches(lower, upper))
                .cloned()
                .collect(),
        }
    }

    pub fn count(&self) -> usize {
        self.pivots.len()
    }

    pub fn total_score(&self) -> f64 {
        self.pivots.iter().map(|p| p.score).sum()
    }

    /// Average score per pivot, 0 for an empty list
    pub fn avg_score(&self) -> f64 {
        if self.pivots.is_empty() {
            0.0
        } else {
            self.total_score() / self.pivots.len() as f64
        }
    }
}

/// Zig-zag detector over closing prices
#[derive(Debug, Clone, Copy)]
pub struct PivotDetector {
    threshold: f64,
}

impl PivotDetector {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn detect(&self, series: &CandleSeries) -> PivotList {
        let closes: Vec<f64> = series.iter().map(|c| c.close).collect();
        let marks = zigzag(&closes, self.threshold);

        let indices: Vec<(usize, PivotKind)> = marks
            .iter()
            .enumerate()
            .filter_map(|(i, m)| m.map(|kind| (i, kind)))
            .collect();

        let candles = series.candles();
        let pivots = indices
            .iter()
            .enumerate()
            .map(|(j, &(idx, kind))| {
                let arriving = if j > 0 { idx - indices[j - 1].0 } else { 0 };
                let leaving = indices.get(j + 1).map(|&(next, _)| next - idx).unwrap_or(0);
                Pivot::from_candle(idx, &candles[idx], kind, (arriving + leaving) as f64)
            })
            .collect();

        PivotList::new(pivots)
    }
}

/// Mark peaks and valleys; the first and last points are always marked
fn zigzag(closes: &[f64], threshold: f64) -> Vec<Option<PivotKind>> {
    let n = closes.len();
    let mut marks = vec![None; n];
    if n < 2 {
        return marks;
    }

    let up = 1.0 + threshold;
    let down = 1.0 - threshold;

    let initial = initial_pivot(closes, up, down);
    marks[0] = Some(initial);

    // Kind of the pivot currently being tracked
    let mut trend = initial.opposite();
    let mut last_t = 0;
    let mut last_x = closes[0];

    for (t, &x) in closes.iter().enumerate().skip(1) {
        let r = x / last_x;
        match trend {
            PivotKind::Valley => {
                if r >= up {
                    marks[last_t] = Some(PivotKind::Valley);
                    trend = PivotKind::Peak;
                    last_t = t;
                    last_x = x;
                } else if x < last_x {
                    last_t = t;
                    last_x = x;
                }
            }
            PivotKind::Peak => {
                if r <= down {
                    marks[last_t] = Some(PivotKind::Peak);
                    trend = PivotKind::Valley;
                    last_t = t;
                    last_x = x;
                } else if x > last_x {
                    last_t = t;
                    last_x = x;
                }
            }
        }
    }

    if last_t == n - 1 {
        marks[last_t] = Some(trend);
    } else if marks[n - 1].is_none() {
        marks[n - 1] = Some(trend.opposite());
    }

    marks
}

/// Kind of the first point, from whichever threshold is crossed first
fn initial_pivot(closes: &[f64], up: f64, down: f64) -> PivotKind {
    let x0 = closes[0];
    let (mut max_x, mut max_t) = (x0, 0);
    let (mut min_x, mut min_t) = (x0, 0);

    for (t, &x) in closes.iter().enumerate().skip(1) {
        if x / min_x >= up {
            return if min_t == 0 {
                PivotKind::Valley
            } else {
                PivotKind::Peak
            };
        }
        if x / max_x <= down {
            return if max_t == 0 {
                PivotKind::Peak
            } else {
                PivotKind::Valley
            };
        }
        if x > max_x {
            max_x = x;
            max_t = t;
        }
        if x < min_x {
            min_x = x;
            min_t = t;
        }
    }

    if x0 < closes[closes.len() - 1] {
        PivotKind::Valley
    } else {
        PivotKind::Peak
    }
}
