// Trade direction and stop-loss placement
pub mod direction;

pub use direction::PivotDirectionRule;

use crate::models::{CandleSeries, Direction};
use chrono::{DateTime, Utc};

/// Number of most recent candles scanned for the stop-loss extreme
pub const SL_LOOKBACK: usize = 5;

/// Decides whether a zone touch is traded long or short
pub trait DirectionRule: Send + Sync {
    /// Direction for the signal candle at `time`, given the history up to and
    /// including it
    fn infer(&self, time: DateTime<Utc>, history: &CandleSeries) -> Direction;

    fn name(&self) -> &str;
}

/// Stop-loss anchor over the last `SL_LOOKBACK` candles
///
/// Highest high for a short, lowest low for a long. `None` for an empty
/// history.
pub fn stop_loss_extreme(history: &CandleSeries, direction: Direction) -> Option<f64> {
    let recent = history.last_n(SL_LOOKBACK);
    match direction {
        Direction::Short => recent.iter().map(|c| c.high).reduce(f64::max),
        Direction::Long => recent.iter().map(|c| c.low).reduce(f64::min),
    }
}
