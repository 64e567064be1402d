use crate::indicators::PivotDetector;
use crate::models::{CandleSeries, Direction};
use crate::strategy::DirectionRule;
use chrono::{DateTime, Utc};

/// Counter-trend direction from the last confirmed pivot
///
/// A signal close below the last pivot's close means price came down into
/// the zone, so the trade is long off support; otherwise it is short off
/// resistance. Without a confirmed pivot the first close of the history is
/// used as the reference.
#[derive(Debug, Clone, Copy)]
pub struct PivotDirectionRule {
    threshold: f64,
}

impl PivotDirectionRule {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }
}

impl DirectionRule for PivotDirectionRule {
    fn infer(&self, time: DateTime<Utc>, history: &CandleSeries) -> Direction {
        let upto = history.between(
            history.first().map(|c| c.time).unwrap_or(time),
            time,
        );
        let Some(signal) = upto.last() else {
            tracing::debug!("No history at {}, defaulting to short", time);
            return Direction::Short;
        };
        let signal_index = upto.len() - 1;

        let pivots = PivotDetector::new(self.threshold).detect(&upto);
        let reference = pivots
            .iter()
            .rev()
            .find(|p| p.index < signal_index && p.index > 0)
            .map(|p| p.close)
            .or_else(|| upto.first().map(|c| c.close))
            .unwrap_or(signal.close);

        let direction = if signal.close < reference {
            Direction::Long
        } else {
            Direction::Short
        };
        tracing::debug!(
            "Direction at {}: close {:.5} vs reference {:.5} -> {}",
            time,
            signal.close,
            reference,
            direction
        );
        direction
    }

    fn name(&self) -> &str {
        "pivot"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Candle;
    use chrono::{Duration, TimeZone};

    fn series(closes: &[f64]) -> CandleSeries {
        let t0 = Utc.with_ymd_and_hms(2020, 3, 2, 0, 0, 0).unwrap();
        let candles = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Candle::new(t0 + Duration::hours(4 * i as i64), c, c + 0.001, c - 0.001, c))
            .collect();
        CandleSeries::new(candles).unwrap()
    }

    #[test]
    fn test_falling_into_zone_is_long() {
        // Peak at 1.04, then down to 1.01
        let h = series(&[1.00, 1.02, 1.04, 1.03, 1.02, 1.01]);
        let rule = PivotDirectionRule::new(0.015);
        let t = h.last().unwrap().time;
        assert_eq!(rule.infer(t, &h), Direction::Long);
    }

    #[test]
    fn test_rising_into_zone_is_short() {
        // Valley at 0.96, then up to 0.99
        let h = series(&[1.00, 0.98, 0.96, 0.97, 0.98, 0.99]);
        let rule = PivotDirectionRule::new(0.015);
        let t = h.last().unwrap().time;
        assert_eq!(rule.infer(t, &h), Direction::Short);
    }

    #[test]
    fn test_ignores_candles_after_signal() {
        let h = series(&[1.00, 1.02, 1.04, 1.03, 1.02, 1.01, 1.10, 1.20]);
        let rule = PivotDirectionRule::new(0.015);
        let t = h.candles()[5].time;
        assert_eq!(rule.infer(t, &h), Direction::Long);
    }

    #[test]
    fn test_without_pivots_uses_first_close() {
        let rule = PivotDirectionRule::new(0.5);
        let down = series(&[1.00, 0.999, 0.998]);
        assert_eq!(rule.infer(down.last().unwrap().time, &down), Direction::Long);

        let up = series(&[1.00, 1.001, 1.002]);
        assert_eq!(rule.infer(up.last().unwrap().time, &up), Direction::Short);
    }

    #[test]
    fn test_empty_history_defaults_to_short() {
        let rule = PivotDirectionRule::new(0.01);
        let t = Utc.with_ymd_and_hms(2020, 3, 2, 0, 0, 0).unwrap();
        assert_eq!(rule.infer(t, &CandleSeries::empty()), Direction::Short);
        assert_eq!(rule.name(), "pivot");
    }
}
