use crate::models::{Candle, CandleValidator};
use crate::Result;
use chrono::{DateTime, Utc};

/// Time-ascending candle sequence with unique timestamps
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandleSeries {
    candles: Vec<Candle>,
}

impl CandleSeries {
    /// Build a series, rejecting invalid candles and unordered/duplicate timestamps
    pub fn new(candles: Vec<Candle>) -> Result<Self> {
        CandleValidator::new().validate_sequence(&candles)?;
        Ok(Self { candles })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Candle> {
        self.candles.iter()
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn first(&self) -> Option<&Candle> {
        self.candles.first()
    }

    pub fn last(&self) -> Option<&Candle> {
        self.candles.last()
    }

    /// Candles with `start <= time < end`
    pub fn slice(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> CandleSeries {
        let from = self.candles.partition_point(|c| c.time < start);
        let to = self.candles.partition_point(|c| c.time < end);
        self.sub_range(from, to)
    }

    /// Candles with `start <= time <= end`
    pub fn between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> CandleSeries {
        let from = self.candles.partition_point(|c| c.time < start);
        let to = self.candles.partition_point(|c| c.time <= end);
        self.sub_range(from, to)
    }

    /// First candle at or after `at`
    pub fn at_or_after(&self, at: DateTime<Utc>) -> Option<&Candle> {
        let idx = self.candles.partition_point(|c| c.time < at);
        self.candles.get(idx)
    }

    /// The `n` most recent candles, oldest first
    pub fn last_n(&self, n: usize) -> &[Candle] {
        let from = self.candles.len().saturating_sub(n);
        &self.candles[from..]
    }

    /// Highest high over the series
    pub fn highest(&self) -> Option<f64> {
        self.candles.iter().map(|c| c.high).reduce(f64::max)
    }

    /// Lowest low over the series
    pub fn lowest(&self) -> Option<f64> {
        self.candles.iter().map(|c| c.low).reduce(f64::min)
    }

    fn sub_range(&self, from: usize, to: usize) -> CandleSeries {
        let candles = if from < to {
            self.candles[from..to].to_vec()
        } else {
            Vec::new()
        };
        CandleSeries { candles }
    }
}

impl<'a> IntoIterator for &'a CandleSeries {
    type Item = &'a Candle;
    type IntoIter = std::slice::Iter<'a, Candle>;

    fn into_iter(self) -> Self::IntoIter {
        self.candles.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 3, 2, 0, 0, 0).unwrap()
    }

    fn create_series(prices: &[f64]) -> CandleSeries {
        let candles = prices
            .iter()
            .enumerate()
            .map(|(i, &p)| {
                Candle::new(
                    t0() + Duration::hours(4 * i as i64),
                    p,
                    p + 0.0010,
                    p - 0.0010,
                    p,
                )
            })
            .collect();
        CandleSeries::new(candles).unwrap()
    }

    #[test]
    fn test_slice_is_half_open() {
        let series = create_series(&[1.0, 1.1, 1.2, 1.3, 1.4]);
        let sub = series.slice(t0() + Duration::hours(4), t0() + Duration::hours(12));
        assert_eq!(sub.len(), 2);
        assert_eq!(sub.first().unwrap().close, 1.1);
        assert_eq!(sub.last().unwrap().close, 1.2);
    }

    #[test]
    fn test_between_is_inclusive() {
        let series = create_series(&[1.0, 1.1, 1.2, 1.3, 1.4]);
        let sub = series.between(t0() + Duration::hours(4), t0() + Duration::hours(12));
        assert_eq!(sub.len(), 3);
        assert_eq!(sub.last().unwrap().close, 1.3);
    }

    #[test]
    fn test_slice_out_of_range_is_empty() {
        let series = create_series(&[1.0, 1.1]);
        assert!(series
            .slice(t0() + Duration::days(10), t0() + Duration::days(11))
            .is_empty());
        assert!(series.slice(t0() + Duration::hours(8), t0()).is_empty());
    }

    #[test]
    fn test_highest_lowest() {
        let series = create_series(&[1.2, 1.0, 1.4, 1.1]);
        assert!((series.highest().unwrap() - 1.401).abs() < 1e-9);
        assert!((series.lowest().unwrap() - 0.999).abs() < 1e-9);
        assert!(CandleSeries::empty().highest().is_none());
    }

    #[test]
    fn test_last_n() {
        let series = create_series(&[1.0, 1.1, 1.2]);
        assert_eq!(series.last_n(2).len(), 2);
        assert_eq!(series.last_n(2)[0].close, 1.1);
        assert_eq!(series.last_n(10).len(), 3);
    }

    #[test]
    fn test_at_or_after() {
        let series = create_series(&[1.0, 1.1, 1.2]);
        let candle = series.at_or_after(t0() + Duration::hours(1)).unwrap();
        assert_eq!(candle.time, t0() + Duration::hours(4));
        assert!(series.at_or_after(t0() + Duration::days(1)).is_none());
    }

    #[test]
    fn test_new_rejects_unordered() {
        let mut candles = create_series(&[1.0, 1.1]).candles().to_vec();
        candles.reverse();
        assert!(CandleSeries::new(candles).is_err());
    }
}
