//! Support/resistance zone detection
//!
//! A price ladder is laid between the extremes of a look-back window and each
//! level is scored by the zig-zag pivots that fall inside its band. Levels
//! above the quantile thresholds survive, and neighbours closer than three
//! ladder steps are merged until the list is stable.

pub mod merge;
pub mod scanner;
pub mod threshold;
pub mod zones;

pub use merge::{merge_levels, resolve, MergeDecision};
pub use scanner::{price_bounds, scan_levels, LevelRow};
pub use threshold::{quantile, select_levels, Thresholds};
pub use zones::{Zone, ZoneHit, ZoneList};

use crate::api::CandleProvider;
use crate::config::BotConfig;
use crate::indicators::PivotDetector;
use crate::models::{CandleSeries, Pair, Timeframe};
use crate::Result;
use chrono::{DateTime, Duration, Utc};

/// Parameters of one zone detection run
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneParams {
    pub pair: Pair,
    /// Distance between ladder levels in pips
    pub step_pips: f64,
    /// Zone half-width in pips
    pub half_width_pips: f64,
    /// Buffer added below the lowest and above the highest price, in pips
    pub bound_pips: f64,
    /// Quantile for the bounce and score thresholds
    pub quantile: f64,
    /// Zig-zag reversal threshold
    pub pivot_threshold: f64,
    /// Decimal places for the ladder bounds
    pub precision: u32,
}

impl ZoneParams {
    pub fn from_config(pair: Pair, config: &BotConfig) -> Self {
        Self {
            pair,
            step_pips: 2.0 * f64::from(config.trade_bot.i_pips),
            half_width_pips: f64::from(config.pivots.hr_pips),
            bound_pips: f64::from(config.trade_bot.add_pips),
            quantile: config.trade_bot.th,
            pivot_threshold: config.pivots.th_bounces,
            precision: config.general.precision,
        }
    }

    pub fn step(&self) -> f64 {
        self.pair.pips_to_price(self.step_pips)
    }

    pub fn half_width(&self) -> f64 {
        self.pair.pips_to_price(self.half_width_pips)
    }

    /// Minimum distance between two retained zones
    pub fn min_gap(&self) -> f64 {
        3.0 * self.step()
    }
}

/// Turns a look-back window into a list of zones
pub trait ZoneDetector: Send + Sync {
    fn detect(&self, series: &CandleSeries) -> ZoneList;
}

/// Ladder scan + quantile selection + merge
#[derive(Debug, Clone)]
pub struct SrZoneDetector {
    params: ZoneParams,
}

impl SrZoneDetector {
    pub fn new(params: ZoneParams) -> Self {
        Self { params }
    }

    pub fn from_config(pair: Pair, config: &BotConfig) -> Self {
        Self::new(ZoneParams::from_config(pair, config))
    }

    pub fn params(&self) -> &ZoneParams {
        &self.params
    }

    /// Scored ladder before thresholding
    pub fn scan(&self, series: &CandleSeries) -> Vec<LevelRow> {
        let pivots = PivotDetector::new(self.params.pivot_threshold).detect(series);
        scan_levels(series, &pivots, &self.params)
    }
}

impl ZoneDetector for SrZoneDetector {
    fn detect(&self, series: &CandleSeries) -> ZoneList {
        if series.is_empty() {
            tracing::debug!("Empty look-back window, no zones");
            return ZoneList::default();
        }

        let rows = self.scan(series);
        let (selected, _) = select_levels(&rows, self.params.quantile);
        let merged = merge_levels(&selected, self.params.min_gap());

        let zones = merged
            .iter()
            .map(|row| Zone::from_level(row, &self.params.pair, self.params.half_width_pips))
            .collect();

        let list = ZoneList::new(zones);
        tracing::info!(
            "{}: {} zones from {} levels ({} over threshold)",
            self.params.pair,
            list.len(),
            rows.len(),
            selected.len()
        );
        list
    }
}

/// Detection window for time `at`: candles in `[at - lookback, at)`
pub fn lookback_window(series: &CandleSeries, at: DateTime<Utc>, lookback: Duration) -> CandleSeries {
    series.slice(at - lookback, at)
}

/// Zones visible at `at`, using the `period_range` candles before it
pub async fn zones_at(
    provider: &dyn CandleProvider,
    pair: &Pair,
    timeframe: Timeframe,
    at: DateTime<Utc>,
    config: &BotConfig,
) -> Result<ZoneList> {
    let lookback = timeframe.periods(config.trade_bot.period_range)?;

    tracing::info!("Detecting {} {} zones at {}", pair, timeframe, at);
    let series = provider.fetch_candles(pair, timeframe, at - lookback, at).await?;

    let detector = SrZoneDetector::from_config(pair.clone(), config);
    Ok(detector.detect(&lookback_window(&series, at, lookback)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MemoryProvider;
    use crate::models::Candle;
    use chrono::TimeZone;

    fn wave_series() -> CandleSeries {
        let t0 = Utc.with_ymd_and_hms(2020, 3, 2, 0, 0, 0).unwrap();
        let candles = (0..300)
            .map(|i| {
                let x = i as f64 / 12.0;
                let c = 1.10 + 0.01 * x.sin() + 0.003 * (x * 3.1).cos();
                Candle::new(t0 + Duration::hours(4 * i), c, c + 0.0008, c - 0.0008, c)
            })
            .collect();
        CandleSeries::new(candles).unwrap()
    }

    fn config() -> BotConfig {
        let mut config = BotConfig::default();
        config.pivots.th_bounces = 0.005;
        config.pivots.hr_pips = 10;
        config.trade_bot.th = 0.5;
        config
    }

    #[test]
    fn test_params_from_config() {
        let params = ZoneParams::from_config(Pair::new("EUR_USD"), &BotConfig::default());
        assert_eq!(params.step_pips, 6.0);
        assert!((params.step() - 0.0006).abs() < 1e-12);
        assert!((params.min_gap() - 0.0018).abs() < 1e-12);
        assert!((params.half_width() - 0.0025).abs() < 1e-12);

        let jpy = ZoneParams::from_config(Pair::new("USD_JPY"), &BotConfig::default());
        assert!((jpy.step() - 0.06).abs() < 1e-12);
    }

    #[test]
    fn test_detect_zones_on_wave() {
        let series = wave_series();
        let detector = SrZoneDetector::from_config(Pair::new("EUR_USD"), &config());
        let zones = detector.detect(&series);

        assert!(!zones.is_empty());
        let min_gap = detector.params().min_gap();
        for pair in zones.zones().windows(2) {
            assert!(pair[1].price - pair[0].price >= min_gap - 1e-9);
        }
        for zone in &zones {
            assert!(zone.bounces > 0 || zone.total_score > 0.0);
            assert_eq!(zone.half_width_pips, 10.0);
        }
    }

    #[test]
    fn test_detection_is_deterministic() {
        let series = wave_series();
        let detector = SrZoneDetector::from_config(Pair::new("EUR_USD"), &config());
        assert_eq!(detector.detect(&series), detector.detect(&series));
    }

    #[test]
    fn test_empty_window_has_no_zones() {
        let detector = SrZoneDetector::from_config(Pair::new("EUR_USD"), &config());
        assert!(detector.detect(&CandleSeries::empty()).is_empty());
    }

    #[tokio::test]
    async fn test_zones_at_uses_lookback_window() {
        let series = wave_series();
        let at = series.candles()[250].time;
        let pair = Pair::new("EUR_USD");
        let mut cfg = config();
        cfg.trade_bot.period_range = 200;

        let provider = MemoryProvider::new(pair.clone(), Timeframe::Hours(4), series.clone());
        let zones = zones_at(&provider, &pair, Timeframe::Hours(4), at, &cfg).await.unwrap();

        let window = series.slice(at - Duration::hours(4 * 200), at);
        assert_eq!(window.len(), 200);
        let expected = SrZoneDetector::from_config(pair, &cfg).detect(&window);
        assert_eq!(zones, expected);
    }

    #[tokio::test]
    async fn test_zones_at_ignores_candles_after_at() {
        let series = wave_series();
        let at = series.candles()[250].time;
        let pair = Pair::new("EUR_USD");
        let mut cfg = config();
        cfg.trade_bot.period_range = 200;

        // Spike the candle at `at` and the one after it
        let spiked: Vec<Candle> = series
            .iter()
            .map(|c| {
                if c.time >= at && c.time <= at + Duration::hours(4) {
                    Candle::new(c.time, c.open, c.high + 0.02, c.low - 0.02, c.close)
                } else {
                    c.clone()
                }
            })
            .collect();
        let spiked = CandleSeries::new(spiked).unwrap();

        let clean = MemoryProvider::new(pair.clone(), Timeframe::Hours(4), series);
        let noisy = MemoryProvider::new(pair.clone(), Timeframe::Hours(4), spiked);
        let expected = zones_at(&clean, &pair, Timeframe::Hours(4), at, &cfg).await.unwrap();
        let found = zones_at(&noisy, &pair, Timeframe::Hours(4), at, &cfg).await.unwrap();

        assert!(!expected.is_empty());
        assert_eq!(found, expected);
    }

    #[test]
    fn test_lookback_window_excludes_at() {
        let series = wave_series();
        let at = series.candles()[100].time;
        let window = lookback_window(&series, at, Duration::hours(4 * 10));

        assert_eq!(window.len(), 10);
        assert_eq!(window.first().unwrap().time, series.candles()[90].time);
        assert_eq!(window.last().unwrap().time, series.candles()[99].time);
    }
}
