use crate::models::{Candle, CandleSeries, Timeframe};
use crate::Result;
use chrono::{DateTime, Datelike, TimeZone, Utc, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Market scenario types for synthetic FX data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarketScenario {
    /// Price oscillates between a support and a resistance band
    Ranging,
    /// Steady uptrend with pullbacks
    Uptrend,
    /// Steady downtrend with pullbacks
    Downtrend,
    /// Large random swings
    Volatile,
    /// Ranging market with weekend gaps (no Saturday/Sunday candles)
    WeekendGaps,
}

impl MarketScenario {
    pub fn all() -> [MarketScenario; 5] {
        [
            MarketScenario::Ranging,
            MarketScenario::Uptrend,
            MarketScenario::Downtrend,
            MarketScenario::Volatile,
            MarketScenario::WeekendGaps,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            MarketScenario::Ranging => "Ranging",
            MarketScenario::Uptrend => "Uptrend",
            MarketScenario::Downtrend => "Downtrend",
            MarketScenario::Volatile => "Volatile",
            MarketScenario::WeekendGaps => "Weekend gaps",
        }
    }
}

/// Generates reproducible synthetic price data for backtesting
pub struct SyntheticDataGenerator {
    rng: StdRng,
    base_price: f64,
    start: DateTime<Utc>,
}

impl SyntheticDataGenerator {
    /// Create a new generator with a seed for reproducibility
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            base_price: 1.1000,
            // Monday
            start: Utc
                .with_ymd_and_hms(2019, 1, 7, 0, 0, 0)
                .single()
                .unwrap_or_default(),
        }
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// Generate up to `num_candles` candles of `timeframe` for a scenario
    ///
    /// The weekend-gap scenario drops Saturday and Sunday candles, so it
    /// returns fewer than requested.
    pub fn generate(
        &mut self,
        scenario: MarketScenario,
        num_candles: usize,
        timeframe: Timeframe,
    ) -> Result<CandleSeries> {
        let closes = match scenario {
            MarketScenario::Ranging | MarketScenario::WeekendGaps => self.ranging_closes(num_candles),
            MarketScenario::Uptrend => self.trending_closes(num_candles, 0.0004),
            MarketScenario::Downtrend => self.trending_closes(num_candles, -0.0004),
            MarketScenario::Volatile => self.volatile_closes(num_candles),
        };

        let interval = timeframe.interval();
        let mut candles = Vec::with_capacity(num_candles);
        let mut prev_close = self.base_price;

        for (i, close) in closes.into_iter().enumerate() {
            let time = self.start + interval * i as i32;
            if scenario == MarketScenario::WeekendGaps
                && matches!(time.weekday(), Weekday::Sat | Weekday::Sun)
            {
                prev_close = close;
                continue;
            }
            candles.push(self.create_candle(time, prev_close, close));
            prev_close = close;
        }

        CandleSeries::new(candles)
    }

    /// Sine swing between `base ± 1.5%` with noise
    fn ranging_closes(&mut self, n: usize) -> Vec<f64> {
        let amplitude = self.base_price * 0.015;
        let mut closes = Vec::with_capacity(n);
        for i in 0..n {
            // One full swing every ~60 candles
            let phase = i as f64 * std::f64::consts::TAU / 60.0;
            let noise = self.base_price * self.rng.gen_range(-0.0015..0.0015);
            closes.push(self.base_price + amplitude * phase.sin() + noise);
        }
        closes
    }

    /// Drift per candle as a fraction of price, with pullback cycles
    fn trending_closes(&mut self, n: usize, drift: f64) -> Vec<f64> {
        let mut price = self.base_price;
        let mut closes = Vec::with_capacity(n);
        for i in 0..n {
            let pullback = if (i / 20) % 3 == 2 { -1.0 } else { 1.0 };
            let noise = self.rng.gen_range(-0.001..0.001);
            price *= 1.0 + drift * pullback + noise;
            closes.push(price);
        }
        closes
    }

    fn volatile_closes(&mut self, n: usize) -> Vec<f64> {
        let mut price = self.base_price;
        let mut closes = Vec::with_capacity(n);
        for _ in 0..n {
            price *= 1.0 + self.rng.gen_range(-0.006..0.006);
            // Keep the pair in a plausible range
            price = price.clamp(self.base_price * 0.7, self.base_price * 1.3);
            closes.push(price);
        }
        closes
    }

    /// Candle opening at the previous close with wicks around the body
    fn create_candle(&mut self, time: DateTime<Utc>, open: f64, close: f64) -> Candle {
        let wick = self.base_price * 0.0015;
        let high = open.max(close) + self.rng.gen_range(0.0..wick);
        let low = open.min(close) - self.rng.gen_range(0.0..wick);
        Candle::new(time, open, high, low, close)
    }
}
