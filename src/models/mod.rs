pub mod series;
pub mod validator;

pub use series::CandleSeries;
pub use validator::CandleValidator;

use crate::BotError;
use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Round a price to `precision` decimal places
pub fn round_price(price: f64, precision: u32) -> f64 {
    let factor = 10f64.powi(precision as i32);
    (price * factor).round() / factor
}

/// Parse a UTC timestamp given as RFC 3339 or `YYYY-MM-DDTHH:MM[:SS]`
pub fn parse_utc(s: &str) -> Result<DateTime<Utc>, BotError> {
    let s = s.trim();
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Ok(t.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| BotError::Config(format!("Invalid timestamp '{}'", s)))
}

/// Currency pair in OANDA notation (e.g. `AUD_USD`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Pair(String);

impl Pair {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Size of one pip in price units (JPY crosses quote two decimals)
    pub fn pip_size(&self) -> f64 {
        if self.0.contains("JPY") {
            0.01
        } else {
            0.0001
        }
    }

    pub fn pips_to_price(&self, pips: f64) -> f64 {
        pips * self.pip_size()
    }

    pub fn add_pips(&self, price: f64, pips: f64) -> f64 {
        price + self.pips_to_price(pips)
    }

    pub fn sub_pips(&self, price: f64, pips: f64) -> f64 {
        price - self.pips_to_price(pips)
    }

    /// Absolute price distance expressed in pips
    pub fn price_to_pips(&self, distance: f64) -> f64 {
        distance.abs() / self.pip_size()
    }
}

impl fmt::Display for Pair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Candle granularity: daily or a whole number of hours
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Timeframe {
    Daily,
    Hours(u32),
}

impl Timeframe {
    /// Length of one candle
    pub fn interval(&self) -> Duration {
        match self {
            Timeframe::Daily => Duration::hours(24),
            Timeframe::Hours(n) => Duration::hours(i64::from(*n)),
        }
    }

    /// Length of `count` consecutive candles
    pub fn periods(&self, count: usize) -> Result<Duration, BotError> {
        i32::try_from(count)
            .ok()
            .and_then(|n| self.interval().checked_mul(n))
            .ok_or_else(|| BotError::Config(format!("{} periods of {} overflow a duration", count, self)))
    }
}

impl FromStr for Timeframe {
    type Err = BotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s == "D" {
            return Ok(Timeframe::Daily);
        }
        match s.strip_prefix('H').map(str::parse::<u32>) {
            Some(Ok(hours)) if hours > 0 => Ok(Timeframe::Hours(hours)),
            _ => Err(BotError::InvalidTimeframe(s.to_string())),
        }
    }
}

impl TryFrom<String> for Timeframe {
    type Error = BotError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Timeframe> for String {
    fn from(tf: Timeframe) -> Self {
        tf.to_string()
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Timeframe::Daily => f.write_str("D"),
            Timeframe::Hours(n) => write!(f, "H{}", n),
        }
    }
}

/// OHLC candle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl Candle {
    pub fn new(time: DateTime<Utc>, open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            time,
            open,
            high,
            low,
            close,
        }
    }
}

/// Candle colour derived from open/close
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Colour {
    Green,
    Red,
    Neutral,
}

/// Trade direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    /// Colour of a candle confirming this direction
    pub fn confirming_colour(&self) -> Colour {
        match self {
            Direction::Long => Colour::Green,
            Direction::Short => Colour::Red,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Long => f.write_str("long"),
            Direction::Short => f.write_str("short"),
        }
    }
}

/// Candidate trade produced by the backtest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    pub id: Uuid,
    pub pair: Pair,
    pub timeframe: Timeframe,
    pub start: DateTime<Utc>,
    pub direction: Direction,
    pub entry: f64,
    pub stop_loss: f64,
    /// Price of the zone that triggered the trade
    pub zone_price: f64,
    pub risk_reward: f64,
    pub strategy: String,
    /// Number of zones active when the trade was created
    pub total_zones: usize,
    /// 1-based rank of the triggering zone by descending score
    pub zone_rank: usize,
}

impl Trade {
    /// Take-profit implied by the risk-reward ratio
    pub fn take_profit(&self) -> f64 {
        self.entry + self.risk_reward * (self.entry - self.stop_loss)
    }

    /// Distance between entry and stop-loss in pips
    pub fn risk_pips(&self) -> f64 {
        self.pair.price_to_pips(self.entry - self.stop_loss)
    }
}
