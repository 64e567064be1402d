use crate::api::CandleProvider;
use crate::models::{Candle, CandleSeries, Pair, Timeframe};
use crate::{BotError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::path::Path;

/// Serves candles for one pair and timeframe from memory
///
/// Used for offline runs from a serialized OANDA dump and for tests.
#[derive(Debug, Clone)]
pub struct MemoryProvider {
    pair: Pair,
    timeframe: Timeframe,
    series: CandleSeries,
}

/// Same layout as an OANDA candles response
#[derive(Debug, Deserialize)]
struct CandleDump {
    candles: Vec<DumpCandle>,
}

#[derive(Debug, Deserialize)]
struct DumpCandle {
    time: DateTime<Utc>,
    #[serde(default = "default_complete")]
    complete: bool,
    mid: DumpMid,
}

fn default_complete() -> bool {
    true
}

/// Prices may be stored as strings (OANDA) or numbers
#[derive(Debug, Deserialize)]
struct DumpMid {
    o: PriceValue,
    h: PriceValue,
    l: PriceValue,
    c: PriceValue,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PriceValue {
    Number(f64),
    Text(String),
}

impl PriceValue {
    fn value(&self) -> Result<f64> {
        match self {
            PriceValue::Number(v) => Ok(*v),
            PriceValue::Text(s) => s
                .parse()
                .map_err(|_| BotError::InvalidCandle(format!("Invalid price '{}'", s))),
        }
    }
}

impl MemoryProvider {
    pub fn new(pair: Pair, timeframe: Timeframe, series: CandleSeries) -> Self {
        Self {
            pair,
            timeframe,
            series,
        }
    }

    /// Load an OANDA-format JSON dump (`{"candles": [{"time", "mid": {o,h,l,c}}]}`)
    pub fn from_json_str(pair: Pair, timeframe: Timeframe, json: &str) -> Result<Self> {
        let dump: CandleDump = serde_json::from_str(json)?;

        let mut candles = Vec::with_capacity(dump.candles.len());
        for raw in dump.candles.into_iter().filter(|c| c.complete) {
            candles.push(Candle::new(
                raw.time,
                raw.mid.o.value()?,
                raw.mid.h.value()?,
                raw.mid.l.value()?,
                raw.mid.c.value()?,
            ));
        }

        let series = CandleSeries::new(candles)?;
        tracing::info!(
            "Loaded {} {} {} candles from dump",
            series.len(),
            pair,
            timeframe
        );
        Ok(Self::new(pair, timeframe, series))
    }

    pub fn from_json_file(pair: Pair, timeframe: Timeframe, path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(pair, timeframe, &json)
    }

    pub fn series(&self) -> &CandleSeries {
        &self.series
    }

    fn check_instrument(&self, pair: &Pair, timeframe: Timeframe) -> Result<()> {
        if *pair != self.pair || timeframe != self.timeframe {
            return Err(BotError::Provider(format!(
                "No data for {} {} (holding {} {})",
                pair, timeframe, self.pair, self.timeframe
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl CandleProvider for MemoryProvider {
    async fn fetch_candles(
        &self,
        pair: &Pair,
        timeframe: Timeframe,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<CandleSeries> {
        self.check_instrument(pair, timeframe)?;
        Ok(self.series.between(start, end))
    }

    async fn fetch_candle(
        &self,
        pair: &Pair,
        timeframe: Timeframe,
        at: DateTime<Utc>,
    ) -> Result<Option<Candle>> {
        self.check_instrument(pair, timeframe)?;
        Ok(self.series.at_or_after(at).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::io::Write;

    const DUMP: &str = r#"{
        "candles": [
            {"time": "2020-03-02T00:00:00.000000000Z", "complete": true,
             "mid": {"o": "1.10000", "h": "1.10200", "l": "1.09900", "c": "1.10100"}},
            {"time": "2020-03-02T04:00:00.000000000Z",
             "mid": {"o": 1.101, "h": 1.103, "l": 1.1, "c": 1.1025}},
            {"time": "2020-03-02T12:00:00.000000000Z", "complete": true,
             "mid": {"o": "1.10250", "h": "1.10400", "l": "1.10200", "c": "1.10300"}}
        ]
    }"#;

    fn t(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 3, 2, h, 0, 0).unwrap()
    }

    fn provider() -> MemoryProvider {
        MemoryProvider::from_json_str(Pair::new("EUR_USD"), Timeframe::Hours(4), DUMP).unwrap()
    }

    #[test]
    fn test_load_mixed_price_formats() {
        let p = provider();
        assert_eq!(p.series().len(), 3);
        assert!((p.series().candles()[1].close - 1.1025).abs() < 1e-12);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(DUMP.as_bytes()).unwrap();

        let p = MemoryProvider::from_json_file(Pair::new("EUR_USD"), Timeframe::Hours(4), file.path())
            .unwrap();
        assert_eq!(p.series().len(), 3);
    }

    #[test]
    fn test_unordered_dump_rejected() {
        let json = r#"{"candles": [
            {"time": "2020-03-02T04:00:00Z", "mid": {"o": 1.1, "h": 1.1, "l": 1.1, "c": 1.1}},
            {"time": "2020-03-02T00:00:00Z", "mid": {"o": 1.1, "h": 1.1, "l": 1.1, "c": 1.1}}
        ]}"#;
        let result = MemoryProvider::from_json_str(Pair::new("EUR_USD"), Timeframe::Hours(4), json);
        assert!(matches!(result, Err(BotError::InvalidCandle(_))));
    }

    #[tokio::test]
    async fn test_fetch_candles_inclusive_range() {
        let p = provider();
        let series = p
            .fetch_candles(&Pair::new("EUR_USD"), Timeframe::Hours(4), t(0), t(4))
            .await
            .unwrap();
        assert_eq!(series.len(), 2);
    }

    #[tokio::test]
    async fn test_fetch_candle_returns_next_available() {
        let p = provider();
        let pair = Pair::new("EUR_USD");

        let exact = p.fetch_candle(&pair, Timeframe::Hours(4), t(4)).await.unwrap();
        assert_eq!(exact.map(|c| c.time), Some(t(4)));

        // Gap at 08:00
        let next = p.fetch_candle(&pair, Timeframe::Hours(4), t(8)).await.unwrap();
        assert_eq!(next.map(|c| c.time), Some(t(12)));

        let past_end = p.fetch_candle(&pair, Timeframe::Hours(4), t(16)).await.unwrap();
        assert!(past_end.is_none());
    }

    #[tokio::test]
    async fn test_wrong_instrument_rejected() {
        let p = provider();
        let result = p
            .fetch_candle(&Pair::new("AUD_USD"), Timeframe::Hours(4), t(0))
            .await;
        assert!(matches!(result, Err(BotError::Provider(_))));
    }
}
