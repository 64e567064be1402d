pub mod memory;
pub mod oanda;

pub use memory::MemoryProvider;
pub use oanda::OandaClient;

use crate::config::BotConfig;
use crate::models::{Candle, CandleSeries, Pair, Timeframe};
use crate::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::Path;
use std::sync::Arc;

/// Source of historical candles
#[async_trait]
pub trait CandleProvider: Send + Sync {
    /// Candles with `start <= time <= end`
    async fn fetch_candles(
        &self,
        pair: &Pair,
        timeframe: Timeframe,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<CandleSeries>;

    /// First candle at or after `at`, if any
    async fn fetch_candle(
        &self,
        pair: &Pair,
        timeframe: Timeframe,
        at: DateTime<Utc>,
    ) -> Result<Option<Candle>>;
}

/// Provider for a run: the serialized dump when one is given (argument
/// first, then `general.ser_data_file`), otherwise the OANDA API
pub fn provider_for(
    pair: &Pair,
    timeframe: Timeframe,
    config: &BotConfig,
    data_file: Option<&Path>,
) -> Result<Arc<dyn CandleProvider>> {
    let dump = data_file.or(config.general.ser_data_file.as_deref());
    match dump {
        Some(path) => {
            tracing::info!("Reading candles from {}", path.display());
            let provider = MemoryProvider::from_json_file(pair.clone(), timeframe, path)?;
            Ok(Arc::new(provider))
        }
        None => Ok(Arc::new(OandaClient::from_env()?)),
    }
}
