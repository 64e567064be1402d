use crate::api::CandleProvider;
use crate::models::{Candle, CandleSeries, Pair, Timeframe};
use crate::{BotError, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use governor::{Quota, RateLimiter};
use reqwest::Client;
use serde::Deserialize;
use std::num::NonZeroU32;
use std::sync::Arc;

pub const OANDA_PRACTICE_URL: &str = "https://api-fxpractice.oanda.com";
const RATE_LIMIT_PER_SECOND: u32 = 20;
const MAX_RETRIES: u32 = 3;
/// Largest page OANDA serves in one request
const MAX_CANDLES_PER_REQUEST: usize = 5000;

type OandaRateLimiter = RateLimiter<
    governor::state::direct::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// OANDA v20 REST client for mid-price candles
///
/// Cloneable; all clones share the same rate limiter.
#[derive(Clone)]
pub struct OandaClient {
    client: Client,
    base_url: String,
    token: String,
    rate_limiter: Arc<OandaRateLimiter>,
}

/// Response from /v3/instruments/{pair}/candles
#[derive(Debug, Deserialize)]
struct CandlesResponse {
    #[serde(default)]
    candles: Vec<OandaCandle>,
}

#[derive(Debug, Deserialize)]
struct OandaCandle {
    time: DateTime<Utc>,
    complete: bool,
    mid: Option<MidPrices>,
}

/// OANDA quotes prices as decimal strings
#[derive(Debug, Deserialize)]
struct MidPrices {
    o: String,
    h: String,
    l: String,
    c: String,
}

impl OandaCandle {
    fn into_candle(self) -> Result<Option<Candle>> {
        if !self.complete {
            return Ok(None);
        }
        let mid = self
            .mid
            .ok_or_else(|| BotError::Provider(format!("Candle at {} has no mid prices", self.time)))?;
        Ok(Some(Candle::new(
            self.time,
            parse_price(&mid.o)?,
            parse_price(&mid.h)?,
            parse_price(&mid.l)?,
            parse_price(&mid.c)?,
        )))
    }
}

fn parse_price(raw: &str) -> Result<f64> {
    raw.parse::<f64>()
        .map_err(|_| BotError::Provider(format!("Invalid price '{}'", raw)))
}

fn format_time(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Secs, true)
}

impl OandaClient {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        let per_second = NonZeroU32::new(RATE_LIMIT_PER_SECOND)
            .ok_or_else(|| BotError::Config("Rate limit must be non-zero".to_string()))?;
        let rate_limiter = Arc::new(RateLimiter::direct(Quota::per_second(per_second)));

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            rate_limiter,
        })
    }

    /// Build from `OANDA_TOKEN` and optional `OANDA_URL`
    pub fn from_env() -> Result<Self> {
        let token = std::env::var("OANDA_TOKEN")
            .map_err(|_| BotError::Config("OANDA_TOKEN is not set".to_string()))?;
        let base_url = std::env::var("OANDA_URL").unwrap_or_else(|_| OANDA_PRACTICE_URL.to_string());
        Self::new(base_url, token)
    }

    /// Rate-limited GET with retry on 429, 5xx and network errors
    async fn make_request(&self, url: &str, query: &[(&str, String)]) -> Result<reqwest::Response> {
        for attempt in 1..=MAX_RETRIES {
            self.rate_limiter.until_ready().await;

            let request = self
                .client
                .get(url)
                .bearer_auth(&self.token)
                .query(query);

            match request.send().await {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        return Ok(response);
                    }

                    if status.as_u16() == 429 || status.is_server_error() {
                        let backoff_secs = 2u64.pow(attempt);
                        tracing::warn!(
                            "OANDA returned {}, retrying in {}s (attempt {}/{})",
                            status,
                            backoff_secs,
                            attempt,
                            MAX_RETRIES
                        );
                        tokio::time::sleep(std::time::Duration::from_secs(backoff_secs)).await;
                        continue;
                    }

                    // Other 4xx: the request itself is wrong
                    let error_text = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "Unknown error".to_string());
                    return Err(BotError::Provider(format!(
                        "OANDA API error ({}): {}",
                        status, error_text
                    )));
                }
                Err(e) if attempt < MAX_RETRIES => {
                    let backoff_secs = 2u64.pow(attempt);
                    tracing::warn!(
                        "Network error: {}, retrying in {}s (attempt {}/{})",
                        e,
                        backoff_secs,
                        attempt,
                        MAX_RETRIES
                    );
                    tokio::time::sleep(std::time::Duration::from_secs(backoff_secs)).await;
                }
                Err(e) => return Err(BotError::Http(e)),
            }
        }

        Err(BotError::Provider(format!(
            "OANDA request failed after {} retries",
            MAX_RETRIES
        )))
    }

    async fn get_candles(
        &self,
        pair: &Pair,
        timeframe: Timeframe,
        query: Vec<(&str, String)>,
    ) -> Result<Vec<Candle>> {
        let url = format!("{}/v3/instruments/{}/candles", self.base_url, pair);
        let mut params = vec![
            ("granularity", timeframe.to_string()),
            ("price", "M".to_string()),
        ];
        params.extend(query);

        let response = self.make_request(&url, &params).await?;
        let body: CandlesResponse = response.json().await?;

        let mut candles = Vec::with_capacity(body.candles.len());
        for raw in body.candles {
            if let Some(candle) = raw.into_candle()? {
                candles.push(candle);
            }
        }
        Ok(candles)
    }
}

#[async_trait]
impl CandleProvider for OandaClient {
    async fn fetch_candles(
        &self,
        pair: &Pair,
        timeframe: Timeframe,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<CandleSeries> {
        let page = timeframe.periods(MAX_CANDLES_PER_REQUEST - 1)?;
        let mut candles: Vec<Candle> = Vec::new();
        let mut from = start;

        while from <= end {
            let to = std::cmp::min(from + page, end);
            tracing::debug!("Fetching {} {} candles {} -> {}", pair, timeframe, from, to);

            let chunk = self
                .get_candles(
                    pair,
                    timeframe,
                    vec![("from", format_time(from)), ("to", format_time(to))],
                )
                .await?;

            for candle in chunk {
                let newer = candles.last().map_or(true, |last| candle.time > last.time);
                if newer && candle.time >= start && candle.time <= end {
                    candles.push(candle);
                }
            }

            if to >= end {
                break;
            }
            from = to;
        }

        tracing::info!("Fetched {} {} {} candles", candles.len(), pair, timeframe);
        CandleSeries::new(candles)
    }

    async fn fetch_candle(
        &self,
        pair: &Pair,
        timeframe: Timeframe,
        at: DateTime<Utc>,
    ) -> Result<Option<Candle>> {
        let candles = self
            .get_candles(
                pair,
                timeframe,
                vec![("from", format_time(at)), ("count", "1".to_string())],
            )
            .await?;
        Ok(candles.into_iter().next())
    }
}
