use crate::models::Candle;
use crate::{BotError, Result};

/// Validates OHLC candle data for sanity and correctness
pub struct CandleValidator;

impl CandleValidator {
    pub fn new() -> Self {
        Self
    }

    /// Validate a single candle
    pub fn validate(&self, candle: &Candle) -> Result<()> {
        self.validate_prices(candle)?;
        self.validate_ohlc_relationship(candle)?;
        Ok(())
    }

    /// Validate every candle and the ordering of the sequence
    pub fn validate_sequence(&self, candles: &[Candle]) -> Result<()> {
        for candle in candles {
            self.validate(candle)?;
        }
        for pair in candles.windows(2) {
            if pair[1].time == pair[0].time {
                return Err(invalid(format!("Duplicate candle timestamp {}", pair[1].time)));
            }
            if pair[1].time < pair[0].time {
                return Err(invalid(format!(
                    "Candles out of order: {} after {}",
                    pair[1].time, pair[0].time
                )));
            }
        }
        Ok(())
    }

    /// Validate that all prices are positive and finite
    fn validate_prices(&self, candle: &Candle) -> Result<()> {
        let fields = [
            ("open", candle.open),
            ("high", candle.high),
            ("low", candle.low),
            ("close", candle.close),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value <= 0.0 {
                return Err(invalid(format!(
                    "Invalid {} price {} at {}",
                    name, value, candle.time
                )));
            }
        }
        Ok(())
    }

    /// Validate OHLC relationships (high >= low, etc.)
    fn validate_ohlc_relationship(&self, candle: &Candle) -> Result<()> {
        if candle.high < candle.low {
            return Err(invalid(format!(
                "High ({}) is less than low ({})",
                candle.high, candle.low
            )));
        }
        if candle.high < candle.open.max(candle.close) {
            return Err(invalid(format!(
                "High ({}) is less than open/close ({}/{})",
                candle.high, candle.open, candle.close
            )));
        }
        if candle.low > candle.open.min(candle.close) {
            return Err(invalid(format!(
                "Low ({}) is greater than open/close ({}/{})",
                candle.low, candle.open, candle.close
            )));
        }
        Ok(())
    }
}

impl Default for CandleValidator {
    fn default() -> Self {
        Self::new()
    }
}

fn invalid(msg: String) -> BotError {
    BotError::InvalidCandle(msg)
}
