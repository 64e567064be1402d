use thiserror::Error;

/// Errors raised by the zone detector, the backtest engine and its collaborators
#[derive(Error, Debug)]
pub enum BotError {
    /// Invalid or inconsistent configuration value
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to load configuration: {0}")]
    ConfigLoad(#[from] ::config::ConfigError),

    #[error("Invalid timeframe: {0}")]
    InvalidTimeframe(String),

    /// Candle or candle series that breaks OHLC/ordering rules
    #[error("Invalid candle data: {0}")]
    InvalidCandle(String),

    /// Data provider returned an unusable answer
    #[error("Provider error: {0}")]
    Provider(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
