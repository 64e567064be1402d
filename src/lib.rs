// Core modules
pub mod api;
pub mod backtest;
pub mod config;
pub mod error;
pub mod indicators;
pub mod models;
pub mod sr;
pub mod strategy;

// Re-export commonly used types
pub use crate::config::BotConfig;
pub use error::BotError;
pub use models::*;

// Error handling
pub type Result<T> = std::result::Result<T, BotError>;
