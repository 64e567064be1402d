use crate::{BotError, Result};
use ::config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG_FILE: &str = "settings.ini";
const ENV_PREFIX: &str = "SRBOT";
/// Upper bound on the look-back window, in candles
pub const MAX_PERIOD_RANGE: usize = 100_000;

/// Immutable bot configuration, read once at startup and passed explicitly
///
/// Loaded from an INI file with one section per concern, layered with
/// `SRBOT_<SECTION>__<KEY>` environment overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    pub general: GeneralConfig,
    pub pivots: PivotsConfig,
    pub trade_bot: TradeBotConfig,
    pub trade: TradeConfig,
    pub report: ReportConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Decimal places used when rounding prices
    pub precision: u32,
    /// Body/range percentage under which a candle counts as indecision
    pub ic_perc: f64,
    /// Optional OANDA-format JSON dump used instead of the live API
    pub ser_data_file: Option<PathBuf>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            precision: 4,
            ic_perc: 20.0,
            ser_data_file: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PivotsConfig {
    /// Zig-zag reversal threshold as a fraction of price
    pub th_bounces: f64,
    /// Zone half-width in pips
    pub hr_pips: u32,
}

impl Default for PivotsConfig {
    fn default() -> Self {
        Self {
            th_bounces: 0.02,
            hr_pips: 25,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TradeBotConfig {
    /// Look-back window for zone detection, in candles
    pub period_range: usize,
    /// Steps between zone recalibrations
    pub period: usize,
    /// Ladder seed; the ladder step is twice this many pips
    pub i_pips: u32,
    /// Quantile used for the bounce and score thresholds
    pub th: f64,
    /// Pips added around the highest/lowest price when building the ladder
    pub add_pips: u32,
    /// Maximum accepted entry/stop-loss distance in pips
    #[serde(alias = "SL_width_pips")]
    pub sl_width_pips: f64,
    /// Risk-reward ratio
    #[serde(alias = "RR")]
    pub rr: f64,
}

impl Default for TradeBotConfig {
    fn default() -> Self {
        Self {
            period_range: 1500,
            period: 20,
            i_pips: 3,
            th: 0.5,
            add_pips: 10,
            sl_width_pips: 200.0,
            rr: 1.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TradeConfig {
    /// Pips added to entry and stop-loss away from the zone
    pub add_pips: u32,
}

impl Default for TradeConfig {
    fn default() -> Self {
        Self { add_pips: 3 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Root directory for zone reports
    pub outdir: PathBuf,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            outdir: PathBuf::from("reports"),
        }
    }
}

impl BotConfig {
    /// Load configuration from `path`, `$CONFIG_FILE` or `settings.ini`
    ///
    /// An explicit path must exist; the fallback file is optional and missing
    /// keys take their defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (file, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => match std::env::var("CONFIG_FILE") {
                Ok(p) => (PathBuf::from(p), true),
                Err(_) => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
            },
        };

        tracing::info!("Reading config file {}", file.display());

        let settings = Config::builder()
            .add_source(File::from(file.as_path()).format(FileFormat::Ini).required(required))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let config: BotConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from INI text
    pub fn from_ini_str(ini: &str) -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::from_str(ini, FileFormat::Ini))
            .build()?;
        let config: BotConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges the detector and engine rely on
    pub fn validate(&self) -> Result<()> {
        let tb = &self.trade_bot;
        if !(tb.th > 0.0 && tb.th < 1.0) {
            return Err(invalid(format!("trade_bot.th must be in (0, 1), got {}", tb.th)));
        }
        if tb.period == 0 {
            return Err(invalid("trade_bot.period must be positive".to_string()));
        }
        if tb.period_range == 0 || tb.period_range > MAX_PERIOD_RANGE {
            return Err(invalid(format!(
                "trade_bot.period_range must be in 1..={}, got {}",
                MAX_PERIOD_RANGE, tb.period_range
            )));
        }
        if tb.i_pips == 0 {
            return Err(invalid("trade_bot.i_pips must be positive".to_string()));
        }
        if tb.rr <= 0.0 {
            return Err(invalid(format!("trade_bot.rr must be positive, got {}", tb.rr)));
        }
        if tb.sl_width_pips <= 0.0 {
            return Err(invalid(format!(
                "trade_bot.sl_width_pips must be positive, got {}",
                tb.sl_width_pips
            )));
        }
        if self.pivots.hr_pips == 0 {
            return Err(invalid("pivots.hr_pips must be positive".to_string()));
        }
        if !(self.pivots.th_bounces > 0.0 && self.pivots.th_bounces < 1.0) {
            return Err(invalid(format!(
                "pivots.th_bounces must be in (0, 1), got {}",
                self.pivots.th_bounces
            )));
        }
        if !(0.0..=100.0).contains(&self.general.ic_perc) {
            return Err(invalid(format!(
                "general.ic_perc must be a percentage, got {}",
                self.general.ic_perc
            )));
        }
        if self.general.precision > 10 {
            return Err(invalid(format!(
                "general.precision too large: {}",
                self.general.precision
            )));
        }
        Ok(())
    }
}

fn invalid(msg: String) -> BotError {
    BotError::Config(msg)
}
