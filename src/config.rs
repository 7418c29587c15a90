use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use std::fmt;

use crate::api::bybit::{interval_code, MAX_KLINE_LIMIT};
use crate::error::BotError;
use crate::indicators::CloseTruncation;

const ENV_PREFIX: &str = "SMABOT";
const API_KEY_VAR: &str = "BYBIT_API_KEY";
const API_SECRET_VAR: &str = "BYBIT_API_SECRET";

/// Trading parameters, immutable after startup
#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    pub symbol: String,
    /// Quantity sent with each entry order
    pub order_size: f64,
    /// Bar period in minutes
    pub interval: u32,
    /// Number of bars in the SMA window
    pub period: usize,
    /// Half-width of the no-trade band as a fraction of the SMA
    pub threshold_range: f64,
    #[serde(default)]
    pub close_truncation: CloseTruncation,
    /// Log intended orders instead of submitting them
    #[serde(default)]
    pub dry_run: bool,
}

#[derive(Clone, Deserialize)]
pub struct ExchangeConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default = "default_recv_window_ms")]
    pub recv_window_ms: u64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub api_secret: String,
}

fn default_base_url() -> String {
    "https://api.bybit.com".to_string()
}

fn default_category() -> String {
    "linear".to_string()
}

fn default_recv_window_ms() -> u64 {
    5000
}

fn default_timeout_secs() -> u64 {
    10
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            category: default_category(),
            recv_window_ms: default_recv_window_ms(),
            timeout_secs: default_timeout_secs(),
            api_key: String::new(),
            api_secret: String::new(),
        }
    }
}

// Credentials stay out of logs
impl fmt::Debug for ExchangeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExchangeConfig")
            .field("base_url", &self.base_url)
            .field("category", &self.category)
            .field("recv_window_ms", &self.recv_window_ms)
            .field("timeout_secs", &self.timeout_secs)
            .field("api_key", &redact(&self.api_key))
            .field("api_secret", &redact(&self.api_secret))
            .finish()
    }
}

fn redact(value: &str) -> &'static str {
    if value.is_empty() {
        "<unset>"
    } else {
        "<redacted>"
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub bot: BotConfig,
    #[serde(default)]
    pub exchange: ExchangeConfig,
}

impl Settings {
    /// Load from a TOML file (optional), then `SMABOT__SECTION__KEY` overrides,
    /// then `BYBIT_API_KEY` / `BYBIT_API_SECRET`.
    pub fn load(path: &str) -> Result<Self, BotError> {
        let raw = Config::builder()
            .add_source(File::with_name(path).format(FileFormat::Toml).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut settings: Settings = raw.try_deserialize()?;

        if let Ok(key) = std::env::var(API_KEY_VAR) {
            settings.exchange.api_key = key;
        }
        if let Ok(secret) = std::env::var(API_SECRET_VAR) {
            settings.exchange.api_secret = secret;
        }

        settings.validate()?;
        Ok(settings)
    }

    /// Parse settings from TOML text without consulting the environment
    pub fn from_toml_str(toml: &str) -> Result<Self, BotError> {
        let settings: Settings = Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), BotError> {
        let bot = &self.bot;

        if bot.symbol.trim().is_empty() {
            return Err(BotError::Config("bot.symbol must not be empty".into()));
        }
        if bot.interval == 0 {
            return Err(BotError::Config("bot.interval must be > 0".into()));
        }
        interval_code(bot.interval)
            .map_err(|e| BotError::Config(format!("bot.interval: {}", e)))?;
        if bot.period == 0 {
            return Err(BotError::Config("bot.period must be > 0".into()));
        }
        // Bybit returns at most one page of bars per cycle
        if bot.period > MAX_KLINE_LIMIT {
            return Err(BotError::Config(format!(
                "bot.period must be <= {} (got {})",
                MAX_KLINE_LIMIT, bot.period
            )));
        }
        if !(bot.order_size > 0.0) {
            return Err(BotError::Config(format!(
                "bot.order_size must be > 0 (got {})",
                bot.order_size
            )));
        }
        if !(bot.threshold_range > 0.0 && bot.threshold_range < 1.0) {
            return Err(BotError::Config(format!(
                "bot.threshold_range must be in (0, 1) (got {})",
                bot.threshold_range
            )));
        }
        if self.exchange.base_url.trim().is_empty() {
            return Err(BotError::Config("exchange.base_url must not be empty".into()));
        }

        Ok(())
    }
}
