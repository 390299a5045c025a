//! TOML configuration loading and validation.
//!
//! Engine functions take these structs explicitly; nothing reads ambient
//! state. Validation happens once at load so the engines can trust ranges.

use std::path::Path;

use chrono::{FixedOffset, NaiveTime, Offset, Utc};
use serde::{Deserialize, Deserializer};

use crate::error::{Error, Result};
use crate::funding::SellingMode;
use crate::margin::MarginUnwindStrategy;

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub account: AccountConfig,
    pub schedule: ScheduleConfig,
    pub margin: MarginConfig,
    #[serde(default)]
    pub funding: FundingConfig,
    #[serde(default)]
    pub profit: ProfitConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccountConfig {
    pub id: String,
    /// Cash ticker; a snapshot position with `base == quote == currency`
    /// is the account balance.
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_currency() -> String {
    "RUB".into()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleConfig {
    /// Interval between rebalancing iterations.
    pub balance_interval_ms: u64,
    /// Exchange session close, local to `utc_offset_hours` ("HH:MM").
    #[serde(deserialize_with = "de_close_time")]
    pub market_close_time: NaiveTime,
    /// Exchange timezone as a fixed UTC offset; also sets the day boundary
    /// for daily profit/expense accumulation.
    #[serde(default = "default_utc_offset")]
    pub utc_offset_hours: i32,
}

fn default_utc_offset() -> i32 {
    3
}

fn de_close_time<'de, D>(deserializer: D) -> std::result::Result<NaiveTime, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    NaiveTime::parse_from_str(&s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(&s, "%H:%M:%S"))
        .map_err(serde::de::Error::custom)
}

impl ScheduleConfig {
    /// The configured exchange offset, falling back to UTC for out-of-range
    /// values (rejected by `validate` anyway).
    pub fn utc_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_hours * 3600).unwrap_or_else(|| Utc.fix())
    }

    pub fn balance_interval(&self) -> chrono::Duration {
        chrono::Duration::milliseconds(self.balance_interval_ms as i64)
    }
}

/// Account-level margin trading settings.
#[derive(Debug, Clone, Deserialize)]
pub struct MarginConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Leverage on owned capital (2.0 means half of a full position is
    /// borrowed). Validated at load; the engines never clamp it.
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
    /// Position value below which a margin/cash transfer is free.
    #[serde(default)]
    pub free_threshold: f64,
    /// Hard cap on total borrowed value. Required: an implicit default here
    /// silently restricts margin, so an absent field fails config load.
    pub max_margin_size: f64,
    #[serde(default = "default_strategy")]
    pub strategy: MarginUnwindStrategy,
}

fn default_multiplier() -> f64 {
    1.0
}

fn default_strategy() -> MarginUnwindStrategy {
    MarginUnwindStrategy::Keep
}

/// Settings for funding purchases of instruments that cannot be
/// margin-traded by selling other holdings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FundingConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Tickers that must be bought with cash raised from sales.
    #[serde(default)]
    pub instruments: Vec<String>,
    #[serde(default)]
    pub mode: SellingMode,
    /// Purchases below this percent of total portfolio value do not trigger
    /// the feature.
    #[serde(default)]
    pub min_buy_rebalance_percent: f64,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ProfitConfig {
    /// Minimum profit percent a position must show before it may be sold.
    /// Negative values express a maximum allowed loss instead.
    #[serde(default)]
    pub min_profit_percent: Option<f64>,
}

impl Config {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::ConfigRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse from a TOML string (useful for testing).
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: Config = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate config invariants.
    fn validate(&self) -> Result<()> {
        if self.account.id.is_empty() {
            return Err(Error::Config("account id must not be empty".into()));
        }
        if self.account.currency.is_empty() {
            return Err(Error::Config("account currency must not be empty".into()));
        }
        if self.schedule.balance_interval_ms == 0 {
            return Err(Error::Config("balance_interval_ms must be > 0".into()));
        }
        if self.schedule.utc_offset_hours.abs() >= 24 {
            return Err(Error::Config(
                "utc_offset_hours must be in (-24, 24)".into(),
            ));
        }
        if !self.margin.multiplier.is_finite() || self.margin.multiplier < 1.0 {
            return Err(Error::Config(format!(
                "margin multiplier must be finite and >= 1.0, got {}",
                self.margin.multiplier
            )));
        }
        if !self.margin.free_threshold.is_finite() || self.margin.free_threshold < 0.0 {
            return Err(Error::Config("free_threshold must be >= 0".into()));
        }
        if !self.margin.max_margin_size.is_finite() || self.margin.max_margin_size <= 0.0 {
            return Err(Error::Config("max_margin_size must be > 0".into()));
        }
        if !self.funding.min_buy_rebalance_percent.is_finite()
            || self.funding.min_buy_rebalance_percent < 0.0
            || self.funding.min_buy_rebalance_percent > 100.0
        {
            return Err(Error::Config(
                "min_buy_rebalance_percent must be in [0, 100]".into(),
            ));
        }
        if let Some(min) = self.profit.min_profit_percent {
            if !min.is_finite() {
                return Err(Error::Config("min_profit_percent must be finite".into()));
            }
        }
        Ok(())
    }
}
