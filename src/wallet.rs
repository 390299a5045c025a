//! Portfolio snapshot and desired-allocation types.
//!
//! A `Wallet` is rebuilt from the broker snapshot each rebalancing iteration
//! and is immutable within it. Numeric fields are optional because the feed
//! omits them for stale or non-tradable entries; engines skip such positions
//! instead of erroring.

use std::path::Path;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};
use crate::money::MoneyRepr;

/// An instrument holding from the portfolio snapshot.
///
/// A position with `base == quote` (e.g. "RUB"/"RUB") is cash, not a tradable
/// instrument, and is excluded from margin/selling/profit logic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    /// Instrument ticker.
    pub base: String,
    /// Quote currency.
    pub quote: String,
    /// Broker instrument id.
    #[serde(default)]
    pub instrument_id: Option<String>,
    /// Quantity held, in units.
    #[serde(default, deserialize_with = "de_money_opt")]
    pub amount: Option<f64>,
    /// Minimum tradable quantity.
    #[serde(default)]
    pub lot: Option<u64>,
    /// Per-share price.
    #[serde(default, deserialize_with = "de_money_opt")]
    pub price: Option<f64>,
    /// Per-lot price.
    #[serde(default, deserialize_with = "de_money_opt")]
    pub lot_price: Option<f64>,
    /// Total market value.
    #[serde(default, deserialize_with = "de_money_opt")]
    pub total_price: Option<f64>,
    /// Money needed to reach the target lot count, when a buy is pending.
    #[serde(default, deserialize_with = "de_money_opt")]
    pub to_buy_amount: Option<f64>,
    /// FIFO average acquisition price.
    #[serde(default, deserialize_with = "de_money_opt")]
    pub average_price_fifo: Option<f64>,
    /// Volume-weighted average acquisition price.
    #[serde(default, deserialize_with = "de_money_opt")]
    pub average_price: Option<f64>,
}

/// Accepts either a plain decimal or the broker's `{units, nano}` pair.
fn de_money_opt<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let repr = Option::<MoneyRepr>::deserialize(deserializer)?;
    Ok(repr.map(MoneyRepr::to_f64))
}

impl Position {
    /// True for cash entries (`base == quote`).
    pub fn is_currency(&self) -> bool {
        self.base == self.quote
    }

    /// Whole lots currently held, when quantity and lot size are known.
    pub fn lots(&self) -> Option<u64> {
        let amount = self.amount.filter(|a| *a > 0.0)?;
        let lot = self.lot.filter(|l| *l > 0)?;
        Some((amount / lot as f64).floor() as u64)
    }
}

/// The portfolio snapshot: all positions, cash included.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Wallet {
    pub positions: Vec<Position>,
}

impl Wallet {
    /// Load and validate a snapshot JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::SnapshotRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_json(&contents)
    }

    /// Parse from a JSON string (useful for testing).
    pub fn from_json(json: &str) -> Result<Self> {
        let wallet: Wallet = serde_json::from_str(json)?;
        wallet.validate()?;
        Ok(wallet)
    }

    fn validate(&self) -> Result<()> {
        for p in &self.positions {
            if p.base.is_empty() {
                return Err(Error::Snapshot("position with empty ticker".into()));
            }
            if p.quote.is_empty() {
                return Err(Error::Snapshot(format!("{}: empty quote currency", p.base)));
            }
            if p.lot == Some(0) {
                return Err(Error::Snapshot(format!("{}: lot size is zero", p.base)));
            }
        }
        Ok(())
    }

    /// Total portfolio value, cash included. Undefined values contribute zero.
    pub fn total_value(&self) -> f64 {
        self.positions.iter().filter_map(|p| p.total_price).sum()
    }

    /// First non-cash position for a ticker.
    pub fn position(&self, ticker: &str) -> Option<&Position> {
        self.positions
            .iter()
            .find(|p| p.base == ticker && !p.is_currency())
    }

    /// Cash balance in the given currency. Negative when in deficit.
    pub fn currency_balance(&self, currency: &str) -> f64 {
        self.positions
            .iter()
            .filter(|p| p.is_currency() && p.base == currency)
            .filter_map(|p| p.total_price.or(p.amount))
            .sum()
    }
}

/// Desired allocation: ticker to target percent.
///
/// Percents are not required to sum to 100; engines never normalize.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DesiredWallet(pub FxHashMap<String, f64>);

impl DesiredWallet {
    /// Load and validate a desired-wallet JSON file (`{"TRUR": 40, ...}`).
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::SnapshotRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_json(&contents)
    }

    /// Parse from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        let desired: DesiredWallet = serde_json::from_str(json)?;
        desired.validate()?;
        Ok(desired)
    }

    fn validate(&self) -> Result<()> {
        for (ticker, percent) in &self.0 {
            if ticker.is_empty() {
                return Err(Error::Snapshot("desired wallet with empty ticker".into()));
            }
            if !percent.is_finite() || *percent < 0.0 {
                return Err(Error::Snapshot(format!(
                    "desired percent for {ticker} must be finite and >= 0, got {percent}"
                )));
            }
        }
        Ok(())
    }

    pub fn contains(&self, ticker: &str) -> bool {
        self.0.contains_key(ticker)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &f64)> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Copy with percents scaled to sum to 100. Zero-sum wallets are returned
    /// unchanged.
    pub fn normalized(&self) -> DesiredWallet {
        let sum: f64 = self.0.values().sum();
        if sum <= 0.0 {
            return self.clone();
        }
        DesiredWallet(
            self.0
                .iter()
                .map(|(t, p)| (t.clone(), p * 100.0 / sum))
                .collect(),
        )
    }
}

/// Per-ticker metrics consumed by metric-weighted allocation modes.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct InstrumentMetrics {
    pub market_cap: Option<f64>,
    pub aum: Option<f64>,
}

impl InstrumentMetrics {
    fn has(&self, category: &str) -> bool {
        match category {
            "market_cap" => self.market_cap.is_some(),
            "aum" => self.aum.is_some(),
            _ => false,
        }
    }
}

/// Check that every ticker carries the metrics its allocation mode needs.
///
/// Allocation by market cap or AUM must halt rather than silently mis-weight
/// when data is absent, so this is the one loud error in the system.
pub fn validate_allocation_data(
    mode: &str,
    required: &[&str],
    metrics: &FxHashMap<String, InstrumentMetrics>,
    tickers: &[String],
) -> Result<()> {
    let mut missing: Vec<String> = Vec::new();
    let mut affected: Vec<String> = Vec::new();

    for ticker in tickers {
        let available = metrics.get(ticker).copied().unwrap_or_default();
        let absent: Vec<&str> = required
            .iter()
            .copied()
            .filter(|c| !available.has(c))
            .collect();
        if !absent.is_empty() {
            affected.push(ticker.clone());
            for category in absent {
                if !missing.iter().any(|m| m == category) {
                    missing.push(category.to_string());
                }
            }
        }
    }

    if affected.is_empty() {
        Ok(())
    } else {
        Err(Error::MissingAllocationData {
            mode: mode.to_string(),
            missing,
            tickers: affected,
        })
    }
}
