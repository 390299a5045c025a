//! Non-margin funding engine.
//!
//! Some instruments cannot be margin-traded and must be bought with cash
//! raised by selling other holdings. This module decides which purchases
//! need such funding and builds a lot-quantized selling plan under the
//! configured policy.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::config::FundingConfig;
use crate::profit;
use crate::wallet::{DesiredWallet, Position, Wallet};

/// Policy for choosing what to sell when raising funds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SellingMode {
    /// Never sell.
    #[default]
    None,
    /// Draw greedily from profitable positions only.
    OnlyPositivePositionsSell,
    /// Spread the need across candidates in proportion to their value.
    EqualInPercents,
    /// Any unrecognized config value parses here and resolves to no selling.
    #[serde(other)]
    Unknown,
}

/// One entry of the selling plan. `sell_amount` is always `sell_lots` times
/// the position's lot price.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SellOrder {
    pub sell_lots: u64,
    pub sell_amount: f64,
}

/// Ticker to sell order. Positions contributing nothing are omitted.
pub type SellingPlan = FxHashMap<String, SellOrder>;

/// Purchases of configured non-margin instruments that are large enough to
/// need external funding.
///
/// A ticker is included only when it appears in both the desired wallet and
/// the snapshot, and its pending buy amount is at least
/// `total portfolio value * min_buy_rebalance_percent / 100` (inclusive).
/// The mapped value is the raw purchase amount, unmodified. Fully inert when
/// the feature is disabled.
pub fn calculate_required_funds(
    wallet: &Wallet,
    desired: &DesiredWallet,
    config: &FundingConfig,
) -> FxHashMap<String, f64> {
    let mut required = FxHashMap::default();
    if !config.enabled {
        return required;
    }
    let threshold = wallet.total_value() * config.min_buy_rebalance_percent / 100.0;
    for ticker in &config.instruments {
        if !desired.contains(ticker) {
            continue;
        }
        let Some(position) = wallet.position(ticker) else {
            continue;
        };
        let Some(purchase) = position.to_buy_amount else {
            continue;
        };
        if purchase >= threshold {
            required.insert(ticker.clone(), purchase);
        }
    }
    required
}

/// Single filter pipeline for sell candidates, parameterized by mode.
///
/// Cash and the configured non-margin instruments never qualify (the latter
/// are what the sale is funding). `OnlyPositivePositionsSell` additionally
/// requires a positive profit that meets the gate; `EqualInPercents` only
/// requires a positive quantity, though a supplied profit gate still
/// filters. `None` and unknown modes select nothing.
pub fn identify_positions_for_selling<'a>(
    wallet: &'a Wallet,
    config: &FundingConfig,
    mode: SellingMode,
    min_profit_percent: Option<f64>,
) -> Vec<&'a Position> {
    if !config.enabled || matches!(mode, SellingMode::None | SellingMode::Unknown) {
        return Vec::new();
    }
    wallet
        .positions
        .iter()
        .filter(|p| !p.is_currency())
        .filter(|p| !config.instruments.iter().any(|i| i == &p.base))
        .filter(|p| qualifies(p, mode, min_profit_percent))
        .collect()
}

fn qualifies(position: &Position, mode: SellingMode, min_profit_percent: Option<f64>) -> bool {
    match mode {
        SellingMode::OnlyPositivePositionsSell => {
            profit::calculate_position_profit(position, min_profit_percent)
                .is_some_and(|r| r.profit_amount > 0.0 && r.meets_threshold)
        }
        SellingMode::EqualInPercents => {
            let has_quantity = position.amount.is_some_and(|a| a > 0.0);
            let gate_ok = match min_profit_percent {
                None => true,
                Some(_) => profit::calculate_position_profit(position, min_profit_percent)
                    .is_some_and(|r| r.meets_threshold),
            };
            has_quantity && gate_ok
        }
        SellingMode::None | SellingMode::Unknown => false,
    }
}

/// Profitable sell candidates: the filter pipeline fixed to the
/// positive-profit mode.
pub fn identify_profitable_positions<'a>(
    wallet: &'a Wallet,
    config: &FundingConfig,
    min_profit_percent: Option<f64>,
) -> Vec<&'a Position> {
    identify_positions_for_selling(
        wallet,
        config,
        SellingMode::OnlyPositivePositionsSell,
        min_profit_percent,
    )
}

/// Build the selling plan covering the required funds plus any cash deficit.
///
/// Greedy mode draws candidates in the given order until the need is met;
/// proportional mode splits the need by each candidate's share of total
/// candidate value. Both quantize up to whole lots and never sell more than
/// a position holds.
pub fn calculate_selling_amounts(
    positions: &[&Position],
    required_funds: &FxHashMap<String, f64>,
    mode: SellingMode,
    cash_balance: f64,
) -> SellingPlan {
    let mut plan = SellingPlan::default();
    let need: f64 = required_funds.values().sum::<f64>() + (-cash_balance).max(0.0);
    if need <= 0.0 {
        return plan;
    }

    match mode {
        SellingMode::None | SellingMode::Unknown => plan,
        SellingMode::OnlyPositivePositionsSell => {
            let mut remaining = need;
            for position in positions {
                if remaining <= 0.0 {
                    break;
                }
                let Some(order) = sized_sell(position, remaining) else {
                    continue;
                };
                remaining -= order.sell_amount;
                plan.insert(position.base.clone(), order);
            }
            plan
        }
        SellingMode::EqualInPercents => {
            let total: f64 = positions
                .iter()
                .filter_map(|p| p.total_price.filter(|v| *v > 0.0))
                .sum();
            if total <= 0.0 {
                return plan;
            }
            for position in positions {
                let Some(value) = position.total_price.filter(|v| *v > 0.0) else {
                    continue;
                };
                let share = need * value / total;
                let Some(order) = sized_sell(position, share) else {
                    continue;
                };
                plan.insert(position.base.clone(), order);
            }
            plan
        }
    }
}

/// Whole-lot sell sized to cover `amount`, clamped to what the position
/// holds. `None` when the position cannot contribute.
fn sized_sell(position: &Position, amount: f64) -> Option<SellOrder> {
    if amount <= 0.0 {
        return None;
    }
    let lot_price = position.lot_price.filter(|p| *p > 0.0)?;
    let lots_held = position.lots().filter(|l| *l > 0)?;
    let sell_lots = ((amount / lot_price).ceil() as u64).min(lots_held);
    if sell_lots == 0 {
        return None;
    }
    Some(SellOrder {
        sell_lots,
        sell_amount: sell_lots as f64 * lot_price,
    })
}
