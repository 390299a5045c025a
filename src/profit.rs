//! Profit/loss engine.
//!
//! Per-position profit against cost basis, an optional minimum-profit gate
//! for closing positions, iteration-level aggregation, and the per-day
//! cumulative profit/expense counters.

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::Serialize;

use crate::wallet::{Position, Wallet};

/// Profit of one position against its cost basis.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ProfitResult {
    pub profit_amount: f64,
    pub profit_percent: f64,
    /// Inclusive comparison against the configured gate; always true when no
    /// gate is set. A negative gate expresses a maximum allowed loss.
    pub meets_threshold: bool,
}

/// Profit of a position against its cost basis, or `None` when the inputs
/// don't allow one: missing/non-positive current value or quantity, or no
/// usable acquisition price (FIFO average preferred, simple average as
/// fallback; non-positive prices count as unusable).
pub fn calculate_position_profit(
    position: &Position,
    min_profit_percent: Option<f64>,
) -> Option<ProfitResult> {
    let current_value = position.total_price.filter(|v| *v > 0.0)?;
    let amount = position.amount.filter(|a| *a > 0.0)?;
    let avg_price = position
        .average_price_fifo
        .filter(|p| *p > 0.0)
        .or(position.average_price.filter(|p| *p > 0.0))?;

    let cost_basis = avg_price * amount;
    let profit_amount = current_value - cost_basis;
    let profit_percent = profit_amount / cost_basis * 100.0;
    let meets_threshold = min_profit_percent.is_none_or(|min| profit_percent >= min);

    Some(ProfitResult {
        profit_amount,
        profit_percent,
        meets_threshold,
    })
}

/// One wallet entry in the iteration summary.
#[derive(Debug, Clone, Serialize)]
pub struct PositionProfit {
    pub base: String,
    pub profit_amount: f64,
    pub profit_percent: f64,
    pub meets_threshold: bool,
}

/// Wallet-wide profit for one rebalancing iteration.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IterationProfitSummary {
    pub total_profit: f64,
    pub profit_positions: usize,
    pub loss_positions: usize,
    pub positions: Vec<PositionProfit>,
}

/// Sum per-position profit across the wallet, skipping cash and positions
/// without a computable profit.
pub fn calculate_iteration_profit(
    wallet: &Wallet,
    min_profit_percent: Option<f64>,
) -> IterationProfitSummary {
    let mut summary = IterationProfitSummary::default();
    for position in &wallet.positions {
        if position.is_currency() {
            continue;
        }
        let Some(result) = calculate_position_profit(position, min_profit_percent) else {
            continue;
        };
        summary.total_profit += result.profit_amount;
        if result.profit_amount > 0.0 {
            summary.profit_positions += 1;
        } else if result.profit_amount < 0.0 {
            summary.loss_positions += 1;
        }
        summary.positions.push(PositionProfit {
            base: position.base.clone(),
            profit_amount: result.profit_amount,
            profit_percent: result.profit_percent,
            meets_threshold: result.meets_threshold,
        });
    }
    summary
}

/// Running profit and expense totals for one account, reset at local
/// midnight in the exchange timezone.
///
/// The day boundary is detected from the wall-clock time passed to each
/// call, not from a timer, so the type stays clock-free. One instance per
/// account; iterations must complete sequentially.
#[derive(Debug, Clone)]
pub struct DailyProfitTracker {
    offset: FixedOffset,
    day: Option<NaiveDate>,
    cumulative_profit: f64,
    cumulative_expenses: f64,
}

impl DailyProfitTracker {
    pub fn new(offset: FixedOffset) -> Self {
        DailyProfitTracker {
            offset,
            day: None,
            cumulative_profit: 0.0,
            cumulative_expenses: 0.0,
        }
    }

    fn roll_day(&mut self, now: DateTime<Utc>) {
        let today = now.with_timezone(&self.offset).date_naive();
        if self.day != Some(today) {
            self.day = Some(today);
            self.cumulative_profit = 0.0;
            self.cumulative_expenses = 0.0;
        }
    }

    pub fn record_profit(&mut self, now: DateTime<Utc>, amount: f64) {
        self.roll_day(now);
        self.cumulative_profit += amount;
    }

    pub fn record_expense(&mut self, now: DateTime<Utc>, amount: f64) {
        self.roll_day(now);
        self.cumulative_expenses += amount;
    }

    pub fn cumulative_profit(&self) -> f64 {
        self.cumulative_profit
    }

    pub fn cumulative_expenses(&self) -> f64 {
        self.cumulative_expenses
    }

    pub fn net_daily_profit(&self) -> f64 {
        self.cumulative_profit - self.cumulative_expenses
    }

    pub fn day(&self) -> Option<NaiveDate> {
        self.day
    }
}
