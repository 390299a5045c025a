//! Iteration orchestrator: margin -> strategy -> sizing -> funding -> profit.
//!
//! Wires the engines together over one immutable snapshot and renders the
//! operator-facing plan. Order placement stays a downstream concern.

use chrono::{DateTime, Utc};
use log::info;
use rustc_hash::FxHashMap;

use crate::config::Config;
use crate::expenses;
use crate::funding::{self, SellingPlan};
use crate::margin::{
    self, MarginLimitsValidation, MarginPosition, MarginStatus, MarginStrategyDecision,
    MarginUnwindStrategy, PositionSize,
};
use crate::profit::{self, IterationProfitSummary};
use crate::wallet::{DesiredWallet, Wallet};

/// Everything one rebalancing iteration decided, for the order planner and
/// the audit trail.
#[derive(Debug, Clone)]
pub struct IterationPlan {
    pub margin_positions: Vec<MarginPosition>,
    pub margin_status: MarginStatus,
    pub margin_limits: MarginLimitsValidation,
    pub margin_decision: MarginStrategyDecision,
    pub position_sizes: FxHashMap<String, PositionSize>,
    pub required_funds: FxHashMap<String, f64>,
    pub selling_plan: SellingPlan,
    pub profit: IterationProfitSummary,
    pub cash_balance: f64,
    /// Estimated commission for executing the selling plan.
    pub estimated_commission: f64,
}

/// Compute a full iteration plan from one portfolio snapshot.
///
/// `strategy` overrides the configured margin unwind strategy when given.
pub fn plan_iteration(
    config: &Config,
    wallet: &Wallet,
    desired: &DesiredWallet,
    strategy: Option<MarginUnwindStrategy>,
    now: DateTime<Utc>,
) -> IterationPlan {
    let offset = config.schedule.utc_offset();
    let interval = config.schedule.balance_interval();

    let margin_positions = margin::identify_margin_positions(wallet, &config.margin);
    let margin_status = margin::check_margin_limits(wallet, &margin_positions, &config.margin);
    let margin_limits = margin::validate_margin_limits(&margin_positions, &config.margin);
    let margin_decision = margin::apply_margin_strategy(
        &margin_positions,
        strategy,
        &config.margin,
        now,
        interval,
        config.schedule.market_close_time,
        offset,
    );
    info!(
        "margin: {} positions, {margin_status}; {}",
        margin_positions.len(),
        margin_decision.reason
    );

    let position_sizes = margin::calculate_optimal_position_sizes(wallet, desired, &config.margin);

    let required_funds = funding::calculate_required_funds(wallet, desired, &config.funding);
    let candidates = funding::identify_positions_for_selling(
        wallet,
        &config.funding,
        config.funding.mode,
        config.profit.min_profit_percent,
    );
    let cash_balance = wallet.currency_balance(&config.account.currency);
    let selling_plan = funding::calculate_selling_amounts(
        &candidates,
        &required_funds,
        config.funding.mode,
        cash_balance,
    );
    if !selling_plan.is_empty() {
        info!(
            "funding: {} purchases need {:.2}, selling from {} positions",
            required_funds.len(),
            required_funds.values().sum::<f64>(),
            selling_plan.len()
        );
    }

    let estimated_commission = selling_plan
        .values()
        .map(|order| expenses::estimate_commission(order.sell_amount))
        .sum();

    let profit = profit::calculate_iteration_profit(wallet, config.profit.min_profit_percent);

    IterationPlan {
        margin_positions,
        margin_status,
        margin_limits,
        margin_decision,
        position_sizes,
        required_funds,
        selling_plan,
        profit,
        cash_balance,
        estimated_commission,
    }
}

fn sorted_keys<V>(map: &FxHashMap<String, V>) -> Vec<&String> {
    let mut keys: Vec<&String> = map.keys().collect();
    keys.sort();
    keys
}

impl std::fmt::Display for IterationPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.margin_positions.is_empty() {
            writeln!(f, "No margin positions.")?;
        } else {
            writeln!(f, "MARGIN POSITIONS:")?;
            for p in &self.margin_positions {
                writeln!(
                    f,
                    "  {:8} value {:>12.2}  borrowed {:>12.2}  at {:.1}x",
                    p.position.base,
                    p.position.total_price.unwrap_or(0.0),
                    p.margin_value,
                    p.leverage,
                )?;
            }
        }

        writeln!(f, "MARGIN STATUS: {}", self.margin_status)?;
        write!(
            f,
            "MARGIN LIMITS: used {:.2} / {:.2} max",
            self.margin_limits.total_used, self.margin_limits.max_allowed
        )?;
        match self.margin_limits.exceeded_by {
            Some(excess) => writeln!(f, " EXCEEDED by {excess:.2}")?,
            None => writeln!(f)?,
        }

        writeln!(
            f,
            "STRATEGY: {} ({} min to close{})",
            self.margin_decision.reason,
            self.margin_decision.time_to_close_min,
            if self.margin_decision.is_last_balance {
                ", last balance"
            } else {
                ""
            },
        )?;
        if self.margin_decision.should_remove_margin {
            writeln!(
                f,
                "  transfer cost {:.2} ({} free, {} paid)",
                self.margin_decision.transfer_cost.total_cost,
                self.margin_decision.transfer_cost.free_count,
                self.margin_decision.transfer_cost.paid_count,
            )?;
        }

        if !self.position_sizes.is_empty() {
            writeln!(f, "POSITION SIZES:")?;
            for ticker in sorted_keys(&self.position_sizes) {
                let size = &self.position_sizes[ticker];
                writeln!(
                    f,
                    "  {:8} base {:>12.2}  margin {:>12.2}  total {:>12.2}",
                    ticker, size.base_size, size.margin_size, size.total_size,
                )?;
            }
        }

        if !self.required_funds.is_empty() {
            writeln!(f, "REQUIRED FUNDS (cash balance {:.2}):", self.cash_balance)?;
            for ticker in sorted_keys(&self.required_funds) {
                writeln!(f, "  {:8} {:>12.2}", ticker, self.required_funds[ticker])?;
            }
        }

        if !self.selling_plan.is_empty() {
            writeln!(f, "SELLING PLAN:")?;
            for ticker in sorted_keys(&self.selling_plan) {
                let order = &self.selling_plan[ticker];
                writeln!(
                    f,
                    "  {:8} {:>6} lots = {:>12.2}",
                    ticker, order.sell_lots, order.sell_amount,
                )?;
            }
            writeln!(f, "  est. commission {:.2}", self.estimated_commission)?;
        }

        writeln!(
            f,
            "PROFIT: {:+.2} ({} up, {} down)",
            self.profit.total_profit, self.profit.profit_positions, self.profit.loss_positions,
        )?;
        for p in &self.profit.positions {
            writeln!(
                f,
                "  {:8} {:>+12.2} ({:+.2}%){}",
                p.base,
                p.profit_amount,
                p.profit_percent,
                if p.meets_threshold { "" } else { "  below gate" },
            )?;
        }

        Ok(())
    }
}
