//! Margin engine.
//!
//! Classifies which holdings are financed with borrowed funds, tracks
//! used/available margin and its risk level, prices margin/cash transfers,
//! decides whether to unwind margin before the session closes, and sizes
//! positions under the margin budget.

use chrono::{DateTime, Duration, FixedOffset, NaiveTime, TimeZone, Utc};
use log::warn;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::config::MarginConfig;
use crate::wallet::{DesiredWallet, Position, Wallet};

/// Broker fee rate for moving a position between margin and cash accounts.
pub const TRANSFER_FEE_RATE: f64 = 0.01;

/// What to do with margin positions when the session is about to close.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarginUnwindStrategy {
    /// Always unwind before close.
    Remove,
    /// Hold margin through the close.
    Keep,
    /// Unwind only when total margin-position value exceeds the configured cap.
    KeepIfSmall,
    /// Any unrecognized config value parses here and resolves to "do nothing".
    #[serde(other)]
    Unknown,
}

impl MarginUnwindStrategy {
    /// Parse a CLI/config string; unrecognized values degrade to `Unknown`.
    pub fn parse(s: &str) -> Self {
        match s {
            "remove" => MarginUnwindStrategy::Remove,
            "keep" => MarginUnwindStrategy::Keep,
            "keep_if_small" => MarginUnwindStrategy::KeepIfSmall,
            _ => MarginUnwindStrategy::Unknown,
        }
    }
}

/// A position financed (partly) with borrowed funds.
#[derive(Debug, Clone, Serialize)]
pub struct MarginPosition {
    #[serde(flatten)]
    pub position: Position,
    /// True iff multiplier > 1 and the position has positive value.
    pub is_margin: bool,
    /// Borrowed portion of the value: `total - total / multiplier`.
    pub margin_value: f64,
    /// The account leverage multiplier this position was sized under.
    pub leverage: f64,
    /// Hook for live margin-call detection; this engine never sets it.
    pub margin_call: bool,
}

/// Identify which holdings are margin-financed.
///
/// Empty when margin trading is disabled. Cash, non-positive values and
/// quantities, and multiplier <= 1 are all excluded.
pub fn identify_margin_positions(wallet: &Wallet, config: &MarginConfig) -> Vec<MarginPosition> {
    if !config.enabled {
        return Vec::new();
    }
    wallet
        .positions
        .iter()
        .filter(|p| !p.is_currency())
        .filter_map(|p| {
            let total = p.total_price.filter(|v| *v > 0.0)?;
            p.amount.filter(|a| *a > 0.0)?;
            if config.multiplier <= 1.0 {
                return None;
            }
            Some(MarginPosition {
                position: p.clone(),
                is_margin: true,
                margin_value: total - total / config.multiplier,
                leverage: config.multiplier,
                margin_call: false,
            })
        })
        .collect()
}

/// Margin the account could borrow: portfolio value (cash included) times
/// `multiplier - 1`. Not clamped; a negative portfolio yields a negative
/// result.
pub fn calculate_available_margin(wallet: &Wallet, config: &MarginConfig) -> f64 {
    wallet.total_value() * (config.multiplier - 1.0)
}

/// Used margin checked against the configured hard cap.
#[derive(Debug, Clone, Serialize)]
pub struct MarginLimitsValidation {
    pub is_valid: bool,
    pub total_used: f64,
    pub max_allowed: f64,
    /// Populated only when the cap is exceeded.
    pub exceeded_by: Option<f64>,
}

pub fn validate_margin_limits(
    positions: &[MarginPosition],
    config: &MarginConfig,
) -> MarginLimitsValidation {
    let total_used: f64 = positions.iter().map(|p| p.margin_value).sum();
    let is_valid = total_used <= config.max_margin_size;
    MarginLimitsValidation {
        is_valid,
        total_used,
        max_allowed: config.max_margin_size,
        exceeded_by: (!is_valid).then(|| total_used - config.max_margin_size),
    }
}

/// Qualitative banding of used-to-available margin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "low"),
            RiskLevel::Medium => write!(f, "medium"),
            RiskLevel::High => write!(f, "high"),
        }
    }
}

/// Combined available/used margin picture.
#[derive(Debug, Clone, Serialize)]
pub struct MarginStatus {
    pub available_margin: f64,
    pub used_margin: f64,
    pub remaining_margin: f64,
    pub is_valid: bool,
    pub risk_level: RiskLevel,
}

impl std::fmt::Display for MarginStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "available {:.2}, used {:.2}, remaining {:.2} [{} risk]",
            self.available_margin, self.used_margin, self.remaining_margin, self.risk_level
        )
    }
}

/// Combine available and used margin into a validity flag and risk level.
///
/// Usage below 60% is low risk, 60% to just under 80% medium, 80% and above
/// high. Negative remaining margin is always high regardless of the band.
pub fn check_margin_limits(
    wallet: &Wallet,
    positions: &[MarginPosition],
    config: &MarginConfig,
) -> MarginStatus {
    let available = calculate_available_margin(wallet, config);
    let used: f64 = positions.iter().map(|p| p.margin_value).sum();
    let remaining = available - used;
    let is_valid = remaining >= 0.0 && used <= config.max_margin_size;

    let usage = if available > 0.0 { used / available } else { 0.0 };
    let risk_level = if remaining < 0.0 || usage >= 0.8 {
        RiskLevel::High
    } else if usage >= 0.6 {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    };

    if risk_level == RiskLevel::High {
        warn!(
            "margin usage {:.1}% of available ({used:.2} / {available:.2})",
            usage * 100.0
        );
    }

    MarginStatus {
        available_margin: available,
        used_margin: used,
        remaining_margin: remaining,
        is_valid,
        risk_level,
    }
}

/// Per-position and aggregate cost of moving margin positions to cash.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TransferCostReport {
    pub total_cost: f64,
    pub free_count: usize,
    pub paid_count: usize,
    pub by_ticker: FxHashMap<String, f64>,
}

/// Price margin/cash transfers: positions valued below `free_threshold`
/// transfer for free, anything at or above it pays 1%. Undefined or
/// non-positive values are treated as free rather than erroring.
pub fn calculate_transfer_cost(
    positions: &[MarginPosition],
    config: &MarginConfig,
) -> TransferCostReport {
    let mut report = TransferCostReport::default();
    for p in positions {
        let value = p.position.total_price.unwrap_or(0.0);
        let cost = if value <= 0.0 || value < config.free_threshold {
            0.0
        } else {
            value * TRANSFER_FEE_RATE
        };
        if cost > 0.0 {
            report.paid_count += 1;
        } else {
            report.free_count += 1;
        }
        report.total_cost += cost;
        report.by_ticker.insert(p.position.base.clone(), cost);
    }
    report
}

/// Close-of-day timestamp in the exchange timezone, for the day `now` falls on.
fn close_datetime(
    now: DateTime<Utc>,
    close_time: NaiveTime,
    offset: FixedOffset,
) -> Option<DateTime<FixedOffset>> {
    let local = now.with_timezone(&offset);
    offset
        .from_local_datetime(&local.date_naive().and_time(close_time))
        .earliest()
}

/// True when the unwind window has arrived: `now` is already past the close,
/// or the next scheduled run (`now + balance_interval`) would land at or
/// after it. The look-ahead keeps the window from being missed when the next
/// iteration is scheduled after the market closes.
pub fn should_apply_margin_strategy(
    now: DateTime<Utc>,
    balance_interval: Duration,
    close_time: NaiveTime,
    offset: FixedOffset,
) -> bool {
    let Some(close) = close_datetime(now, close_time, offset) else {
        return false;
    };
    let local = now.with_timezone(&offset);
    local >= close || local + balance_interval >= close
}

/// Outcome of the close-time margin decision.
#[derive(Debug, Clone, Serialize)]
pub struct MarginStrategyDecision {
    pub should_remove_margin: bool,
    pub reason: String,
    pub transfer_cost: TransferCostReport,
    /// Minutes until the session close; zero once past it.
    pub time_to_close_min: i64,
    /// True when this is the last run before (or after) the close.
    pub is_last_balance: bool,
}

/// Decide whether to unwind margin positions ahead of the session close.
///
/// The timing gate runs first; outside the window nothing is unwound. The
/// effective strategy is the explicit argument when given, else the account
/// default. An unknown strategy resolves to "do nothing".
pub fn apply_margin_strategy(
    positions: &[MarginPosition],
    explicit_strategy: Option<MarginUnwindStrategy>,
    config: &MarginConfig,
    now: DateTime<Utc>,
    balance_interval: Duration,
    close_time: NaiveTime,
    offset: FixedOffset,
) -> MarginStrategyDecision {
    let local = now.with_timezone(&offset);
    let time_to_close_min = close_datetime(now, close_time, offset)
        .map(|close| (close - local).num_minutes().max(0))
        .unwrap_or(0);
    let is_last_balance = should_apply_margin_strategy(now, balance_interval, close_time, offset);

    let hold = |reason: String| MarginStrategyDecision {
        should_remove_margin: false,
        reason,
        transfer_cost: TransferCostReport::default(),
        time_to_close_min,
        is_last_balance,
    };

    if !is_last_balance {
        return hold(format!(
            "Not time to apply margin strategy yet ({time_to_close_min} min to close)"
        ));
    }

    match explicit_strategy.unwrap_or(config.strategy) {
        MarginUnwindStrategy::Remove => MarginStrategyDecision {
            should_remove_margin: true,
            reason: "Unwinding margin positions before market close".into(),
            transfer_cost: calculate_transfer_cost(positions, config),
            time_to_close_min,
            is_last_balance,
        },
        MarginUnwindStrategy::Keep => hold("Keeping margin positions through close".into()),
        MarginUnwindStrategy::KeepIfSmall => {
            let total: f64 = positions
                .iter()
                .filter_map(|p| p.position.total_price)
                .sum();
            if total > config.max_margin_size {
                MarginStrategyDecision {
                    should_remove_margin: true,
                    reason: format!(
                        "Margin positions total {total:.2} exceeds {:.2}, unwinding",
                        config.max_margin_size
                    ),
                    transfer_cost: calculate_transfer_cost(positions, config),
                    time_to_close_min,
                    is_last_balance,
                }
            } else {
                hold(format!(
                    "Margin positions total {total:.2} within {:.2}, keeping",
                    config.max_margin_size
                ))
            }
        }
        MarginUnwindStrategy::Unknown => hold("Unknown strategy".into()),
    }
}

/// Target sizes for one instrument under the margin budget.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PositionSize {
    pub base_size: f64,
    pub margin_size: f64,
    pub total_size: f64,
}

/// Size each desired instrument: its share of portfolio value, plus a margin
/// contribution capped both by its share of available margin and by the base
/// target itself.
pub fn calculate_optimal_position_sizes(
    wallet: &Wallet,
    desired: &DesiredWallet,
    config: &MarginConfig,
) -> FxHashMap<String, PositionSize> {
    let total = wallet.total_value();
    let available = calculate_available_margin(wallet, config);
    desired
        .iter()
        .map(|(ticker, percent)| {
            let base_size = total * percent / 100.0;
            let margin_size = (available * percent / 100.0).min(base_size);
            (
                ticker.clone(),
                PositionSize {
                    base_size,
                    margin_size,
                    total_size: base_size + margin_size,
                },
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet::DesiredWallet;

    fn margin_config(multiplier: f64) -> MarginConfig {
        MarginConfig {
            enabled: true,
            multiplier,
            free_threshold: 5_000.0,
            max_margin_size: 100_000.0,
            strategy: MarginUnwindStrategy::Keep,
        }
    }

    fn holding(base: &str, amount: f64, total: f64) -> Position {
        Position {
            base: base.into(),
            quote: "RUB".into(),
            instrument_id: None,
            amount: Some(amount),
            lot: Some(1),
            price: Some(total / amount),
            lot_price: Some(total / amount),
            total_price: Some(total),
            to_buy_amount: None,
            average_price_fifo: None,
            average_price: None,
        }
    }

    fn cash(amount: f64) -> Position {
        holding("RUB", amount, amount)
    }

    fn wallet(positions: Vec<Position>) -> Wallet {
        Wallet { positions }
    }

    fn margin_position(base: &str, total: f64, multiplier: f64) -> MarginPosition {
        MarginPosition {
            position: holding(base, 1.0, total),
            is_margin: true,
            margin_value: total - total / multiplier,
            leverage: multiplier,
            margin_call: false,
        }
    }

    fn close_1845() -> NaiveTime {
        NaiveTime::from_hms_opt(18, 45, 0).unwrap()
    }

    fn msk() -> FixedOffset {
        FixedOffset::east_opt(3 * 3600).unwrap()
    }

    /// UTC instant for the given Moscow wall-clock time on a fixed date.
    fn at_msk(h: u32, m: u32) -> DateTime<Utc> {
        msk()
            .with_ymd_and_hms(2026, 3, 2, h, m, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn identify_computes_margin_value() {
        let w = wallet(vec![holding("TGLD", 100.0, 120_000.0), cash(500.0)]);
        let positions = identify_margin_positions(&w, &margin_config(2.0));
        assert_eq!(positions.len(), 1);
        assert_eq!(positions[0].position.base, "TGLD");
        assert_eq!(positions[0].margin_value, 60_000.0);
        assert_eq!(positions[0].leverage, 2.0);
        assert!(positions[0].is_margin);
        assert!(!positions[0].margin_call);
    }

    #[test]
    fn identify_empty_when_disabled() {
        let mut config = margin_config(2.0);
        config.enabled = false;
        let w = wallet(vec![holding("TGLD", 100.0, 120_000.0)]);
        assert!(identify_margin_positions(&w, &config).is_empty());
    }

    #[test]
    fn identify_empty_for_multiplier_at_most_one() {
        let w = wallet(vec![holding("TGLD", 100.0, 120_000.0)]);
        assert!(identify_margin_positions(&w, &margin_config(1.0)).is_empty());
    }

    #[test]
    fn identify_skips_cash_and_nonpositive() {
        let negative = holding("TBAD", 10.0, -500.0);
        let mut no_amount = holding("TNIL", 1.0, 1_000.0);
        no_amount.amount = None;
        let w = wallet(vec![cash(10_000.0), negative, no_amount]);
        assert!(identify_margin_positions(&w, &margin_config(2.0)).is_empty());
    }

    #[test]
    fn available_margin_linear_in_multiplier() {
        let w = wallet(vec![holding("TRUR", 100.0, 80_000.0), cash(20_000.0)]);
        let at_2x = calculate_available_margin(&w, &margin_config(2.0));
        let at_3x = calculate_available_margin(&w, &margin_config(3.0));
        assert_eq!(at_2x, 100_000.0);
        assert_eq!(at_3x, 2.0 * at_2x);
    }

    #[test]
    fn available_margin_not_clamped() {
        let w = wallet(vec![holding("TBAD", 10.0, -500.0)]);
        assert_eq!(calculate_available_margin(&w, &margin_config(2.0)), -500.0);
    }

    #[test]
    fn validate_limits_within_cap() {
        let positions = vec![margin_position("TGLD", 120_000.0, 2.0)];
        let result = validate_margin_limits(&positions, &margin_config(2.0));
        assert!(result.is_valid);
        assert_eq!(result.total_used, 60_000.0);
        assert_eq!(result.exceeded_by, None);
    }

    #[test]
    fn validate_limits_reports_excess() {
        let positions = vec![
            margin_position("TGLD", 120_000.0, 2.0),
            margin_position("TMOS", 120_000.0, 2.0),
        ];
        let result = validate_margin_limits(&positions, &margin_config(2.0));
        assert!(!result.is_valid);
        assert_eq!(result.total_used, 120_000.0);
        assert_eq!(result.exceeded_by, Some(20_000.0));
    }

    #[test]
    fn risk_level_band_boundaries() {
        let config = margin_config(2.0);
        // available = 100_000 at 2x
        let w = wallet(vec![holding("TRUR", 100.0, 100_000.0)]);

        // exactly 60% usage -> medium
        let at_60 = vec![margin_position("A", 120_000.0, 2.0)];
        assert_eq!(
            check_margin_limits(&w, &at_60, &config).risk_level,
            RiskLevel::Medium
        );

        // exactly 80% usage -> high
        let at_80 = vec![margin_position("A", 160_000.0, 2.0)];
        assert_eq!(
            check_margin_limits(&w, &at_80, &config).risk_level,
            RiskLevel::High
        );

        // just under 60% -> low
        let at_59 = vec![margin_position("A", 118_000.0, 2.0)];
        assert_eq!(
            check_margin_limits(&w, &at_59, &config).risk_level,
            RiskLevel::Low
        );
    }

    #[test]
    fn negative_remaining_is_always_high() {
        let config = margin_config(2.0);
        let w = wallet(vec![holding("TRUR", 100.0, 1_000.0)]); // available = 1_000
        let positions = vec![margin_position("A", 4_000.0, 2.0)]; // used = 2_000
        let status = check_margin_limits(&w, &positions, &config);
        assert!(status.remaining_margin < 0.0);
        assert!(!status.is_valid);
        assert_eq!(status.risk_level, RiskLevel::High);
    }

    #[test]
    fn transfer_cost_threshold_is_inclusive() {
        let config = margin_config(2.0); // free_threshold = 5_000
        let positions = vec![
            margin_position("AT", 5_000.0, 2.0),    // exactly at threshold: paid
            margin_position("BELOW", 4_999.0, 2.0), // one unit below: free
        ];
        let report = calculate_transfer_cost(&positions, &config);
        assert_eq!(report.paid_count, 1);
        assert_eq!(report.free_count, 1);
        assert_eq!(report.by_ticker["AT"], 50.0);
        assert_eq!(report.by_ticker["BELOW"], 0.0);
        assert_eq!(report.total_cost, 50.0);
    }

    #[test]
    fn transfer_cost_undefined_value_is_free() {
        let mut p = margin_position("TNIL", 10_000.0, 2.0);
        p.position.total_price = None;
        let report = calculate_transfer_cost(&[p], &margin_config(2.0));
        assert_eq!(report.total_cost, 0.0);
        assert_eq!(report.free_count, 1);
    }

    #[test]
    fn timing_gate_look_ahead() {
        let hour = Duration::minutes(60);
        // 18:00 + 60min lands past 18:45 -> last balance
        assert!(should_apply_margin_strategy(at_msk(18, 0), hour, close_1845(), msk()));
        // already past close
        assert!(should_apply_margin_strategy(at_msk(19, 0), hour, close_1845(), msk()));
        // 17:00 + 30min is well before close
        assert!(!should_apply_margin_strategy(
            at_msk(17, 0),
            Duration::minutes(30),
            close_1845(),
            msk()
        ));
    }

    #[test]
    fn strategy_noop_before_window() {
        let positions = vec![margin_position("TGLD", 120_000.0, 2.0)];
        let decision = apply_margin_strategy(
            &positions,
            None,
            &margin_config(2.0),
            at_msk(10, 0),
            Duration::minutes(30),
            close_1845(),
            msk(),
        );
        assert!(!decision.should_remove_margin);
        assert!(decision.reason.starts_with("Not time"));
        assert!(!decision.is_last_balance);
        assert_eq!(decision.time_to_close_min, 525);
        assert_eq!(decision.transfer_cost.total_cost, 0.0);
    }

    #[test]
    fn strategy_remove_unwinds_with_cost() {
        let positions = vec![margin_position("TGLD", 120_000.0, 2.0)];
        let decision = apply_margin_strategy(
            &positions,
            Some(MarginUnwindStrategy::Remove),
            &margin_config(2.0),
            at_msk(19, 0),
            Duration::minutes(60),
            close_1845(),
            msk(),
        );
        assert!(decision.should_remove_margin);
        assert!(decision.is_last_balance);
        assert_eq!(decision.time_to_close_min, 0);
        assert_eq!(decision.transfer_cost.total_cost, 1_200.0);
    }

    #[test]
    fn strategy_keep_never_unwinds() {
        let positions = vec![margin_position("TGLD", 500_000.0, 2.0)];
        let decision = apply_margin_strategy(
            &positions,
            Some(MarginUnwindStrategy::Keep),
            &margin_config(2.0),
            at_msk(19, 0),
            Duration::minutes(60),
            close_1845(),
            msk(),
        );
        assert!(!decision.should_remove_margin);
        assert_eq!(decision.transfer_cost.total_cost, 0.0);
    }

    #[test]
    fn keep_if_small_unwinds_large_positions() {
        // total value 150_000 > max_margin_size 100_000
        let positions = vec![
            margin_position("TGLD", 90_000.0, 2.0),
            margin_position("TMOS", 60_000.0, 2.0),
        ];
        let decision = apply_margin_strategy(
            &positions,
            Some(MarginUnwindStrategy::KeepIfSmall),
            &margin_config(2.0),
            at_msk(19, 0),
            Duration::minutes(60),
            close_1845(),
            msk(),
        );
        assert!(decision.should_remove_margin);
    }

    #[test]
    fn keep_if_small_keeps_small_positions() {
        let positions = vec![margin_position("TGLD", 90_000.0, 2.0)];
        let decision = apply_margin_strategy(
            &positions,
            Some(MarginUnwindStrategy::KeepIfSmall),
            &margin_config(2.0),
            at_msk(19, 0),
            Duration::minutes(60),
            close_1845(),
            msk(),
        );
        assert!(!decision.should_remove_margin);
    }

    #[test]
    fn unknown_strategy_is_a_noop() {
        let positions = vec![margin_position("TGLD", 500_000.0, 2.0)];
        let decision = apply_margin_strategy(
            &positions,
            Some(MarginUnwindStrategy::parse("keep_if_smal")),
            &margin_config(2.0),
            at_msk(19, 0),
            Duration::minutes(60),
            close_1845(),
            msk(),
        );
        assert!(!decision.should_remove_margin);
        assert_eq!(decision.reason, "Unknown strategy");
        assert_eq!(decision.transfer_cost.total_cost, 0.0);
    }

    #[test]
    fn position_sizes_cap_margin_at_base() {
        let w = wallet(vec![holding("TRUR", 100.0, 100_000.0)]);
        let mut desired = DesiredWallet::default();
        desired.0.insert("TRUR".into(), 60.0);
        desired.0.insert("TMOS".into(), 40.0);

        let sizes = calculate_optimal_position_sizes(&w, &desired, &margin_config(2.0));
        // available margin = 100_000; base(TRUR) = 60_000; margin share = 60_000
        let trur = sizes["TRUR"];
        assert_eq!(trur.base_size, 60_000.0);
        assert_eq!(trur.margin_size, 60_000.0);
        assert_eq!(trur.total_size, 120_000.0);

        let tmos = sizes["TMOS"];
        assert_eq!(tmos.base_size, 40_000.0);
        assert_eq!(tmos.margin_size, 40_000.0);
    }

    #[test]
    fn position_sizes_margin_capped_by_available_share() {
        // multiplier 1.5: available = 50_000, margin share < base
        let w = wallet(vec![holding("TRUR", 100.0, 100_000.0)]);
        let mut desired = DesiredWallet::default();
        desired.0.insert("TRUR".into(), 50.0);
        let sizes = calculate_optimal_position_sizes(&w, &desired, &margin_config(1.5));
        let trur = sizes["TRUR"];
        assert_eq!(trur.base_size, 50_000.0);
        assert_eq!(trur.margin_size, 25_000.0);
        assert_eq!(trur.total_size, 75_000.0);
    }

    #[test]
    fn position_sizes_empty_desired_and_zero_portfolio() {
        let w = wallet(vec![holding("TRUR", 100.0, 100_000.0)]);
        assert!(
            calculate_optimal_position_sizes(&w, &DesiredWallet::default(), &margin_config(2.0))
                .is_empty()
        );

        let empty = wallet(vec![]);
        let mut desired = DesiredWallet::default();
        desired.0.insert("TRUR".into(), 100.0);
        let sizes = calculate_optimal_position_sizes(&empty, &desired, &margin_config(2.0));
        assert_eq!(sizes["TRUR"].total_size, 0.0);
    }
}
