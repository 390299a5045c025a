//! Commission tracking.
//!
//! Commission arrives on the broker's order response when it reports one;
//! otherwise it is estimated. Totals accumulate per iteration and per
//! calendar day in the exchange timezone.

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::money::Money;

/// Commission rate used when the broker response does not carry one.
pub const COMMISSION_ESTIMATE_RATE: f64 = 0.0005;
/// Minimum commission charged per order, in money units.
pub const COMMISSION_MINIMUM: f64 = 1.0;

/// Fallback estimate: `max(|order amount| * 0.05%, 1 money unit)`.
pub fn estimate_commission(order_amount: f64) -> f64 {
    (order_amount.abs() * COMMISSION_ESTIMATE_RATE).max(COMMISSION_MINIMUM)
}

/// Commission from an opaque order response, falling back to the estimate.
///
/// Accepts either a plain number or the broker's `{units, nano}` pair under
/// a `commission` key.
pub fn commission_from_response(response: &Value, order_amount: f64) -> f64 {
    response
        .get("commission")
        .and_then(value_as_money)
        .unwrap_or_else(|| estimate_commission(order_amount))
}

fn value_as_money(value: &Value) -> Option<f64> {
    if let Some(n) = value.as_f64() {
        return Some(n);
    }
    let units = value.get("units")?.as_i64()?;
    let nano = value.get("nano").and_then(Value::as_i64).unwrap_or(0);
    Some(Money::new(units, nano).to_f64())
}

/// One recorded commission.
#[derive(Debug, Clone, Serialize)]
pub struct ExpenseRecord {
    pub base: String,
    pub commission: f64,
}

/// Per-iteration and per-day commission accumulator for one account.
///
/// Same day-boundary rule as the profit tracker: detected from the
/// wall-clock time passed to each call.
#[derive(Debug, Clone)]
pub struct ExpenseTracker {
    offset: FixedOffset,
    day: Option<NaiveDate>,
    iteration: Vec<ExpenseRecord>,
    daily_total: f64,
}

impl ExpenseTracker {
    pub fn new(offset: FixedOffset) -> Self {
        ExpenseTracker {
            offset,
            day: None,
            iteration: Vec::new(),
            daily_total: 0.0,
        }
    }

    /// Clear the per-iteration records; daily totals are untouched.
    pub fn start_iteration(&mut self) {
        self.iteration.clear();
    }

    pub fn record(&mut self, now: DateTime<Utc>, base: &str, commission: f64) {
        let today = now.with_timezone(&self.offset).date_naive();
        if self.day != Some(today) {
            self.day = Some(today);
            self.daily_total = 0.0;
        }
        self.daily_total += commission;
        self.iteration.push(ExpenseRecord {
            base: base.to_string(),
            commission,
        });
    }

    pub fn iteration_total(&self) -> f64 {
        self.iteration.iter().map(|r| r.commission).sum()
    }

    pub fn iteration_records(&self) -> &[ExpenseRecord] {
        &self.iteration
    }

    pub fn daily_total(&self) -> f64 {
        self.daily_total
    }

    pub fn day(&self) -> Option<NaiveDate> {
        self.day
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn msk() -> FixedOffset {
        FixedOffset::east_opt(3 * 3600).unwrap()
    }

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        msk()
            .with_ymd_and_hms(2026, 3, day, hour, 0, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn commission_read_from_response() {
        let response = serde_json::json!({"order_id": "42", "commission": 12.5});
        assert_eq!(commission_from_response(&response, 10_000.0), 12.5);
    }

    #[test]
    fn commission_reads_fixed_point_pair() {
        let response = serde_json::json!({"commission": {"units": 3, "nano": 500000000}});
        assert_eq!(commission_from_response(&response, 10_000.0), 3.5);
    }

    #[test]
    fn commission_estimated_when_absent() {
        let response = serde_json::json!({"order_id": "42"});
        assert_eq!(commission_from_response(&response, 10_000.0), 5.0);
    }

    #[test]
    fn estimate_has_floor() {
        assert_eq!(estimate_commission(100.0), 1.0);
        assert_eq!(estimate_commission(10_000.0), 5.0);
        assert_eq!(estimate_commission(-10_000.0), 5.0);
    }

    #[test]
    fn iteration_and_daily_totals() {
        let mut tracker = ExpenseTracker::new(msk());
        tracker.start_iteration();
        tracker.record(at(2, 10), "TRUR", 5.0);
        tracker.record(at(2, 10), "TMOS", 3.0);
        assert_eq!(tracker.iteration_total(), 8.0);
        assert_eq!(tracker.daily_total(), 8.0);

        tracker.start_iteration();
        tracker.record(at(2, 11), "TRUR", 2.0);
        assert_eq!(tracker.iteration_total(), 2.0);
        assert_eq!(tracker.daily_total(), 10.0);
        assert_eq!(tracker.iteration_records().len(), 1);
    }

    #[test]
    fn daily_total_resets_on_day_boundary() {
        let mut tracker = ExpenseTracker::new(msk());
        tracker.record(at(2, 23), "TRUR", 5.0);
        tracker.record(at(3, 1), "TRUR", 2.0);
        assert_eq!(tracker.daily_total(), 2.0);
        assert_eq!(tracker.day(), NaiveDate::from_ymd_opt(2026, 3, 3));
    }
}
