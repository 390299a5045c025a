//! Fixed-point money conversion.
//!
//! The broker wire format carries amounts as an integer whole part plus a
//! nano (1e-9) fractional part. Engine arithmetic happens on `f64`; this
//! module owns the round-trip between the two representations.

use serde::{Deserialize, Serialize};

/// Nano parts per whole money unit.
pub const NANOS_PER_UNIT: i64 = 1_000_000_000;

/// A fixed-point money amount: whole `units` plus a `nano` fraction.
///
/// Invariant: `nano` is always in `[0, 1e9)`. Negative amounts use the floor
/// convention (`-1.5` is `units = -2, nano = 500_000_000`) so the invariant
/// holds for every sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    pub units: i64,
    pub nano: i32,
}

impl Money {
    pub const ZERO: Money = Money { units: 0, nano: 0 };

    /// Build from raw parts, normalizing `nano` into `[0, 1e9)`.
    ///
    /// Accepts the broker's sign-shared form (`units = -1, nano = -5e8`)
    /// as well as already-normalized parts.
    pub fn new(units: i64, nano: i64) -> Self {
        Money {
            units: units + nano.div_euclid(NANOS_PER_UNIT),
            nano: nano.rem_euclid(NANOS_PER_UNIT) as i32,
        }
    }

    /// Nearest fixed-point amount to a floating decimal, at nano resolution.
    pub fn from_f64(value: f64) -> Self {
        let total_nanos = (value * NANOS_PER_UNIT as f64).round() as i64;
        Money::new(0, total_nanos)
    }

    /// Floating decimal used by the engines.
    ///
    /// Exact whenever the nano-scaled magnitude fits f64's 53-bit mantissa
    /// (about ±9.0e6 units), far above realistic account sizes.
    pub fn to_f64(self) -> f64 {
        self.units as f64 + self.nano as f64 / NANOS_PER_UNIT as f64
    }

    /// True when the amount is exactly zero.
    pub fn is_zero(self) -> bool {
        self.units == 0 && self.nano == 0
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let total = self.units as i128 * NANOS_PER_UNIT as i128 + self.nano as i128;
        let sign = if total < 0 { "-" } else { "" };
        let abs = total.unsigned_abs();
        write!(
            f,
            "{sign}{}.{:09}",
            abs / NANOS_PER_UNIT as u128,
            abs % NANOS_PER_UNIT as u128
        )
    }
}

/// Snapshot-side amount: either a plain decimal or the fixed-point pair.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(untagged)]
pub enum MoneyRepr {
    Fixed(Money),
    Decimal(f64),
}

impl MoneyRepr {
    pub fn to_f64(self) -> f64 {
        match self {
            MoneyRepr::Fixed(m) => m.to_f64(),
            MoneyRepr::Decimal(v) => v,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_normalizes_overflowing_nano() {
        let m = Money::new(1, 2_500_000_000);
        assert_eq!(m.units, 3);
        assert_eq!(m.nano, 500_000_000);
    }

    #[test]
    fn new_normalizes_negative_nano() {
        // broker sign-shared form: -1 units, -0.5 in nanos
        let m = Money::new(-1, -500_000_000);
        assert_eq!(m.units, -2);
        assert_eq!(m.nano, 500_000_000);
        assert_eq!(m.to_f64(), -1.5);
    }

    #[test]
    fn round_trip_positive() {
        let m = Money::from_f64(123.456789);
        assert_eq!(m.units, 123);
        assert_eq!(m.nano, 456_789_000);
        assert!((m.to_f64() - 123.456789).abs() < 1e-9);
    }

    #[test]
    fn round_trip_negative_uses_floor_convention() {
        let m = Money::from_f64(-1.5);
        assert_eq!(m.units, -2);
        assert_eq!(m.nano, 500_000_000);
        assert_eq!(m.to_f64(), -1.5);
    }

    #[test]
    fn nano_invariant_holds_for_all_inputs() {
        for v in [-1234.000000001, -0.1, 0.0, 0.999999999, 7e5] {
            let m = Money::from_f64(v);
            assert!(m.nano >= 0 && (m.nano as i64) < NANOS_PER_UNIT, "nano out of range for {v}");
        }
    }

    #[test]
    fn zero() {
        assert!(Money::ZERO.is_zero());
        assert_eq!(Money::from_f64(0.0), Money::ZERO);
        assert_eq!(Money::ZERO.to_f64(), 0.0);
    }

    #[test]
    fn display() {
        assert_eq!(format!("{}", Money::new(5, 250_000_000)), "5.250000000");
        assert_eq!(format!("{}", Money::from_f64(-1.5)), "-1.500000000");
    }

    #[test]
    fn repr_accepts_both_forms() {
        let fixed: MoneyRepr = serde_json::from_str(r#"{"units": 10, "nano": 500000000}"#).unwrap();
        assert_eq!(fixed.to_f64(), 10.5);

        let plain: MoneyRepr = serde_json::from_str("10.5").unwrap();
        assert_eq!(plain.to_f64(), 10.5);
    }
}
