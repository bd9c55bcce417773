use serde::{Deserialize, Serialize};
use std::fmt;

/// Ticks per whole currency unit.
///
/// The source kept prices as raw floats and compared them with an
/// epsilon (`FloatEqual`, 1e-6 relative). We take the redesign path the
/// spec recommends instead: prices are fixed-point integers, so equality
/// and ordering are both exact `u64` comparisons and the epsilon dance
/// disappears entirely.
pub const TICK_SCALE: u64 = 100;

/// A price expressed in ticks (hundredths of a currency unit).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Price(pub u64);

impl Price {
    /// Builds a price from a whole number of currency units, e.g.
    /// `Price::from_units(100)` is "100.00".
    pub fn from_units(units: u64) -> Self {
        Price(units * TICK_SCALE)
    }

    /// Builds a price from a floating-point currency amount, rounding to
    /// the nearest tick. Only used at the wire boundary (tests, CLI
    /// input) — the book itself never compares floats.
    pub fn from_f64(value: f64) -> Self {
        Price((value * TICK_SCALE as f64).round() as u64)
    }

    pub fn as_f64(&self) -> f64 {
        self.0 as f64 / TICK_SCALE as f64
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.as_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn units_and_f64_agree_on_whole_numbers() {
        assert_eq!(Price::from_units(100), Price::from_f64(100.0));
        assert_eq!(Price::from_units(99), Price::from_f64(99.0));
    }

    #[test]
    fn ordering_is_exact() {
        assert!(Price::from_units(99) < Price::from_units(100));
        assert_eq!(Price::from_units(100), Price::from_units(100));
    }
}
