//! Currency value object - gold/silver/copper balances.
//!
//! Denominations are clamped independently to `[MIN_COINS, MAX_COINS]`;
//! there is deliberately no cross-denomination carry on clamping. The
//! `to_copper`/`from_copper` helpers exist for display totals and price math.

use serde::{Deserialize, Serialize};

pub const COPPER_PER_SILVER: i64 = 10;
pub const SILVER_PER_GOLD: i64 = 10;
pub const COPPER_PER_GOLD: i64 = 100;

/// Lower bound for a single denomination balance.
pub const MIN_COINS: i64 = 0;
/// Upper bound for a single denomination balance.
pub const MAX_COINS: i64 = 32767;

/// A character's coin balances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Currency {
    pub gold: i64,
    pub silver: i64,
    pub copper: i64,
}

impl Currency {
    pub fn new(gold: i64, silver: i64, copper: i64) -> Self {
        Self {
            gold,
            silver,
            copper,
        }
    }

    /// Clamp every denomination into `[MIN_COINS, MAX_COINS]` independently.
    pub fn clamped(self) -> Self {
        Self {
            gold: self.gold.clamp(MIN_COINS, MAX_COINS),
            silver: self.silver.clamp(MIN_COINS, MAX_COINS),
            copper: self.copper.clamp(MIN_COINS, MAX_COINS),
        }
    }

    /// Total value expressed in copper.
    pub fn to_copper(self) -> i64 {
        self.gold * COPPER_PER_GOLD + self.silver * COPPER_PER_SILVER + self.copper
    }

    /// Canonical decomposition of a copper total into gold/silver/copper.
    pub fn from_copper(total_copper: i64) -> Self {
        let gold = total_copper / COPPER_PER_GOLD;
        let remaining = total_copper % COPPER_PER_GOLD;
        let silver = remaining / COPPER_PER_SILVER;
        let copper = remaining % COPPER_PER_SILVER;
        Self {
            gold,
            silver,
            copper,
        }
    }
}

impl Default for Currency {
    fn default() -> Self {
        Self::new(0, 0, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_copper() {
        assert_eq!(Currency::new(1, 2, 3).to_copper(), 123);
        assert_eq!(Currency::new(0, 0, 0).to_copper(), 0);
    }

    #[test]
    fn test_from_copper_decomposition() {
        assert_eq!(Currency::from_copper(123), Currency::new(1, 2, 3));
        assert_eq!(Currency::from_copper(99), Currency::new(0, 9, 9));
        assert_eq!(Currency::from_copper(500), Currency::new(5, 0, 0));
    }

    #[test]
    fn test_clamped_no_carry() {
        // 40000 copper is NOT carried into silver; it is clamped in place.
        let clamped = Currency::new(-5, 40000, 40000).clamped();
        assert_eq!(clamped, Currency::new(0, MAX_COINS, MAX_COINS));
    }

    #[test]
    fn test_clamped_in_range_is_identity() {
        let c = Currency::new(3, 9, 7);
        assert_eq!(c.clamped(), c);
    }
}
