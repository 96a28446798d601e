//! Ambient market-condition inputs for strategy activation

use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct MarketConditions {
    /// Traded volume over the scheduler's lookback, quote units.
    pub volume: Decimal,
    /// Volatility in percent.
    pub volatility: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActivationThresholds {
    pub min_volume: Decimal,
    pub min_volatility: Decimal,
}

impl ActivationThresholds {
    pub fn is_met(&self, conditions: &MarketConditions) -> bool {
        conditions.volume >= self.min_volume && conditions.volatility >= self.min_volatility
    }
}
