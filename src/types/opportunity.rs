//! Single-pool opportunity types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use super::{PoolKey, PoolPair};

/// A candidate single-pool trade discovered by one scan. Never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct PoolOpportunity {
    pub pool: PoolPair,
    pub forward_price: Decimal,
    pub reverse_price: Decimal,
    pub imbalance_bps: Decimal,
    pub expected_profit: Decimal,
    pub profit_bps: Decimal,
    pub liquidity_depth: Decimal,
    pub discovered_at: DateTime<Utc>,
    /// Sole ranking key, higher is better.
    pub risk_adjusted_score: Decimal,
}

impl PoolOpportunity {
    pub fn token_in(&self) -> &str {
        &self.pool.token_a
    }

    pub fn token_out(&self) -> &str {
        &self.pool.token_b
    }

    pub fn key(&self) -> PoolKey {
        self.pool.key()
    }
}

/// Sorts descending by risk-adjusted score.
pub fn sort_by_score(opportunities: &mut [PoolOpportunity]) {
    opportunities.sort_by(|a, b| b.risk_adjusted_score.cmp(&a.risk_adjusted_score));
}
