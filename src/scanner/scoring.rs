//! Opportunity scoring and ranking

use chrono::Utc;
use rust_decimal::prelude::*;
use rust_decimal_macros::dec;
use std::time::Duration;
use crate::{
    types::{sort_by_score, PoolOpportunity, PoolPair},
    utils::ratio_bps,
};

pub const MAX_OPPORTUNITIES: usize = 5;
pub const MIN_SCORE: Decimal = dec!(5);

const PROFIT_WEIGHT_CAP: Decimal = dec!(20);
const IMBALANCE_WEIGHT_CAP: Decimal = dec!(15);
const DEPTH_WEIGHT_CAP: Decimal = dec!(10);

/// Figures derived from one forward/reverse probe of a pool.
#[derive(Debug, Clone, PartialEq)]
pub struct PoolMetrics {
    pub forward_price: Decimal,
    pub reverse_price: Decimal,
    pub imbalance_bps: Decimal,
    pub profit: Decimal,
    pub profit_bps: Decimal,
    pub depth: Decimal,
}

/// `None` when any amount is non-positive.
pub fn pool_metrics(probe_amount: Decimal, forward_out: Decimal, reverse_out: Decimal) -> Option<PoolMetrics> {
    if probe_amount <= Decimal::ZERO || forward_out <= Decimal::ZERO || reverse_out <= Decimal::ZERO {
        return None;
    }

    let forward_price = forward_out / probe_amount;
    let reverse_price = probe_amount / reverse_out;
    let imbalance_bps = ratio_bps((forward_price - reverse_price).abs(), forward_price);
    let profit = reverse_out - probe_amount;

    Some(PoolMetrics {
        forward_price,
        reverse_price,
        imbalance_bps,
        profit,
        profit_bps: ratio_bps(profit, probe_amount),
        depth: forward_out.min(reverse_out),
    })
}

/// Minutes since the previous scan; never negative.
pub fn freshness_penalty(since_last_scan: Duration) -> Decimal {
    Decimal::from_f64(since_last_scan.as_secs_f64() / 60.0)
        .unwrap_or(Decimal::ZERO)
        .max(Decimal::ZERO)
}

pub fn risk_adjusted_score(metrics: &PoolMetrics, penalty: Decimal) -> Decimal {
    (metrics.profit_bps / dec!(5)).min(PROFIT_WEIGHT_CAP)
        + (metrics.imbalance_bps / dec!(10)).min(IMBALANCE_WEIGHT_CAP)
        + (metrics.depth / dec!(100)).min(DEPTH_WEIGHT_CAP)
        - penalty.max(Decimal::ZERO)
}

pub fn build_opportunity(pool: &PoolPair, metrics: PoolMetrics, penalty: Decimal) -> PoolOpportunity {
    let risk_adjusted_score = risk_adjusted_score(&metrics, penalty);
    PoolOpportunity {
        pool: pool.clone(),
        forward_price: metrics.forward_price,
        reverse_price: metrics.reverse_price,
        imbalance_bps: metrics.imbalance_bps,
        expected_profit: metrics.profit,
        profit_bps: metrics.profit_bps,
        liquidity_depth: metrics.depth,
        discovered_at: Utc::now(),
        risk_adjusted_score,
    }
}

/// Drops candidates under the quality floor, sorts by score and keeps the top five.
pub fn rank_opportunities(mut opportunities: Vec<PoolOpportunity>) -> Vec<PoolOpportunity> {
    opportunities.retain(|o| o.risk_adjusted_score >= MIN_SCORE);
    sort_by_score(&mut opportunities);
    opportunities.truncate(MAX_OPPORTUNITIES);
    opportunities
}
