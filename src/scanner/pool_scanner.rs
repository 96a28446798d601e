//! Rate-limited scanner over the configured pool universe

use futures::future::join_all;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};
use crate::{
    errors::{EngineError, EngineResult},
    gateway::{quote_amount, SwapGateway},
    schedule::IntervalGate,
    types::{PoolOpportunity, PoolPair},
};
use super::scoring::{build_opportunity, freshness_penalty, pool_metrics, rank_opportunities, PoolMetrics};

pub struct OpportunityScanner {
    gateway: Arc<dyn SwapGateway>,
    probe_amount: Decimal,
    gate: IntervalGate,
    last_scan: Option<Instant>,
    latest_prices: HashMap<String, Decimal>,
}

impl OpportunityScanner {
    pub fn new(gateway: Arc<dyn SwapGateway>, probe_amount: Decimal, gate: IntervalGate) -> Self {
        Self {
            gateway,
            probe_amount,
            gate,
            last_scan: None,
            latest_prices: HashMap::new(),
        }
    }

    /// Forward prices (`A/B` → B per A) from the most recent scan, failed pools excluded.
    pub fn latest_prices(&self) -> &HashMap<String, Decimal> {
        &self.latest_prices
    }

    /// Probes every pool concurrently and returns the ranked top candidates. Returns an empty
    /// list when called again inside the scan interval.
    pub async fn scan(&mut self, pools: &[PoolPair]) -> EngineResult<Vec<PoolOpportunity>> {
        if pools.is_empty() {
            return Err(EngineError::config("POOLS", "nothing to scan"));
        }

        let now = Instant::now();
        if !self.gate.try_acquire_at(now) {
            debug!("Scan skipped, interval {:?} not elapsed", self.gate.interval());
            return Ok(Vec::new());
        }

        let penalty = freshness_penalty(
            self.last_scan
                .map(|last| now.saturating_duration_since(last))
                .unwrap_or_default(),
        );
        self.last_scan = Some(now);

        let probes = join_all(pools.iter().map(|pool| self.probe_pool(pool))).await;

        let mut prices = HashMap::new();
        let mut candidates = Vec::new();
        let mut failures = 0usize;
        for (pool, probe) in pools.iter().zip(probes) {
            match probe {
                Ok(metrics) => {
                    prices.insert(format!("{}/{}", pool.token_a, pool.token_b), metrics.forward_price);
                    candidates.push(build_opportunity(pool, metrics, penalty));
                }
                Err(e) => {
                    failures += 1;
                    debug!(pool = %pool, "Pool probe skipped: {}", e);
                }
            }
        }
        self.latest_prices = prices;

        let probed = candidates.len();
        let ranked = rank_opportunities(candidates);
        info!(
            "🔍 Scanned {} pools: {} probed, {} failed, {} above floor (penalty {:.2})",
            pools.len(),
            probed,
            failures,
            ranked.len(),
            penalty
        );
        Ok(ranked)
    }

    async fn probe_pool(&self, pool: &PoolPair) -> EngineResult<PoolMetrics> {
        let gateway = self.gateway.as_ref();
        let (forward, reverse) = tokio::join!(
            quote_amount(gateway, &pool.token_a, &pool.token_b, self.probe_amount, pool.fee_tier),
            quote_amount(gateway, &pool.token_b, &pool.token_a, self.probe_amount, pool.fee_tier),
        );
        let (forward_out, reverse_out) = (forward?, reverse?);

        pool_metrics(self.probe_amount, forward_out, reverse_out).ok_or_else(|| EngineError::Quote {
            token_in: pool.token_a.clone(),
            token_out: pool.token_b.clone(),
            fee_tier: pool.fee_tier,
            source: anyhow::anyhow!("degenerate probe amounts"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::ScriptedGateway;
    use rust_decimal_macros::dec;

    /// Forward and reverse fixed outputs for a probe of 5; reverse 5.5 is +1000 bps.
    fn profitable(gateway: ScriptedGateway, a: &str, b: &str, reverse_out: Decimal) -> ScriptedGateway {
        gateway
            .with_fixed(a, b, 3000, dec!(500))
            .with_fixed(b, a, 3000, reverse_out)
    }

    #[tokio::test]
    async fn ranks_top_five_and_skips_failed_pools() {
        let mut gateway = ScriptedGateway::new();
        let mut pools = Vec::new();
        for (i, token) in ["A", "B", "C", "D", "E", "F", "G"].iter().enumerate() {
            gateway = profitable(gateway, "USD", token, dec!(5.1) + Decimal::from(i as u32) / dec!(10));
            pools.push(PoolPair::new("USD", *token, 3000));
        }
        // No reverse liquidity on this one.
        gateway = gateway.with_fixed("USD", "DEAD", 3000, dec!(5));
        pools.push(PoolPair::new("USD", "DEAD", 3000));

        let mut scanner = OpportunityScanner::new(Arc::new(gateway), dec!(5), IntervalGate::from_secs(30));
        let ranked = scanner.scan(&pools).await.unwrap();

        assert_eq!(ranked.len(), crate::scanner::MAX_OPPORTUNITIES);
        assert!(ranked
            .windows(2)
            .all(|w| w[0].risk_adjusted_score >= w[1].risk_adjusted_score));
        assert_eq!(ranked[0].pool.token_b, "G");
        assert!(ranked.iter().all(|o| o.pool.token_b != "DEAD"));
        assert_eq!(scanner.latest_prices().len(), 7);
        assert_eq!(scanner.latest_prices()["USD/A"], dec!(100));
    }

    #[tokio::test]
    async fn second_scan_inside_interval_is_empty() {
        let gateway = profitable(ScriptedGateway::new(), "USD", "X", dec!(5.5));
        let pools = vec![PoolPair::new("USD", "X", 3000)];
        let mut scanner = OpportunityScanner::new(Arc::new(gateway), dec!(5), IntervalGate::from_secs(30));

        assert_eq!(scanner.scan(&pools).await.unwrap().len(), 1);
        assert!(scanner.scan(&pools).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn quotes_forward_and_reverse_with_the_probe_amount() {
        let gateway = Arc::new(profitable(ScriptedGateway::new(), "USD", "X", dec!(5.5)));
        let mut scanner = OpportunityScanner::new(gateway.clone(), dec!(5), IntervalGate::from_secs(0));
        scanner.scan(&[PoolPair::new("USD", "X", 3000)]).await.unwrap();

        let log = gateway.quote_log();
        assert_eq!(log.len(), 2);
        assert!(log.iter().all(|q| q.amount_in == dec!(5)));
        assert!(log.iter().any(|q| q.token_in == "X" && q.token_out == "USD"));
    }

    #[tokio::test]
    async fn empty_universe_is_a_configuration_error() {
        let mut scanner = OpportunityScanner::new(
            Arc::new(ScriptedGateway::new()),
            dec!(5),
            IntervalGate::from_secs(30),
        );
        assert!(matches!(scanner.scan(&[]).await, Err(EngineError::Config { .. })));
    }
}
