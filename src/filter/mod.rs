//! Guidance-aware re-scoring of scanned opportunities

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashSet;
use tracing::{debug, info};
use crate::{
    positions::PositionManager,
    types::{sort_by_score, PoolKey, PoolOpportunity, PoolPair, RegimeLabel},
};

pub const ARBITRAGE_BOOST: Decimal = dec!(1.3);
pub const TREND_BOOST: Decimal = dec!(1.2);
pub const TRIANGULAR_BOOST: Decimal = dec!(1.4);

const ARBITRAGE_MIN_IMBALANCE_BPS: Decimal = dec!(50);
const TREND_MIN_DEPTH: Decimal = dec!(20);
const TREND_MAX_IMBALANCE_BPS: Decimal = dec!(30);

pub struct GuidanceFilter {
    pools: Vec<PoolPair>,
    bridge_tokens: Vec<String>,
}

impl GuidanceFilter {
    pub fn new(pools: Vec<PoolPair>, bridge_tokens: Vec<String>) -> Self {
        Self { pools, bridge_tokens }
    }

    /// Drops pairs the manager is already losing on, then applies the regime rules.
    pub async fn filter(
        &self,
        opportunities: Vec<PoolOpportunity>,
        positions: &PositionManager,
        guidance: Option<&RegimeLabel>,
    ) -> Vec<PoolOpportunity> {
        let losing = positions.losing_pairs().await;
        self.apply_guidance(opportunities, &losing, guidance)
    }

    pub fn apply_guidance(
        &self,
        opportunities: Vec<PoolOpportunity>,
        excluded: &HashSet<PoolKey>,
        guidance: Option<&RegimeLabel>,
    ) -> Vec<PoolOpportunity> {
        let mut kept: Vec<PoolOpportunity> = opportunities
            .into_iter()
            .filter(|opp| !excluded.contains(&opp.key()))
            .collect();

        let Some(label) = guidance else {
            return kept;
        };
        if label.blocks_entries() {
            info!("⏸️  Guidance '{}' blocks new entries", label);
            return Vec::new();
        }

        for opp in kept.iter_mut() {
            let boost = self.boost_for(label, opp);
            if boost != Decimal::ONE {
                debug!(pair = %opp.pool, boost = %boost, "Score boosted by guidance");
                opp.risk_adjusted_score *= boost;
            }
        }

        sort_by_score(&mut kept);
        let keep = (kept.len() * 4 + 4) / 5;
        kept.truncate(keep);
        kept
    }

    fn boost_for(&self, label: &RegimeLabel, opp: &PoolOpportunity) -> Decimal {
        match label {
            RegimeLabel::ArbitrageFavorable if opp.imbalance_bps > ARBITRAGE_MIN_IMBALANCE_BPS => ARBITRAGE_BOOST,
            RegimeLabel::TrendFavorable
                if opp.liquidity_depth > TREND_MIN_DEPTH && opp.imbalance_bps < TREND_MAX_IMBALANCE_BPS =>
            {
                TREND_BOOST
            }
            RegimeLabel::TriangularFavorable if self.has_bridge(opp.token_in(), opp.token_out()) => TRIANGULAR_BOOST,
            _ => Decimal::ONE,
        }
    }

    /// Some bridge token has a pool to each side of the pair.
    fn has_bridge(&self, a: &str, b: &str) -> bool {
        self.bridge_tokens
            .iter()
            .filter(|t| t.as_str() != a && t.as_str() != b)
            .any(|t| {
                self.pools.iter().any(|p| p.connects(a, t)) && self.pools.iter().any(|p| p.connects(t, b))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::execution::TradeExecutor;
    use crate::gateway::ScriptedGateway;
    use crate::positions::PositionSettings;
    use crate::risk::{LimitsRiskOverlay, RiskNotifier, RiskOverlay};
    use chrono::Utc;
    use std::sync::Arc;

    fn opp(a: &str, b: &str, score: Decimal, imbalance: Decimal, depth: Decimal) -> PoolOpportunity {
        PoolOpportunity {
            pool: PoolPair::new(a, b, 3000),
            forward_price: dec!(1),
            reverse_price: dec!(1),
            imbalance_bps: imbalance,
            expected_profit: dec!(0.05),
            profit_bps: dec!(100),
            liquidity_depth: depth,
            discovered_at: Utc::now(),
            risk_adjusted_score: score,
        }
    }

    fn filter() -> GuidanceFilter {
        GuidanceFilter::new(
            vec![
                PoolPair::new("WETH", "USDC", 3000),
                PoolPair::new("WETH", "DAI", 3000),
                PoolPair::new("USDC", "DAI", 500),
                PoolPair::new("ARB", "USDC", 3000),
            ],
            vec!["WETH".to_string(), "USDC".to_string()],
        )
    }

    fn sample() -> Vec<PoolOpportunity> {
        vec![
            opp("WETH", "USDC", dec!(20), dec!(60), dec!(5)),
            opp("USDC", "DAI", dec!(18), dec!(10), dec!(40)),
            opp("ARB", "USDC", dec!(16), dec!(20), dec!(5)),
            opp("WETH", "DAI", dec!(12), dec!(70), dec!(30)),
            opp("DAI", "ARB", dec!(6), dec!(5), dec!(1)),
        ]
    }

    #[test]
    fn no_guidance_only_excludes() {
        let excluded = HashSet::from([PoolKey::new("USDC", "WETH")]);
        let out = filter().apply_guidance(sample(), &excluded, None);
        assert_eq!(out.len(), 4);
        assert!(out.iter().all(|o| !o.key().matches("WETH", "USDC")));
    }

    #[test]
    fn blocking_labels_empty_the_list() {
        for label in [RegimeLabel::Avoid, RegimeLabel::Hold] {
            assert!(filter().apply_guidance(sample(), &HashSet::new(), Some(&label)).is_empty());
        }
    }

    #[test]
    fn arbitrage_regime_boosts_imbalanced_pools() {
        let out = filter().apply_guidance(sample(), &HashSet::new(), Some(&RegimeLabel::ArbitrageFavorable));
        assert_eq!(out.len(), 4);
        assert_eq!(out[0].risk_adjusted_score, dec!(26.0));
        assert_eq!(out[3].risk_adjusted_score, dec!(15.6));
        assert!(out.iter().all(|o| !o.key().matches("DAI", "ARB")));
    }

    #[test]
    fn trend_regime_needs_depth_and_balance() {
        let out = filter().apply_guidance(sample(), &HashSet::new(), Some(&RegimeLabel::TrendFavorable));
        assert_eq!(out[0].pool.token_b, "DAI");
        assert_eq!(out[0].risk_adjusted_score, dec!(21.6));
        let weth_dai = out.iter().find(|o| o.key().matches("WETH", "DAI")).unwrap();
        assert_eq!(weth_dai.risk_adjusted_score, dec!(12));
    }

    #[test]
    fn triangular_regime_requires_bridge_coverage() {
        let out = filter().apply_guidance(sample(), &HashSet::new(), Some(&RegimeLabel::TriangularFavorable));
        // WETH/USDC has no third-token bridge; USDC/DAI bridges through WETH; WETH/DAI through USDC.
        let score = |a: &str, b: &str| {
            out.iter()
                .find(|o| o.key().matches(a, b))
                .map(|o| o.risk_adjusted_score)
        };
        assert_eq!(score("WETH", "USDC"), Some(dec!(20)));
        assert_eq!(score("USDC", "DAI"), Some(dec!(25.2)));
        assert_eq!(score("WETH", "DAI"), Some(dec!(16.8)));
        assert_eq!(score("ARB", "USDC"), Some(dec!(16)));
        assert_eq!(out.len(), 4);
    }

    #[tokio::test]
    async fn losing_position_excludes_both_orderings() {
        let gateway = Arc::new(
            ScriptedGateway::new()
                .with_fixed("USDC", "WETH", 3000, dec!(0.01))
                .with_fixed("WETH", "USDC", 3000, dec!(4.97)),
        );
        let executor = Arc::new(TradeExecutor::new(gateway, false, "0xabc"));
        let risk: Arc<dyn RiskOverlay> = Arc::new(LimitsRiskOverlay::new(dec!(100), 500, dec!(1000)));
        let config = Config::default();
        let mut manager = PositionManager::new(
            "pool-imbalance",
            PositionSettings::from(&config),
            executor,
            risk,
            RiskNotifier::disconnected(),
        );
        let opened = manager
            .open_positions(&[opp("USDC", "WETH", dec!(20), dec!(60), dec!(5))])
            .await;
        assert_eq!(opened.len(), 1);

        let position = opened[0].clone();
        let valuation = manager.value_position(&position).await;
        assert!(valuation.quoted);
        assert_eq!(valuation.profit_bps, dec!(-60));

        let out = filter()
            .filter(
                vec![
                    opp("USDC", "WETH", dec!(20), dec!(60), dec!(5)),
                    opp("WETH", "USDC", dec!(19), dec!(60), dec!(5)),
                    opp("USDC", "DAI", dec!(18), dec!(10), dec!(40)),
                ],
                &manager,
                None,
            )
            .await;
        assert_eq!(out.len(), 1);
        assert!(out[0].key().matches("USDC", "DAI"));
    }

    #[test]
    fn keeps_the_ceiling_of_eighty_percent() {
        let f = filter();
        let label = RegimeLabel::Other("neutral".to_string());
        for (n, expected) in [(0, 0), (1, 1), (2, 2), (3, 3), (4, 4), (5, 4), (6, 5), (10, 8)] {
            let input: Vec<_> = (0..n)
                .map(|i| opp("A", &format!("T{i}"), Decimal::from(10 + i), dec!(0), dec!(0)))
                .collect();
            assert_eq!(f.apply_guidance(input, &HashSet::new(), Some(&label)).len(), expected);
        }
    }
}
