//! Triangular path strategy

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info, warn};
use crate::{
    config::Config,
    errors::{EngineError, EngineResult},
    execution::TradeExecutor,
    paths::{PathAnalyzer, PathSettings},
    risk::{RiskOverlay, RiskRequest},
    types::{MarketConditions, TradeResult},
};
use super::{AdvisoryPoller, Strategy};

pub struct TriangularStrategy {
    config: Arc<Config>,
    analyzer: PathAnalyzer,
    executor: Arc<TradeExecutor>,
    risk: Arc<dyn RiskOverlay>,
    advisory: AdvisoryPoller,
}

impl TriangularStrategy {
    pub const NAME: &'static str = "triangular";

    pub fn new(
        config: Arc<Config>,
        executor: Arc<TradeExecutor>,
        risk: Arc<dyn RiskOverlay>,
        advisory: AdvisoryPoller,
    ) -> Self {
        let analyzer = PathAnalyzer::new(executor.gateway().clone(), PathSettings::from(config.as_ref()));
        Self {
            config,
            analyzer,
            executor,
            risk,
            advisory,
        }
    }

    fn idle(&self, reason: &str) -> TradeResult {
        TradeResult::completed(
            Self::NAME,
            Decimal::ZERO,
            Decimal::ZERO,
            json!({ "strategy": Self::NAME, "idle": reason }).to_string(),
        )
    }

    async fn try_cycle(&mut self) -> EngineResult<TradeResult> {
        let guidance = self.advisory.refresh_guidance(&self.config.pools).await;
        if guidance.as_ref().is_some_and(|g| g.blocks_entries()) {
            return Ok(self.idle("guidance blocks entries"));
        }

        let Some(mut path) = self.analyzer.find_best_path().await else {
            return Ok(self.idle("no path clears the profit floor"));
        };

        let settings = self.analyzer.settings();
        let request = RiskRequest {
            strategy: Self::NAME.to_string(),
            token_in: path.tokens[0].clone(),
            token_out: path.tokens[1].clone(),
            amount: path.trade_size,
            slippage_bps: settings.slippage_bps,
        };
        let decision = match self.risk.check_trade_allowed(&request).await {
            Ok(decision) => decision,
            Err(e) => {
                warn!("Risk check failed for {}: {}", path.route(), e);
                return Ok(self.idle("risk check unavailable"));
            }
        };
        if !decision.allowed {
            info!("Path {} denied by risk overlay: {}", path.route(), decision.reason.unwrap_or_default());
            return Ok(self.idle("denied by risk overlay"));
        }
        if let Some(amount) = decision.adjusted_amount.filter(|a| *a != path.trade_size) {
            path = match self.analyzer.analyze_sized(&path.tokens, amount).await {
                Ok(resized) => resized,
                Err(e) if e.is_path_unusable() => {
                    info!("Path {} unusable at size {}: {}", path.route(), amount, e);
                    return Ok(self.idle("path unusable after resize"));
                }
                Err(e) => return Err(e),
            };
        }

        let execution = match self.analyzer.execute_path(&path, &self.executor).await {
            Ok(execution) => execution,
            Err(e) if e.is_path_unusable() => {
                info!("Path {} skipped: {}", path.route(), e);
                return Ok(self.idle("path no longer clears the profit floor"));
            }
            Err(e) => return Err(e),
        };
        let descriptor = json!({
            "strategy": Self::NAME,
            "guidance": guidance.map(|g| g.to_string()),
            "dry_run": self.executor.is_dry_run(),
            "path": path,
            "execution": execution,
        })
        .to_string();

        if !execution.completed {
            let failed_hop = execution.failed_hop.unwrap_or_default();
            let hop = path.hops.get(failed_hop);
            let error = EngineError::Swap {
                token_in: hop.map(|h| h.token_in.clone()).unwrap_or_default(),
                token_out: hop.map(|h| h.token_out.clone()).unwrap_or_default(),
                message: format!(
                    "path {} aborted at hop {}: {}",
                    execution.route,
                    failed_hop,
                    execution.error.as_deref().unwrap_or("unknown")
                ),
            };
            let mut result = TradeResult::failed(Self::NAME, descriptor, error.to_string());
            result.volume = execution.volume();
            return Ok(result);
        }

        Ok(TradeResult::completed(
            Self::NAME,
            execution.realized_profit().unwrap_or_default(),
            execution.volume(),
            descriptor,
        ))
    }
}

#[async_trait]
impl Strategy for TriangularStrategy {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn should_activate(&self, conditions: &MarketConditions) -> bool {
        self.config.triangular_activation.is_met(conditions)
    }

    async fn run_cycle(&mut self) -> TradeResult {
        match self.try_cycle().await {
            Ok(result) => result,
            Err(e) => {
                error!(strategy = Self::NAME, "Cycle failed: {}", e);
                TradeResult::failed(Self::NAME, json!({ "strategy": Self::NAME }).to_string(), e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::CircuitBreaker;
    use crate::gateway::{Quote, QuoteRequest, ScriptedGateway, SwapGateway, SwapOutcome, SwapRequest};
    use crate::risk::LimitsRiskOverlay;
    use rust_decimal_macros::dec;

    fn config(min_profit_bps: u32) -> Arc<Config> {
        Arc::new(Config {
            triangular_cycles: vec![["USD", "X", "Y", "USD"].iter().map(|t| t.to_string()).collect()],
            fee_tiers: vec![3000],
            triangular_trade_size: dec!(15),
            min_profit_bps,
            ..Config::default()
        })
    }

    fn gateway() -> Arc<ScriptedGateway> {
        Arc::new(
            ScriptedGateway::new()
                .with_rate("USD", "X", 3000, dec!(1))
                .with_rate("X", "Y", 3000, dec!(1.01))
                .with_rate("Y", "USD", 3000, dec!(1)),
        )
    }

    fn strategy(gateway: Arc<ScriptedGateway>, config: Arc<Config>, max_trade: Decimal) -> TriangularStrategy {
        let executor = Arc::new(TradeExecutor::new(gateway, false, "0xabc"));
        let risk: Arc<dyn RiskOverlay> = Arc::new(LimitsRiskOverlay::new(max_trade, 500, dec!(1000)));
        let advisory = AdvisoryPoller::new(&config);
        TriangularStrategy::new(config, executor, risk, advisory)
    }

    #[tokio::test]
    async fn executes_the_best_path() {
        let gateway = gateway();
        let mut strategy = strategy(gateway.clone(), config(30), dec!(100));

        let result = strategy.run_cycle().await;
        assert!(result.success);
        assert_eq!(result.profit, dec!(0.15));
        assert_eq!(result.volume, dec!(15) + dec!(15) + dec!(15.15));
        assert_eq!(gateway.swap_log().len(), 3);
    }

    #[tokio::test]
    async fn below_floor_is_idle() {
        let gateway = gateway();
        let mut strategy = strategy(gateway.clone(), config(150), dec!(100));

        let result = strategy.run_cycle().await;
        assert!(result.success);
        assert_eq!(result.profit, Decimal::ZERO);
        assert!(gateway.swap_log().is_empty());
    }

    #[tokio::test]
    async fn clamped_size_is_reanalyzed() {
        let gateway = gateway();
        let mut strategy = strategy(gateway.clone(), config(30), dec!(10));

        let result = strategy.run_cycle().await;
        assert!(result.success);
        assert_eq!(result.profit, dec!(0.1));
        assert_eq!(gateway.swap_log()[0].amount_in, dec!(10));
    }

    /// Quotes inputs under 12 with `small_trade` applied: `None` has no route, `Some(r)`
    /// scales the output by `r`.
    struct SizeTieredGateway {
        inner: ScriptedGateway,
        small_trade: Option<Decimal>,
    }

    #[async_trait]
    impl SwapGateway for SizeTieredGateway {
        async fn quote(&self, request: &QuoteRequest) -> anyhow::Result<Quote> {
            let mut quote = self.inner.quote(request).await?;
            if request.amount_in < dec!(12) {
                let Some(haircut) = self.small_trade else {
                    anyhow::bail!("no route for {}", request.amount_in);
                };
                quote.amount_out *= haircut;
            }
            Ok(quote)
        }

        async fn swap(&self, request: &SwapRequest) -> anyhow::Result<SwapOutcome> {
            self.inner.swap(request).await
        }
    }

    fn size_tiered(small_trade: Option<Decimal>) -> Arc<SizeTieredGateway> {
        Arc::new(SizeTieredGateway {
            inner: ScriptedGateway::new()
                .with_rate("USD", "X", 3000, dec!(1))
                .with_rate("X", "Y", 3000, dec!(1.01))
                .with_rate("Y", "USD", 3000, dec!(1)),
            small_trade,
        })
    }

    fn clamped_strategy(gateway: Arc<SizeTieredGateway>, config: Arc<Config>) -> TriangularStrategy {
        let executor = Arc::new(TradeExecutor::new(gateway, false, "0xabc"));
        let risk: Arc<dyn RiskOverlay> = Arc::new(LimitsRiskOverlay::new(dec!(10), 500, dec!(1000)));
        let advisory = AdvisoryPoller::new(&config);
        TriangularStrategy::new(config, executor, risk, advisory)
    }

    #[tokio::test]
    async fn unquotable_resized_path_does_not_trip_the_breaker() {
        let gateway = size_tiered(None);
        let config = config(30);
        let mut strategy = clamped_strategy(gateway.clone(), config.clone());
        let mut breaker = CircuitBreaker::new(config.max_consecutive_failures, 60);

        for _ in 0..=config.max_consecutive_failures {
            let result = strategy.run_cycle().await;
            assert!(result.success);
            assert_eq!(result.volume, Decimal::ZERO);
            let descriptor: serde_json::Value = serde_json::from_str(&result.descriptor).unwrap();
            assert_eq!(descriptor["idle"], "path unusable after resize");
            if result.success {
                breaker.record_success();
            } else {
                breaker.record_error();
            }
        }
        assert!(breaker.can_proceed());
        assert!(gateway.inner.swap_log().is_empty());
    }

    #[tokio::test]
    async fn resized_path_below_the_floor_is_idle() {
        let gateway = size_tiered(Some(dec!(0.99)));
        let mut strategy = clamped_strategy(gateway.clone(), config(30));

        let result = strategy.run_cycle().await;
        assert!(result.success);
        let descriptor: serde_json::Value = serde_json::from_str(&result.descriptor).unwrap();
        assert_eq!(descriptor["idle"], "path no longer clears the profit floor");
        assert!(gateway.inner.swap_log().is_empty());
    }

    #[tokio::test]
    async fn partial_execution_fails_the_cycle() {
        let gateway = gateway();
        gateway.fail_swaps("Y", "USD");
        let mut strategy = strategy(gateway.clone(), config(30), dec!(100));

        let result = strategy.run_cycle().await;
        assert!(!result.success);
        assert!(result.error_message.unwrap().contains("hop 2"));
        assert_eq!(result.volume, dec!(15) + dec!(15));
        let descriptor: serde_json::Value = serde_json::from_str(&result.descriptor).unwrap();
        assert_eq!(descriptor["execution"]["executed"].as_array().map(|a| a.len()), Some(2));
    }
}
