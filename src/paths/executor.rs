//! Hop-by-hop path execution

use rust_decimal::Decimal;
use tracing::{error, info, warn};
use crate::{
    errors::{EngineError, EngineResult},
    execution::{SwapOrder, TradeExecutor},
    types::{ArbitragePath, HopExecution, PathExecution},
    utils::apply_slippage,
};
use super::PathAnalyzer;

impl PathAnalyzer {
    /// Executes an analyzed path. Refuses paths with missing hop data or that no longer clear
    /// the profit floor. Hops are not atomic: a failed hop stops the path and the hops already
    /// filled stay filled.
    pub async fn execute_path(
        &self,
        path: &ArbitragePath,
        executor: &TradeExecutor,
    ) -> EngineResult<PathExecution> {
        if !path.is_fully_populated() {
            return Err(EngineError::IncompletePath {
                route: path.route(),
                expected: path.tokens.len().saturating_sub(1),
                actual: path
                    .hops
                    .iter()
                    .filter(|hop| hop.fee_tier > 0 && hop.quoted_out > Decimal::ZERO)
                    .count(),
            });
        }

        let min_profit_bps = self.settings().min_profit_bps;
        let profit_bps = path.profit_bps();
        if profit_bps < Decimal::from(min_profit_bps) {
            return Err(EngineError::BelowProfitFloor {
                profit_bps,
                min_profit_bps,
            });
        }

        let slippage_bps = self.settings().slippage_bps;
        let mut execution = PathExecution {
            route: path.route(),
            trade_size: path.trade_size,
            executed: Vec::with_capacity(path.hops.len()),
            completed: false,
            failed_hop: None,
            error: None,
        };

        let mut amount_in = path.trade_size;
        for (index, hop) in path.hops.iter().enumerate() {
            let order = SwapOrder {
                token_in: hop.token_in.clone(),
                token_out: hop.token_out.clone(),
                amount_in,
                expected_out: hop.quoted_out,
                min_amount_out: apply_slippage(hop.quoted_out, slippage_bps),
                fee_tier: hop.fee_tier,
                slippage_bps,
            };
            let fill = executor.execute(&order).await;

            match fill.amount_out.filter(|_| fill.is_filled()) {
                Some(amount_out) => {
                    info!(
                        hop = index,
                        token_in = %hop.token_in,
                        token_out = %hop.token_out,
                        amount_in = %amount_in,
                        amount_out = %amount_out,
                        "Path hop filled"
                    );
                    execution.executed.push(HopExecution {
                        hop: index,
                        token_in: hop.token_in.clone(),
                        token_out: hop.token_out.clone(),
                        amount_in,
                        min_amount_out: order.min_amount_out,
                        amount_out,
                        transaction_id: fill.transaction_id.clone(),
                    });
                    amount_in = amount_out;
                }
                None => {
                    let message = fill
                        .error_message
                        .clone()
                        .unwrap_or_else(|| "hop not filled".to_string());
                    if index > 0 {
                        error!(
                            route = %execution.route,
                            hop = index,
                            holding = %hop.token_in,
                            amount = %amount_in,
                            "Path aborted mid-route, partial exposure left open: {}",
                            message
                        );
                    } else {
                        warn!(route = %execution.route, "Path aborted at first hop: {}", message);
                    }
                    execution.failed_hop = Some(index);
                    execution.error = Some(message);
                    return Ok(execution);
                }
            }
        }

        execution.completed = true;
        info!(
            "🔺 Path {} completed | realized {:?}",
            execution.route,
            execution.realized_profit()
        );
        Ok(execution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::ScriptedGateway;
    use crate::paths::PathSettings;
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    fn gateway() -> Arc<ScriptedGateway> {
        Arc::new(
            ScriptedGateway::new()
                .with_fixed("USD", "X", 3000, dec!(14.9))
                .with_fixed("X", "Y", 3000, dec!(15.05))
                .with_fixed("Y", "USD", 3000, dec!(15.2)),
        )
    }

    fn analyzer(gateway: Arc<ScriptedGateway>, min_profit_bps: u32) -> PathAnalyzer {
        PathAnalyzer::new(
            gateway,
            PathSettings {
                cycles: vec![],
                fee_tiers: vec![3000],
                trade_size: dec!(15),
                min_profit_bps,
                slippage_bps: 50,
            },
        )
    }

    fn route() -> Vec<String> {
        ["USD", "X", "Y", "USD"].iter().map(|t| t.to_string()).collect()
    }

    #[tokio::test]
    async fn executes_every_hop_with_slippage_floor() {
        let gateway = gateway();
        let analyzer = analyzer(gateway.clone(), 30);
        let path = analyzer.analyze(&route()).await.unwrap();
        let executor = TradeExecutor::new(gateway.clone(), false, "0xabc");

        let execution = analyzer.execute_path(&path, &executor).await.unwrap();
        assert!(execution.completed);
        assert_eq!(execution.realized_profit(), Some(dec!(0.2)));

        let swaps = gateway.swap_log();
        assert_eq!(swaps.len(), 3);
        assert_eq!(swaps[1].amount_in, dec!(14.9));
        assert_eq!(swaps[2].min_amount_out, dec!(15.2) * dec!(0.995));
    }

    #[tokio::test]
    async fn hop_failure_aborts_remaining_hops() {
        let gateway = gateway();
        gateway.fail_swaps("X", "Y");
        let analyzer = analyzer(gateway.clone(), 30);
        let path = analyzer.analyze(&route()).await.unwrap();
        let executor = TradeExecutor::new(gateway.clone(), false, "0xabc");

        let execution = analyzer.execute_path(&path, &executor).await.unwrap();
        assert!(!execution.completed);
        assert_eq!(execution.failed_hop, Some(1));
        assert_eq!(execution.executed.len(), 1);
        assert_eq!(execution.realized_profit(), None);
        assert_eq!(gateway.swap_log().len(), 2);
    }

    #[tokio::test]
    async fn refuses_incomplete_paths() {
        let gateway = gateway();
        let analyzer = analyzer(gateway.clone(), 30);
        let mut path = analyzer.analyze(&route()).await.unwrap();
        path.hops.pop();
        let executor = TradeExecutor::new(gateway.clone(), false, "0xabc");

        let result = analyzer.execute_path(&path, &executor).await;
        assert!(matches!(
            result,
            Err(EngineError::IncompletePath { expected: 3, actual: 2, .. })
        ));
        assert!(gateway.swap_log().is_empty());
    }

    #[tokio::test]
    async fn rechecks_the_floor_before_the_first_hop() {
        let gateway = gateway();
        let lenient = analyzer(gateway.clone(), 30);
        let path = lenient.analyze(&route()).await.unwrap();

        let strict = analyzer(gateway.clone(), 500);
        let executor = TradeExecutor::new(gateway.clone(), false, "0xabc");
        let result = strict.execute_path(&path, &executor).await;
        assert!(matches!(result, Err(EngineError::BelowProfitFloor { min_profit_bps: 500, .. })));
        assert!(gateway.swap_log().is_empty());
    }
}
