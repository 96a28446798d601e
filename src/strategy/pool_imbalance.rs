//! Single-pool imbalance strategy: scan, filter, manage positions

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info};
use crate::{
    config::Config,
    errors::EngineResult,
    execution::TradeExecutor,
    filter::GuidanceFilter,
    positions::{PositionManager, PositionSettings},
    risk::{RiskNotifier, RiskOverlay},
    scanner::OpportunityScanner,
    schedule::IntervalGate,
    types::{MarketConditions, TradeResult},
};
use super::{AdvisoryPoller, Strategy};

pub struct PoolImbalanceStrategy {
    config: Arc<Config>,
    scanner: OpportunityScanner,
    filter: GuidanceFilter,
    positions: PositionManager,
    advisory: AdvisoryPoller,
}

impl PoolImbalanceStrategy {
    pub const NAME: &'static str = "pool-imbalance";

    pub fn new(
        config: Arc<Config>,
        executor: Arc<TradeExecutor>,
        risk: Arc<dyn RiskOverlay>,
        notifier: RiskNotifier,
        advisory: AdvisoryPoller,
    ) -> Self {
        let scanner = OpportunityScanner::new(
            executor.gateway().clone(),
            config.probe_amount,
            IntervalGate::from_secs(config.scan_interval_secs),
        );
        let filter = GuidanceFilter::new(config.pools.clone(), config.bridge_tokens.clone());
        let positions = PositionManager::new(
            Self::NAME,
            PositionSettings::from(config.as_ref()),
            executor,
            risk,
            notifier,
        );

        Self {
            config,
            scanner,
            filter,
            positions,
            advisory,
        }
    }

    pub fn positions(&self) -> &PositionManager {
        &self.positions
    }

    /// Guidance, cross-venue, scan, filter, monitor/close, then open. Closing always happens
    /// before new entries are taken.
    async fn try_cycle(&mut self) -> EngineResult<TradeResult> {
        let guidance = self.advisory.refresh_guidance(&self.config.pools).await;
        let cross_venue = self
            .advisory
            .refresh_cross_venue(self.scanner.latest_prices())
            .await
            .to_vec();

        let scanned = self.scanner.scan(&self.config.pools).await?;
        let scanned_count = scanned.len();
        let candidates = self
            .filter
            .filter(scanned, &self.positions, guidance.as_ref())
            .await;

        let report = self.positions.monitor_positions().await;

        let opened = if self.positions.remaining_capacity() > 0 && !candidates.is_empty() {
            self.positions.open_positions(&candidates).await
        } else {
            Vec::new()
        };

        let unrealized = self.positions.unrealized_pnl().await;
        let invested: Decimal = opened.iter().map(|p| p.invested).sum();
        let profit = report.realized_profit() + unrealized;
        let volume = invested + report.volume();

        let stranded: Vec<_> = self
            .positions
            .stranded()
            .into_iter()
            .map(|p| json!({ "id": p.id, "pair": p.key.to_string(), "holding": p.received, "token": p.token_out }))
            .collect();
        if !stranded.is_empty() {
            error!("🚨 {} position(s) awaiting manual reconciliation", stranded.len());
        }

        let descriptor = json!({
            "strategy": Self::NAME,
            "guidance": guidance.map(|g| g.to_string()),
            "scanned": scanned_count,
            "candidates": candidates.len(),
            "opened": opened
                .iter()
                .map(|p| json!({ "pair": p.key.to_string(), "invested": p.invested, "received": p.received }))
                .collect::<Vec<_>>(),
            "closed": report
                .closed
                .iter()
                .chain(report.reconciled.iter())
                .map(|c| json!({
                    "pair": c.position.key.to_string(),
                    "reason": c.reason.to_string(),
                    "success": c.success,
                    "profit": c.realized_profit,
                    "error": c.error,
                }))
                .collect::<Vec<_>>(),
            "open_positions": self.positions.open_count(),
            "unreconciled": report.unreconciled,
            "stranded": stranded,
            "realized_pnl": report.realized_profit(),
            "unrealized_pnl": unrealized,
            "cross_venue": cross_venue,
        });

        info!(
            strategy = Self::NAME,
            opened = opened.len(),
            closed = report.closed.len(),
            open = self.positions.open_count(),
            profit = %profit,
            "Cycle complete"
        );

        Ok(TradeResult::completed(Self::NAME, profit, volume, descriptor.to_string()).with_unrealized(unrealized))
    }
}

#[async_trait]
impl Strategy for PoolImbalanceStrategy {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn should_activate(&self, conditions: &MarketConditions) -> bool {
        self.config.pool_activation.is_met(conditions)
    }

    async fn run_cycle(&mut self) -> TradeResult {
        match self.try_cycle().await {
            Ok(result) => result,
            Err(e) => {
                error!(strategy = Self::NAME, "Cycle failed: {}", e);
                TradeResult::failed(
                    Self::NAME,
                    json!({ "strategy": Self::NAME }).to_string(),
                    e.to_string(),
                )
            }
        }
    }
}
