//! Best-fee-tier path analysis over configured token cycles

use chrono::Utc;
use futures::future::join_all;
use rust_decimal::prelude::*;
use std::sync::Arc;
use tracing::{debug, info, warn};
use crate::{
    config::{validate_cycle, Config},
    errors::{EngineError, EngineResult},
    gateway::{quote_amount, SwapGateway},
    types::{ArbitragePath, PathHop},
    utils::fee_tier_rate,
};

#[derive(Debug, Clone)]
pub struct PathSettings {
    pub cycles: Vec<Vec<String>>,
    pub fee_tiers: Vec<u32>,
    pub trade_size: Decimal,
    pub min_profit_bps: u32,
    pub slippage_bps: u32,
}

impl From<&Config> for PathSettings {
    fn from(config: &Config) -> Self {
        Self {
            cycles: config.triangular_cycles.clone(),
            fee_tiers: config.fee_tiers.clone(),
            trade_size: config.triangular_trade_size,
            min_profit_bps: config.min_profit_bps,
            slippage_bps: config.path_slippage_bps,
        }
    }
}

pub struct PathAnalyzer {
    gateway: Arc<dyn SwapGateway>,
    settings: PathSettings,
}

impl PathAnalyzer {
    pub fn new(gateway: Arc<dyn SwapGateway>, settings: PathSettings) -> Self {
        Self { gateway, settings }
    }

    pub fn settings(&self) -> &PathSettings {
        &self.settings
    }

    pub async fn analyze(&self, tokens: &[String]) -> EngineResult<ArbitragePath> {
        self.analyze_sized(tokens, self.settings.trade_size).await
    }

    /// Walks the cycle hop by hop. Each hop probes every fee tier concurrently and keeps the
    /// tier with the largest output, which becomes the exact input of the next hop.
    pub async fn analyze_sized(&self, tokens: &[String], trade_size: Decimal) -> EngineResult<ArbitragePath> {
        validate_cycle(tokens)?;
        if trade_size <= Decimal::ZERO {
            return Err(EngineError::InvalidPath {
                route: tokens.join(" → "),
                reason: format!("trade size {} is not positive", trade_size),
            });
        }

        let mut hops = Vec::with_capacity(tokens.len() - 1);
        let mut amount = trade_size;
        let mut fee_estimate = Decimal::ZERO;
        let mut successes = 0usize;

        for (index, leg) in tokens.windows(2).enumerate() {
            let (token_in, token_out) = (&leg[0], &leg[1]);
            let (fee_tier, quoted_out, quoted) = self.best_tier(index, token_in, token_out, amount).await?;
            successes += quoted;
            fee_estimate += amount * fee_tier_rate(fee_tier);
            hops.push(PathHop {
                token_in: token_in.clone(),
                token_out: token_out.clone(),
                fee_tier,
                amount_in: amount,
                quoted_out,
            });
            amount = quoted_out;
        }

        let probes = hops.len() * self.settings.fee_tiers.len();
        let confidence = if probes == 0 {
            Decimal::ZERO
        } else {
            Decimal::from(successes) / Decimal::from(probes)
        };

        let path = ArbitragePath {
            tokens: tokens.to_vec(),
            hops,
            trade_size,
            final_amount: amount,
            expected_profit: amount - trade_size,
            fee_estimate,
            confidence,
            analyzed_at: Utc::now(),
        };
        debug!(
            route = %path.route(),
            profit = %path.expected_profit,
            profit_bps = %path.profit_bps().round_dp(2),
            "Path analyzed"
        );
        Ok(path)
    }

    /// Returns (fee tier, output, number of tiers that quoted).
    async fn best_tier(
        &self,
        hop: usize,
        token_in: &str,
        token_out: &str,
        amount_in: Decimal,
    ) -> EngineResult<(u32, Decimal, usize)> {
        let gateway = self.gateway.as_ref();
        let quotes = join_all(self.settings.fee_tiers.iter().map(|&tier| async move {
            (tier, quote_amount(gateway, token_in, token_out, amount_in, tier).await)
        }))
        .await;

        let successful: Vec<(u32, Decimal)> = quotes
            .into_iter()
            .filter_map(|(tier, quote)| quote.ok().map(|out| (tier, out)))
            .collect();

        successful
            .iter()
            .copied()
            .max_by(|a, b| a.1.cmp(&b.1))
            .map(|(tier, out)| (tier, out, successful.len()))
            .ok_or_else(|| EngineError::PathStepFailed {
                hop,
                token_in: token_in.to_string(),
                token_out: token_out.to_string(),
            })
    }

    /// Evaluates every configured cycle; a failing cycle never blocks the others. Returns the
    /// most profitable path that clears the profit floor.
    pub async fn find_best_path(&self) -> Option<ArbitragePath> {
        let results = join_all(self.settings.cycles.iter().map(|cycle| self.analyze(cycle))).await;

        let mut best: Option<ArbitragePath> = None;
        for (cycle, result) in self.settings.cycles.iter().zip(results) {
            match result {
                Ok(path) if path.profit_bps() >= Decimal::from(self.settings.min_profit_bps) => {
                    if best.as_ref().is_none_or(|b| path.expected_profit > b.expected_profit) {
                        best = Some(path);
                    }
                }
                Ok(path) => {
                    debug!(
                        route = %path.route(),
                        "Path below floor: {:.2} bps < {} bps",
                        path.profit_bps(),
                        self.settings.min_profit_bps
                    );
                }
                Err(e) => {
                    warn!("Path {} currently unusable: {}", cycle.join(" → "), e);
                }
            }
        }

        if let Some(path) = &best {
            info!(
                "🔺 Best path {} | profit {:.6} ({:.2} bps) | confidence {:.2}",
                path.route(),
                path.expected_profit,
                path.profit_bps(),
                path.confidence
            );
        }
        best
    }
}
