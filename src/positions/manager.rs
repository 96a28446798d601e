//! Position manager: entries, monitoring, closes and unreconciled retries

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use crate::{
    config::Config,
    execution::{SwapOrder, TradeExecutor},
    gateway::quote_amount,
    risk::{PositionDelta, RiskNotifier, RiskOverlay, RiskRequest},
    types::{
        ClosedPosition, CloseReason, MonitorReport, PoolKey, PoolOpportunity, Position, PositionState,
        Valuation,
    },
    utils::{apply_slippage, bps_fraction},
};
use super::exit::{evaluate_exit, fallback_valuation, is_losing, quoted_valuation};

#[derive(Debug, Clone)]
pub struct PositionSettings {
    pub position_size: Decimal,
    pub max_positions: usize,
    pub target_profit_bps: u32,
    pub stop_loss_bps: u32,
    pub max_hold: Duration,
    pub entry_slippage_bps: u32,
    pub exit_slippage_bps: u32,
    pub max_close_retries: u32,
}

impl From<&Config> for PositionSettings {
    fn from(config: &Config) -> Self {
        Self {
            position_size: config.position_size,
            max_positions: config.max_positions,
            target_profit_bps: config.target_profit_bps,
            stop_loss_bps: config.stop_loss_bps,
            max_hold: Duration::seconds(config.max_hold_secs as i64),
            entry_slippage_bps: config.entry_slippage_bps,
            exit_slippage_bps: config.exit_slippage_bps,
            max_close_retries: config.max_close_retries,
        }
    }
}

struct PendingClose {
    position: Position,
    reason: CloseReason,
}

/// Owns the live position set of one strategy. At most one live position per pool pair,
/// whichever direction it was entered in.
pub struct PositionManager {
    strategy: String,
    settings: PositionSettings,
    executor: Arc<TradeExecutor>,
    risk: Arc<dyn RiskOverlay>,
    notifier: RiskNotifier,
    positions: HashMap<PoolKey, Position>,
    unreconciled: HashMap<String, PendingClose>,
}

impl PositionManager {
    pub fn new(
        strategy: impl Into<String>,
        settings: PositionSettings,
        executor: Arc<TradeExecutor>,
        risk: Arc<dyn RiskOverlay>,
        notifier: RiskNotifier,
    ) -> Self {
        Self {
            strategy: strategy.into(),
            settings,
            executor,
            risk,
            notifier,
            positions: HashMap::new(),
            unreconciled: HashMap::new(),
        }
    }

    pub fn settings(&self) -> &PositionSettings {
        &self.settings
    }

    pub fn open_count(&self) -> usize {
        self.positions.len()
    }

    pub fn remaining_capacity(&self) -> usize {
        self.settings.max_positions.saturating_sub(self.positions.len())
    }

    pub fn positions(&self) -> impl Iterator<Item = &Position> {
        self.positions.values()
    }

    pub fn unreconciled(&self) -> impl Iterator<Item = &Position> {
        self.unreconciled.values().map(|pending| &pending.position)
    }

    /// Unreconciled positions whose retry budget is spent and need manual handling.
    pub fn stranded(&self) -> Vec<&Position> {
        self.unreconciled()
            .filter(|p| p.close_attempts > self.settings.max_close_retries)
            .collect()
    }

    /// Marks `position` to market by quoting its exact held quantity back into the entry token.
    pub async fn value_position(&self, position: &Position) -> Valuation {
        match quote_amount(
            self.executor.gateway().as_ref(),
            &position.token_out,
            &position.token_in,
            position.received,
            position.fee_tier,
        )
        .await
        {
            Ok(value) => quoted_valuation(position.invested, value),
            Err(e) => {
                warn!(position = %position.id, pair = %position.key, "Valuation failed, assuming 1% loss: {}", e);
                fallback_valuation(position.invested)
            }
        }
    }

    /// Pairs whose open position is losing more than 0.5% or cannot be valued.
    pub async fn losing_pairs(&self) -> HashSet<PoolKey> {
        let mut losing = HashSet::new();
        for position in self.positions.values() {
            let valuation = self.value_position(position).await;
            if is_losing(&valuation) {
                debug!(pair = %position.key, profit_bps = %valuation.profit_bps, "Pair excluded from entries");
                losing.insert(position.key.clone());
            }
        }
        losing
    }

    pub async fn unrealized_pnl(&self) -> Decimal {
        let mut total = Decimal::ZERO;
        for position in self.positions.values() {
            total += self.value_position(position).await.profit;
        }
        total
    }

    /// Opens positions on `candidates` in ranked order while capacity remains. Candidates that
    /// are denied by risk, cannot be quoted or fail to fill are skipped.
    pub async fn open_positions(&mut self, candidates: &[PoolOpportunity]) -> Vec<Position> {
        let mut opened = Vec::new();

        for opportunity in candidates {
            if self.positions.len() >= self.settings.max_positions {
                debug!("Position capacity {} reached", self.settings.max_positions);
                break;
            }
            if let Some(position) = self.open_position(opportunity).await {
                opened.push(position);
            }
        }
        opened
    }

    async fn open_position(&mut self, opportunity: &PoolOpportunity) -> Option<Position> {
        let token_in = opportunity.token_in();
        let token_out = opportunity.token_out();
        let fee_tier = opportunity.pool.fee_tier;
        let entry_slippage = self.settings.entry_slippage_bps;

        let request = RiskRequest {
            strategy: self.strategy.clone(),
            token_in: token_in.to_string(),
            token_out: token_out.to_string(),
            amount: self.settings.position_size,
            slippage_bps: entry_slippage,
        };
        let amount = match self.risk.check_trade_allowed(&request).await {
            Ok(decision) if decision.allowed => decision.adjusted_amount.unwrap_or(self.settings.position_size),
            Ok(decision) => {
                info!(
                    pair = %opportunity.pool,
                    "Entry denied by risk overlay: {}",
                    decision.reason.unwrap_or_default()
                );
                return None;
            }
            Err(e) => {
                warn!(pair = %opportunity.pool, "Risk check failed, skipping entry: {}", e);
                return None;
            }
        };
        if amount <= Decimal::ZERO {
            return None;
        }

        let expected_out = match quote_amount(self.executor.gateway().as_ref(), token_in, token_out, amount, fee_tier).await
        {
            Ok(out) => out,
            Err(e) => {
                warn!(pair = %opportunity.pool, "Entry quote failed: {}", e);
                return None;
            }
        };

        let order = SwapOrder {
            token_in: token_in.to_string(),
            token_out: token_out.to_string(),
            amount_in: amount,
            expected_out,
            min_amount_out: apply_slippage(expected_out, entry_slippage),
            fee_tier,
            slippage_bps: entry_slippage,
        };
        let fill = self.executor.execute(&order).await;
        if !fill.is_filled() {
            warn!(
                pair = %opportunity.pool,
                "Entry swap failed: {}",
                fill.error_message.unwrap_or_default()
            );
            return None;
        }
        let received = fill.amount_out.unwrap_or(expected_out);
        if received <= Decimal::ZERO {
            return None;
        }

        let position = Position {
            id: uuid::Uuid::new_v4().to_string(),
            key: opportunity.key(),
            token_in: token_in.to_string(),
            token_out: token_out.to_string(),
            fee_tier,
            invested: amount,
            received,
            entry_price: amount / received,
            opened_at: Utc::now(),
            target_profit_bps: self.settings.target_profit_bps,
            stop_loss_bps: self.settings.stop_loss_bps,
            stop_loss_amount: amount * bps_fraction(self.settings.stop_loss_bps),
            state: PositionState::Open,
            close_attempts: 0,
        };

        info!(
            position = %position.id,
            pair = %position.key,
            invested = %position.invested,
            received = %position.received,
            entry_price = %position.entry_price,
            tx = ?fill.transaction_id,
            "📈 Position opened"
        );

        if let Some(replaced) = self.positions.remove(&position.key) {
            warn!(pair = %replaced.key, replaced = %replaced.id, "Open position on the same pair replaced");
            self.notifier.notify(PositionDelta {
                token: replaced.token_out.clone(),
                amount: replaced.received,
                price: replaced.entry_price,
                is_add: false,
            });
        }
        self.notifier.notify(PositionDelta {
            token: position.token_out.clone(),
            amount: position.received,
            price: position.entry_price,
            is_add: true,
        });

        self.positions.insert(position.key.clone(), position.clone());
        Some(position)
    }

    pub async fn monitor_positions(&mut self) -> MonitorReport {
        self.monitor_positions_at(Utc::now()).await
    }

    /// Retries unreconciled closes, then values every live position and closes those with an
    /// exit condition. Live positions leave the set whatever the close outcome; failed closes
    /// move to the unreconciled set.
    pub async fn monitor_positions_at(&mut self, now: DateTime<Utc>) -> MonitorReport {
        let mut report = MonitorReport::default();

        let pending_ids: Vec<String> = self.unreconciled.keys().cloned().collect();
        for id in pending_ids {
            let Some(pending) = self.unreconciled.remove(&id) else {
                continue;
            };
            if pending.position.close_attempts > self.settings.max_close_retries {
                self.unreconciled.insert(id, pending);
                continue;
            }

            let valuation = self.value_position(&pending.position).await;
            let closed = self.close_position(pending.position, pending.reason, valuation).await;
            if closed.success {
                info!(position = %closed.position.id, "Unreconciled position closed on retry");
            } else {
                self.park_unreconciled(&closed);
            }
            report.reconciled.push(closed);
        }

        let keys: Vec<PoolKey> = self.positions.keys().cloned().collect();
        for key in keys {
            let Some(position) = self.positions.get(&key) else {
                continue;
            };
            let valuation = self.value_position(position).await;

            match evaluate_exit(position, &valuation, now, self.settings.max_hold) {
                Some(reason) => {
                    let Some(position) = self.positions.remove(&key) else {
                        continue;
                    };
                    let closed = self.close_position(position, reason, valuation).await;
                    if !closed.success {
                        self.park_unreconciled(&closed);
                    }
                    report.closed.push(closed);
                }
                None => {
                    if let Some(position) = self.positions.get_mut(&key) {
                        position.state = PositionState::Monitoring;
                    }
                }
            }
        }

        report.still_open = self.positions.len();
        report.unreconciled = self.unreconciled.len();
        report
    }

    async fn close_position(&self, mut position: Position, reason: CloseReason, valuation: Valuation) -> ClosedPosition {
        let exit_slippage = self.settings.exit_slippage_bps;
        let order = SwapOrder {
            token_in: position.token_out.clone(),
            token_out: position.token_in.clone(),
            amount_in: position.received,
            expected_out: valuation.current_value,
            min_amount_out: apply_slippage(valuation.current_value, exit_slippage),
            fee_tier: position.fee_tier,
            slippage_bps: exit_slippage,
        };
        position.close_attempts += 1;
        let fill = self.executor.execute(&order).await;

        if fill.is_filled() {
            let amount_out = fill.amount_out.unwrap_or(valuation.current_value);
            let realized_profit = amount_out - position.invested;
            info!(
                position = %position.id,
                pair = %position.key,
                reason = %reason,
                amount_out = %amount_out,
                profit = %realized_profit,
                "📉 Position closed"
            );
            self.notifier.notify(PositionDelta {
                token: position.token_out.clone(),
                amount: position.received,
                price: position.entry_price,
                is_add: false,
            });
            return ClosedPosition {
                position,
                reason,
                valuation,
                amount_out: Some(amount_out),
                realized_profit,
                transaction_id: fill.transaction_id,
                success: true,
                error: None,
            };
        }

        position.state = PositionState::Unreconciled;
        ClosedPosition {
            position,
            reason,
            valuation,
            amount_out: None,
            realized_profit: Decimal::ZERO,
            transaction_id: None,
            success: false,
            error: fill.error_message,
        }
    }

    fn park_unreconciled(&mut self, closed: &ClosedPosition) {
        let position = closed.position.clone();
        let error = closed.error.as_deref().unwrap_or("unknown");

        if position.close_attempts > self.settings.max_close_retries {
            error!(
                position = %position.id,
                pair = %position.key,
                holding = %position.received,
                token = %position.token_out,
                attempts = position.close_attempts,
                "🚨 Close retries exhausted, position needs manual reconciliation: {}",
                error
            );
        } else {
            warn!(
                position = %position.id,
                pair = %position.key,
                attempts = position.close_attempts,
                "Close failed, position marked unreconciled: {}",
                error
            );
        }

        self.unreconciled.insert(
            position.id.clone(),
            PendingClose {
                position,
                reason: closed.reason,
            },
        );
    }
}
