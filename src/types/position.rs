//! Position lifecycle types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;
use super::PoolKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PositionState {
    Open,
    Monitoring,
    /// Close trade failed; kept aside for retry and operator attention.
    Unreconciled,
}

#[derive(Debug, Clone, Serialize)]
pub struct Position {
    pub id: String,
    pub key: PoolKey,
    pub token_in: String,
    pub token_out: String,
    pub fee_tier: u32,
    /// Quote-currency units spent on entry.
    pub invested: Decimal,
    /// Token-out quantity held.
    pub received: Decimal,
    pub entry_price: Decimal,
    pub opened_at: DateTime<Utc>,
    pub target_profit_bps: u32,
    pub stop_loss_bps: u32,
    pub stop_loss_amount: Decimal,
    pub state: PositionState,
    pub close_attempts: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CloseReason {
    ProfitTarget,
    StopLoss,
    MaxHoldTime,
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            CloseReason::ProfitTarget => "profit target hit",
            CloseReason::StopLoss => "stop loss hit",
            CloseReason::MaxHoldTime => "max hold time exceeded",
        };
        f.write_str(reason)
    }
}

/// Live valuation of an open position.
#[derive(Debug, Clone, Serialize)]
pub struct Valuation {
    pub current_value: Decimal,
    pub profit: Decimal,
    pub profit_bps: Decimal,
    /// False when the quote failed and the fallback loss was assumed.
    pub quoted: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClosedPosition {
    pub position: Position,
    pub reason: CloseReason,
    pub valuation: Valuation,
    pub amount_out: Option<Decimal>,
    pub realized_profit: Decimal,
    pub transaction_id: Option<String>,
    pub success: bool,
    pub error: Option<String>,
}

/// What one monitor/close pass did.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MonitorReport {
    pub closed: Vec<ClosedPosition>,
    pub reconciled: Vec<ClosedPosition>,
    pub still_open: usize,
    pub unreconciled: usize,
}

impl MonitorReport {
    pub fn realized_profit(&self) -> Decimal {
        self.closed
            .iter()
            .chain(self.reconciled.iter())
            .filter(|c| c.success)
            .map(|c| c.realized_profit)
            .sum()
    }

    pub fn volume(&self) -> Decimal {
        self.closed
            .iter()
            .chain(self.reconciled.iter())
            .filter(|c| c.success)
            .filter_map(|c| c.amount_out)
            .sum()
    }
}
