//! Trade execution and cycle result types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

/// Structured outcome of one strategy cycle, handed back to the scheduler.
#[derive(Debug, Clone, Serialize)]
pub struct TradeResult {
    pub success: bool,
    /// Realized plus unrealized profit for the cycle.
    pub profit: Decimal,
    /// Mark-to-market PnL of positions still open at the end of the cycle. Part of `profit`.
    pub unrealized_profit: Decimal,
    pub volume: Decimal,
    pub strategy: String,
    pub descriptor: String,
    pub timestamp: DateTime<Utc>,
    pub error_message: Option<String>,
}

impl TradeResult {
    pub fn completed(strategy: &str, profit: Decimal, volume: Decimal, descriptor: String) -> Self {
        Self {
            success: true,
            profit,
            unrealized_profit: Decimal::ZERO,
            volume,
            strategy: strategy.to_string(),
            descriptor,
            timestamp: Utc::now(),
            error_message: None,
        }
    }

    pub fn failed(strategy: &str, descriptor: String, error: String) -> Self {
        Self {
            success: false,
            profit: Decimal::ZERO,
            unrealized_profit: Decimal::ZERO,
            volume: Decimal::ZERO,
            strategy: strategy.to_string(),
            descriptor,
            timestamp: Utc::now(),
            error_message: Some(error),
        }
    }

    pub fn with_unrealized(mut self, unrealized_profit: Decimal) -> Self {
        self.unrealized_profit = unrealized_profit;
        self
    }

    pub fn realized_profit(&self) -> Decimal {
        self.profit - self.unrealized_profit
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExecutionStatus {
    Simulated,
    Success,
    Failed,
}

/// Normalized fill of a single swap, real or simulated.
#[derive(Debug, Clone, Serialize)]
pub struct SwapFill {
    pub status: ExecutionStatus,
    pub transaction_id: Option<String>,
    pub amount_in: Decimal,
    pub amount_out: Option<Decimal>,
    pub error_message: Option<String>,
}

impl SwapFill {
    pub fn is_filled(&self) -> bool {
        matches!(self.status, ExecutionStatus::Success | ExecutionStatus::Simulated)
    }
}
