//! Multi-hop (triangular) path types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use crate::utils::ratio_bps;

/// One leg of an analyzed path, at the fee tier that quoted the best output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathHop {
    pub token_in: String,
    pub token_out: String,
    pub fee_tier: u32,
    pub amount_in: Decimal,
    pub quoted_out: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct ArbitragePath {
    /// Ordered token cycle, first == last.
    pub tokens: Vec<String>,
    pub hops: Vec<PathHop>,
    pub trade_size: Decimal,
    pub final_amount: Decimal,
    pub expected_profit: Decimal,
    pub fee_estimate: Decimal,
    /// Share of fee-tier probes that returned a quote, 0..=1.
    pub confidence: Decimal,
    pub analyzed_at: DateTime<Utc>,
}

impl ArbitragePath {
    pub fn profit_bps(&self) -> Decimal {
        ratio_bps(self.expected_profit, self.trade_size)
    }

    pub fn route(&self) -> String {
        self.tokens.join(" → ")
    }

    /// Every hop carries a fee tier and a positive quote, and the hop count matches the cycle.
    pub fn is_fully_populated(&self) -> bool {
        self.tokens.len() >= 2
            && self.hops.len() == self.tokens.len() - 1
            && self
                .hops
                .iter()
                .all(|hop| hop.fee_tier > 0 && hop.quoted_out > Decimal::ZERO)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HopExecution {
    pub hop: usize,
    pub token_in: String,
    pub token_out: String,
    pub amount_in: Decimal,
    pub min_amount_out: Decimal,
    pub amount_out: Decimal,
    pub transaction_id: Option<String>,
}

/// Outcome of executing a path hop by hop. A failed hop leaves the earlier hops in place.
#[derive(Debug, Clone, Serialize)]
pub struct PathExecution {
    pub route: String,
    pub trade_size: Decimal,
    pub executed: Vec<HopExecution>,
    pub completed: bool,
    pub failed_hop: Option<usize>,
    pub error: Option<String>,
}

impl PathExecution {
    /// Realized round-trip profit, only meaningful once every hop completed.
    pub fn realized_profit(&self) -> Option<Decimal> {
        if !self.completed {
            return None;
        }
        self.executed.last().map(|hop| hop.amount_out - self.trade_size)
    }

    pub fn volume(&self) -> Decimal {
        self.executed.iter().map(|hop| hop.amount_in).sum()
    }
}
