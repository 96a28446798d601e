//! Risk overlay seam: trade approval and position-delta notifications

pub mod limits;
pub mod notifier;

pub use limits::*;
pub use notifier::*;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskRequest {
    pub strategy: String,
    pub token_in: String,
    pub token_out: String,
    pub amount: Decimal,
    pub slippage_bps: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskDecision {
    pub allowed: bool,
    pub adjusted_amount: Option<Decimal>,
    pub reason: Option<String>,
}

impl RiskDecision {
    pub fn allow() -> Self {
        Self {
            allowed: true,
            adjusted_amount: None,
            reason: None,
        }
    }

    pub fn allow_adjusted(amount: Decimal, reason: impl Into<String>) -> Self {
        Self {
            allowed: true,
            adjusted_amount: Some(amount),
            reason: Some(reason.into()),
        }
    }

    pub fn deny(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            adjusted_amount: None,
            reason: Some(reason.into()),
        }
    }
}

/// Position change reported to the overlay after an open (`is_add`) or close.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionDelta {
    pub token: String,
    pub amount: Decimal,
    pub price: Decimal,
    pub is_add: bool,
}

#[async_trait]
pub trait RiskOverlay: Send + Sync {
    async fn check_trade_allowed(&self, request: &RiskRequest) -> anyhow::Result<RiskDecision>;

    async fn update_position(&self, delta: &PositionDelta);
}
