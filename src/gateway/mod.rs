//! Quote/swap gateway seam and the venues that implement it

pub mod simulated;
pub mod scripted;

pub use simulated::*;
pub use scripted::*;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Serialize;
use crate::errors::{EngineError, EngineResult};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuoteRequest {
    pub token_in: String,
    pub token_out: String,
    pub amount_in: Decimal,
    pub fee_tier: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Quote {
    /// Output net of pool fees.
    pub amount_out: Decimal,
    pub fee_tier: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SwapRequest {
    pub token_in: String,
    pub token_out: String,
    pub amount_in: Decimal,
    pub min_amount_out: Decimal,
    pub fee_tier: u32,
    pub recipient: String,
    pub slippage_bps: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SwapOutcome {
    pub success: bool,
    pub transaction_id: Option<String>,
    pub actual_amount_out: Option<Decimal>,
    pub error: Option<String>,
}

impl SwapOutcome {
    pub fn rejected(error: impl Into<String>) -> Self {
        Self {
            success: false,
            transaction_id: None,
            actual_amount_out: None,
            error: Some(error.into()),
        }
    }
}

/// Pricing and execution venue. An `Err` from `quote` means "no liquidity, skip".
#[async_trait]
pub trait SwapGateway: Send + Sync {
    async fn quote(&self, request: &QuoteRequest) -> anyhow::Result<Quote>;

    async fn swap(&self, request: &SwapRequest) -> anyhow::Result<SwapOutcome>;
}

/// Quotes `amount_in` and returns the output, treating a non-positive output as a failure.
pub async fn quote_amount(
    gateway: &dyn SwapGateway,
    token_in: &str,
    token_out: &str,
    amount_in: Decimal,
    fee_tier: u32,
) -> EngineResult<Decimal> {
    let request = QuoteRequest {
        token_in: token_in.to_string(),
        token_out: token_out.to_string(),
        amount_in,
        fee_tier,
    };
    let quote = gateway.quote(&request).await.map_err(|source| EngineError::Quote {
        token_in: token_in.to_string(),
        token_out: token_out.to_string(),
        fee_tier,
        source,
    })?;

    if quote.amount_out <= Decimal::ZERO {
        return Err(EngineError::Quote {
            token_in: token_in.to_string(),
            token_out: token_out.to_string(),
            fee_tier,
            source: anyhow::anyhow!("non-positive output {}", quote.amount_out),
        });
    }
    Ok(quote.amount_out)
}
