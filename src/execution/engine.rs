//! Trade execution engine

use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};
use crate::{
    gateway::{SwapGateway, SwapRequest},
    types::{ExecutionStatus, SwapFill},
};
use super::simulation::create_simulated_fill;

/// One swap to execute. `expected_out` is the quote the order was sized from and stands in
/// for the fill when the venue does not report an actual output.
#[derive(Debug, Clone)]
pub struct SwapOrder {
    pub token_in: String,
    pub token_out: String,
    pub amount_in: Decimal,
    pub expected_out: Decimal,
    pub min_amount_out: Decimal,
    pub fee_tier: u32,
    pub slippage_bps: u32,
}

pub struct TradeExecutor {
    gateway: Arc<dyn SwapGateway>,
    dry_run: bool,
    recipient: String,
}

impl TradeExecutor {
    pub fn new(gateway: Arc<dyn SwapGateway>, dry_run: bool, recipient: impl Into<String>) -> Self {
        Self {
            gateway,
            dry_run,
            recipient: recipient.into(),
        }
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn gateway(&self) -> &Arc<dyn SwapGateway> {
        &self.gateway
    }

    /// Never errors: venue failures come back as a `Failed` fill.
    pub async fn execute(&self, order: &SwapOrder) -> SwapFill {
        let started = Instant::now();

        if self.dry_run {
            return create_simulated_fill(self.gateway.as_ref(), order).await;
        }

        let request = SwapRequest {
            token_in: order.token_in.clone(),
            token_out: order.token_out.clone(),
            amount_in: order.amount_in,
            min_amount_out: order.min_amount_out,
            fee_tier: order.fee_tier,
            recipient: self.recipient.clone(),
            slippage_bps: order.slippage_bps,
        };

        match self.gateway.swap(&request).await {
            Ok(outcome) if outcome.success => {
                let amount_out = outcome.actual_amount_out.unwrap_or(order.expected_out);
                info!(
                    tx = ?outcome.transaction_id,
                    token_in = %order.token_in,
                    token_out = %order.token_out,
                    amount_in = %order.amount_in,
                    amount_out = %amount_out,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "✅ Swap executed"
                );
                SwapFill {
                    status: ExecutionStatus::Success,
                    transaction_id: outcome.transaction_id,
                    amount_in: order.amount_in,
                    amount_out: Some(amount_out),
                    error_message: None,
                }
            }
            Ok(outcome) => {
                let error = outcome.error.unwrap_or_else(|| "swap reported failure".to_string());
                warn!("Swap {} → {} failed: {}", order.token_in, order.token_out, error);
                failed_fill(order, error)
            }
            Err(e) => {
                warn!("Swap {} → {} errored: {}", order.token_in, order.token_out, e);
                failed_fill(order, e.to_string())
            }
        }
    }
}

pub(crate) fn failed_fill(order: &SwapOrder, error: String) -> SwapFill {
    SwapFill {
        status: ExecutionStatus::Failed,
        transaction_id: None,
        amount_in: order.amount_in,
        amount_out: None,
        error_message: Some(error),
    }
}
