//! Trade execution simulation

use tracing::info;
use crate::{
    gateway::{quote_amount, SwapGateway},
    types::{ExecutionStatus, SwapFill},
};
use super::engine::{failed_fill, SwapOrder};

/// Fills at a fresh quote, subject to the same minimum output a live swap would enforce.
pub async fn create_simulated_fill(gateway: &dyn SwapGateway, order: &SwapOrder) -> SwapFill {
    let amount_out = match quote_amount(
        gateway,
        &order.token_in,
        &order.token_out,
        order.amount_in,
        order.fee_tier,
    )
    .await
    {
        Ok(out) => out,
        Err(e) => return failed_fill(order, e.to_string()),
    };

    if amount_out < order.min_amount_out {
        return failed_fill(
            order,
            format!("simulated output {} below minimum {}", amount_out, order.min_amount_out),
        );
    }

    let transaction_id = format!("sim-{}", uuid::Uuid::new_v4().simple());
    info!(
        tx = %transaction_id,
        token_in = %order.token_in,
        token_out = %order.token_out,
        amount_in = %order.amount_in,
        amount_out = %amount_out,
        "🎭 Simulated swap"
    );

    SwapFill {
        status: ExecutionStatus::Simulated,
        transaction_id: Some(transaction_id),
        amount_in: order.amount_in,
        amount_out: Some(amount_out),
        error_message: None,
    }
}
