//! In-memory constant-product venue used for dry runs

use anyhow::Result;
use async_trait::async_trait;
use rust_decimal::prelude::*;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;
use crate::{
    config::ReserveSeed,
    types::PoolKey,
    utils::fee_tier_rate,
};
use super::{Quote, QuoteRequest, SwapGateway, SwapOutcome, SwapRequest};

#[derive(Debug, Clone)]
struct SimulatedPool {
    token_a: String,
    reserve_a: Decimal,
    reserve_b: Decimal,
}

impl SimulatedPool {
    /// (reserve_in, reserve_out) for a swap that sells `token_in`.
    fn oriented(&self, token_in: &str) -> (Decimal, Decimal) {
        if self.token_a == token_in {
            (self.reserve_a, self.reserve_b)
        } else {
            (self.reserve_b, self.reserve_a)
        }
    }
}

pub struct SimulatedGateway {
    pools: RwLock<HashMap<(PoolKey, u32), SimulatedPool>>,
}

impl SimulatedGateway {
    pub fn new(seeds: &[ReserveSeed]) -> Self {
        let pools = seeds
            .iter()
            .map(|seed| {
                (
                    (seed.pool.key(), seed.pool.fee_tier),
                    SimulatedPool {
                        token_a: seed.pool.token_a.clone(),
                        reserve_a: seed.reserve_a,
                        reserve_b: seed.reserve_b,
                    },
                )
            })
            .collect();
        Self {
            pools: RwLock::new(pools),
        }
    }

    pub async fn pool_count(&self) -> usize {
        self.pools.read().await.len()
    }

    /// Current reserves as (reserve of `token`, reserve of the other side).
    pub async fn reserves(&self, token: &str, other: &str, fee_tier: u32) -> Option<(Decimal, Decimal)> {
        let pools = self.pools.read().await;
        pools
            .get(&(PoolKey::new(token, other), fee_tier))
            .map(|pool| pool.oriented(token))
    }
}

/// x·y=k output for `amount_in` after the pool fee.
fn constant_product_out(amount_in: Decimal, reserve_in: Decimal, reserve_out: Decimal, fee_tier: u32) -> Option<Decimal> {
    if amount_in <= Decimal::ZERO || reserve_in <= Decimal::ZERO || reserve_out <= Decimal::ZERO {
        return None;
    }
    let effective_in = amount_in * (dec!(1) - fee_tier_rate(fee_tier));
    let out = (effective_in * reserve_out).checked_div(reserve_in + effective_in)?;
    (out > Decimal::ZERO && out < reserve_out).then_some(out)
}

#[async_trait]
impl SwapGateway for SimulatedGateway {
    async fn quote(&self, request: &QuoteRequest) -> Result<Quote> {
        let pools = self.pools.read().await;
        let pool = pools
            .get(&(PoolKey::new(&request.token_in, &request.token_out), request.fee_tier))
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "no pool for {}/{} at fee tier {}",
                    request.token_in,
                    request.token_out,
                    request.fee_tier
                )
            })?;

        let (reserve_in, reserve_out) = pool.oriented(&request.token_in);
        let amount_out = constant_product_out(request.amount_in, reserve_in, reserve_out, request.fee_tier)
            .ok_or_else(|| anyhow::anyhow!("insufficient liquidity for {}", request.amount_in))?;

        Ok(Quote {
            amount_out,
            fee_tier: request.fee_tier,
        })
    }

    async fn swap(&self, request: &SwapRequest) -> Result<SwapOutcome> {
        let mut pools = self.pools.write().await;
        let Some(pool) = pools.get_mut(&(PoolKey::new(&request.token_in, &request.token_out), request.fee_tier)) else {
            return Ok(SwapOutcome::rejected("no pool for pair"));
        };

        let (reserve_in, reserve_out) = pool.oriented(&request.token_in);
        let Some(amount_out) = constant_product_out(request.amount_in, reserve_in, reserve_out, request.fee_tier) else {
            return Ok(SwapOutcome::rejected("insufficient liquidity"));
        };

        if amount_out < request.min_amount_out {
            return Ok(SwapOutcome::rejected(format!(
                "output {} below minimum {}",
                amount_out, request.min_amount_out
            )));
        }

        if pool.token_a == request.token_in {
            pool.reserve_a += request.amount_in;
            pool.reserve_b -= amount_out;
        } else {
            pool.reserve_b += request.amount_in;
            pool.reserve_a -= amount_out;
        }

        let transaction_id = format!("0x{}", uuid::Uuid::new_v4().simple());
        debug!(
            tx = %transaction_id,
            token_in = %request.token_in,
            token_out = %request.token_out,
            amount_in = %request.amount_in,
            amount_out = %amount_out,
            "Simulated venue swap"
        );

        Ok(SwapOutcome {
            success: true,
            transaction_id: Some(transaction_id),
            actual_amount_out: Some(amount_out),
            error: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PoolPair;

    fn gateway() -> SimulatedGateway {
        SimulatedGateway::new(&[ReserveSeed {
            pool: PoolPair::new("WETH", "USDC", 3000),
            reserve_a: dec!(100),
            reserve_b: dec!(350000),
        }])
    }

    fn request(token_in: &str, token_out: &str, amount_in: Decimal, min_out: Decimal) -> SwapRequest {
        SwapRequest {
            token_in: token_in.to_string(),
            token_out: token_out.to_string(),
            amount_in,
            min_amount_out: min_out,
            fee_tier: 3000,
            recipient: "0x0".to_string(),
            slippage_bps: 50,
        }
    }

    #[tokio::test]
    async fn quotes_both_directions_net_of_fee() {
        let gateway = gateway();
        let forward = gateway
            .quote(&QuoteRequest {
                token_in: "WETH".to_string(),
                token_out: "USDC".to_string(),
                amount_in: dec!(1),
                fee_tier: 3000,
            })
            .await
            .unwrap();
        // Spot is 3500; fee and price impact keep the fill below it.
        assert!(forward.amount_out < dec!(3500));
        assert!(forward.amount_out > dec!(3450));

        let reverse = gateway
            .quote(&QuoteRequest {
                token_in: "USDC".to_string(),
                token_out: "WETH".to_string(),
                amount_in: dec!(3500),
                fee_tier: 3000,
            })
            .await
            .unwrap();
        assert!(reverse.amount_out < dec!(1));
    }

    #[tokio::test]
    async fn unknown_tier_has_no_quote() {
        let gateway = gateway();
        let result = gateway
            .quote(&QuoteRequest {
                token_in: "WETH".to_string(),
                token_out: "USDC".to_string(),
                amount_in: dec!(1),
                fee_tier: 500,
            })
            .await;
        tokio_test::assert_err!(result);
    }

    #[tokio::test]
    async fn swap_moves_reserves_and_enforces_min_out() {
        let gateway = gateway();
        let rejected = gateway.swap(&request("WETH", "USDC", dec!(1), dec!(4000))).await.unwrap();
        assert!(!rejected.success);
        assert_eq!(gateway.reserves("WETH", "USDC", 3000).await, Some((dec!(100), dec!(350000))));

        let filled = gateway.swap(&request("WETH", "USDC", dec!(1), dec!(3000))).await.unwrap();
        assert!(filled.success);
        let out = filled.actual_amount_out.unwrap();
        let (weth, usdc) = gateway.reserves("WETH", "USDC", 3000).await.unwrap();
        assert_eq!(weth, dec!(101));
        assert_eq!(usdc, dec!(350000) - out);
    }
}
