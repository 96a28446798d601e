//! Limit-based risk overlay

use anyhow::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{info, warn};
use super::{PositionDelta, RiskDecision, RiskOverlay, RiskRequest};

/// Caps single-trade size, slippage and per-token notional exposure. Exposure is tracked
/// from the position deltas it is notified of.
pub struct LimitsRiskOverlay {
    pub max_trade_amount: Decimal,
    pub max_slippage_bps: u32,
    pub max_token_exposure: Decimal,
    exposure: Mutex<HashMap<String, Decimal>>,
}

impl LimitsRiskOverlay {
    pub fn new(max_trade_amount: Decimal, max_slippage_bps: u32, max_token_exposure: Decimal) -> Self {
        Self {
            max_trade_amount,
            max_slippage_bps,
            max_token_exposure,
            exposure: Mutex::new(HashMap::new()),
        }
    }

    pub fn exposure(&self, token: &str) -> Decimal {
        self.exposure
            .lock()
            .map(|e| e.get(token).copied().unwrap_or_default())
            .unwrap_or_default()
    }
}

#[async_trait]
impl RiskOverlay for LimitsRiskOverlay {
    async fn check_trade_allowed(&self, request: &RiskRequest) -> Result<RiskDecision> {
        if request.slippage_bps > self.max_slippage_bps {
            warn!(
                strategy = %request.strategy,
                "Risk check REJECTED: slippage {} bps > {} bps",
                request.slippage_bps, self.max_slippage_bps
            );
            return Ok(RiskDecision::deny(format!(
                "slippage budget {} bps exceeds {} bps",
                request.slippage_bps, self.max_slippage_bps
            )));
        }

        let remaining = (self.max_token_exposure - self.exposure(&request.token_out)).max(Decimal::ZERO);
        if remaining.is_zero() {
            warn!(
                strategy = %request.strategy,
                token = %request.token_out,
                "Risk check REJECTED: exposure limit reached"
            );
            return Ok(RiskDecision::deny(format!(
                "{} exposure limit {} reached",
                request.token_out, self.max_token_exposure
            )));
        }

        let allowed = request.amount.min(self.max_trade_amount).min(remaining);
        if allowed < request.amount {
            info!(
                strategy = %request.strategy,
                requested = %request.amount,
                allowed = %allowed,
                "Risk check APPROVED with reduced size"
            );
            return Ok(RiskDecision::allow_adjusted(allowed, "size reduced to fit limits"));
        }

        Ok(RiskDecision::allow())
    }

    async fn update_position(&self, delta: &PositionDelta) {
        let notional = delta.amount * delta.price;
        if let Ok(mut exposure) = self.exposure.lock() {
            let entry = exposure.entry(delta.token.clone()).or_default();
            *entry = if delta.is_add {
                *entry + notional
            } else {
                (*entry - notional).max(Decimal::ZERO)
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::risk::RiskNotifier;
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    fn request(amount: Decimal, slippage_bps: u32) -> RiskRequest {
        RiskRequest {
            strategy: "pool-imbalance".to_string(),
            token_in: "USDC".to_string(),
            token_out: "WETH".to_string(),
            amount,
            slippage_bps,
        }
    }

    #[tokio::test]
    async fn clamps_and_denies() {
        let overlay = LimitsRiskOverlay::new(dec!(10), 100, dec!(50));

        let ok = overlay.check_trade_allowed(&request(dec!(5), 50)).await.unwrap();
        assert_eq!(ok, RiskDecision::allow());

        let clamped = overlay.check_trade_allowed(&request(dec!(25), 50)).await.unwrap();
        assert!(clamped.allowed);
        assert_eq!(clamped.adjusted_amount, Some(dec!(10)));

        let denied = overlay.check_trade_allowed(&request(dec!(5), 300)).await.unwrap();
        assert!(!denied.allowed);
    }

    #[tokio::test]
    async fn exposure_follows_notifications() {
        let overlay = Arc::new(LimitsRiskOverlay::new(dec!(100), 100, dec!(12)));
        let (notifier, handle) = RiskNotifier::spawn(overlay.clone());

        notifier.notify(PositionDelta {
            token: "WETH".to_string(),
            amount: dec!(0.004),
            price: dec!(2500),
            is_add: true,
        });
        drop(notifier);
        handle.await.unwrap();

        assert_eq!(overlay.exposure("WETH"), dec!(10));
        let decision = overlay.check_trade_allowed(&request(dec!(5), 50)).await.unwrap();
        assert_eq!(decision.adjusted_amount, Some(dec!(2)));

        overlay
            .update_position(&PositionDelta {
                token: "WETH".to_string(),
                amount: dec!(0.004),
                price: dec!(2500),
                is_add: false,
            })
            .await;
        assert_eq!(overlay.exposure("WETH"), Decimal::ZERO);
    }

    #[test]
    fn disconnected_notifier_drops_quietly() {
        let notifier = RiskNotifier::disconnected();
        notifier.notify(PositionDelta {
            token: "WETH".to_string(),
            amount: dec!(1),
            price: dec!(1),
            is_add: true,
        });
    }
}
