//! Gated polling of the optional guidance and cross-venue collaborators

use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};
use crate::{
    advisory::{CrossVenueMonitor, GuidanceSource},
    config::Config,
    schedule::IntervalGate,
    types::{CrossVenueCandidate, PoolPair, RegimeLabel},
    utils::{retry_with_backoff, RetryConfig},
};

/// Holds the last guidance label and cross-venue candidates between polls. A poll that
/// still fails after its retries clears the cached value.
pub struct AdvisoryPoller {
    guidance: Option<Arc<dyn GuidanceSource>>,
    cross_venue: Option<Arc<dyn CrossVenueMonitor>>,
    guidance_gate: IntervalGate,
    cross_venue_gate: IntervalGate,
    slippage_bps: u32,
    cross_venue_min_profit_bps: u32,
    retry: RetryConfig,
    label: Option<RegimeLabel>,
    candidates: Vec<CrossVenueCandidate>,
}

impl AdvisoryPoller {
    pub fn new(config: &Config) -> Self {
        Self {
            guidance: None,
            cross_venue: None,
            guidance_gate: IntervalGate::from_secs(config.guidance_interval_secs),
            cross_venue_gate: IntervalGate::from_secs(config.cross_venue_interval_secs),
            slippage_bps: config.entry_slippage_bps,
            cross_venue_min_profit_bps: config.cross_venue_min_profit_bps,
            retry: RetryConfig {
                max_attempts: 2,
                initial_delay_ms: 200,
                ..RetryConfig::default()
            },
            label: None,
            candidates: Vec::new(),
        }
    }

    pub fn with_guidance(mut self, source: Arc<dyn GuidanceSource>) -> Self {
        self.guidance = Some(source);
        self
    }

    pub fn with_cross_venue(mut self, monitor: Arc<dyn CrossVenueMonitor>) -> Self {
        self.cross_venue = Some(monitor);
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn guidance(&self) -> Option<&RegimeLabel> {
        self.label.as_ref()
    }

    pub fn cross_venue_candidates(&self) -> &[CrossVenueCandidate] {
        &self.candidates
    }

    /// Polls the guidance source when its gate is open and returns the current label.
    pub async fn refresh_guidance(&mut self, pools: &[PoolPair]) -> Option<RegimeLabel> {
        let Some(source) = self.guidance.clone() else {
            return None;
        };
        if !self.guidance_gate.try_acquire() {
            return self.label.clone();
        }

        let slippage_bps = self.slippage_bps;
        let polled = retry_with_backoff(|| source.advise(pools, slippage_bps), &self.retry, "guidance poll").await;
        match polled {
            Ok(label) => {
                if label != self.label {
                    info!(
                        "🧭 Guidance: {}",
                        label.as_ref().map(|l| l.to_string()).unwrap_or_else(|| "none".to_string())
                    );
                }
                self.label = label;
            }
            Err(e) => {
                warn!("Guidance unavailable, continuing without: {}", e);
                self.label = None;
            }
        }
        self.label.clone()
    }

    /// Polls the cross-venue monitor when its gate is open. Results are informational only.
    pub async fn refresh_cross_venue(&mut self, prices: &HashMap<String, Decimal>) -> &[CrossVenueCandidate] {
        let Some(monitor) = self.cross_venue.clone() else {
            return &self.candidates;
        };
        if prices.is_empty() || !self.cross_venue_gate.try_acquire() {
            return &self.candidates;
        }

        let min_profit_bps = self.cross_venue_min_profit_bps;
        let polled = retry_with_backoff(|| monitor.find(prices, min_profit_bps), &self.retry, "cross-venue poll").await;
        match polled {
            Ok(candidates) => {
                debug!("Cross-venue monitor returned {} candidates", candidates.len());
                self.candidates = candidates;
            }
            Err(e) => {
                warn!("Cross-venue monitor unavailable: {}", e);
                self.candidates.clear();
            }
        }
        &self.candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advisory::StaticGuidance;
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct FlakyGuidance {
        calls: AtomicU32,
    }

    #[async_trait]
    impl GuidanceSource for FlakyGuidance {
        async fn advise(&self, _candidates: &[PoolPair], _slippage_bps: u32) -> anyhow::Result<Option<RegimeLabel>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            anyhow::bail!("guidance service offline")
        }
    }

    struct FixedMonitor;

    #[async_trait]
    impl CrossVenueMonitor for FixedMonitor {
        async fn find(
            &self,
            prices: &HashMap<String, Decimal>,
            min_profit_bps: u32,
        ) -> anyhow::Result<Vec<CrossVenueCandidate>> {
            Ok(prices
                .keys()
                .map(|pair| CrossVenueCandidate {
                    pair: pair.clone(),
                    buy_venue: "pool".to_string(),
                    sell_venue: "book".to_string(),
                    profit_bps: Decimal::from(min_profit_bps + 5),
                })
                .collect())
        }
    }

    fn fast_retry() -> RetryConfig {
        RetryConfig {
            max_attempts: 2,
            initial_delay_ms: 1,
            max_delay_ms: 1,
            exponential_base: 1.0,
        }
    }

    #[tokio::test]
    async fn no_source_means_no_guidance() {
        let mut poller = AdvisoryPoller::new(&Config::default());
        assert_eq!(poller.refresh_guidance(&[]).await, None);
    }

    #[tokio::test]
    async fn label_is_cached_between_polls() {
        let mut poller = AdvisoryPoller::new(&Config::default())
            .with_guidance(Arc::new(StaticGuidance::new(RegimeLabel::Hold)));
        assert_eq!(poller.refresh_guidance(&[]).await, Some(RegimeLabel::Hold));
        assert_eq!(poller.refresh_guidance(&[]).await, Some(RegimeLabel::Hold));
        assert_eq!(poller.guidance(), Some(&RegimeLabel::Hold));
    }

    #[tokio::test]
    async fn failed_poll_degrades_to_none_after_retries() {
        let flaky = Arc::new(FlakyGuidance {
            calls: AtomicU32::new(0),
        });
        let mut poller = AdvisoryPoller::new(&Config::default())
            .with_guidance(flaky.clone())
            .with_retry(fast_retry());

        assert_eq!(poller.refresh_guidance(&[]).await, None);
        assert_eq!(flaky.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn cross_venue_needs_prices_and_respects_its_gate() {
        let mut poller = AdvisoryPoller::new(&Config::default()).with_cross_venue(Arc::new(FixedMonitor));
        assert!(poller.refresh_cross_venue(&HashMap::new()).await.is_empty());

        let prices = HashMap::from([("WETH/USDC".to_string(), dec!(2000))]);
        let found = poller.refresh_cross_venue(&prices).await;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].profit_bps, dec!(25));

        let more = HashMap::from([
            ("WETH/USDC".to_string(), dec!(2000)),
            ("WETH/DAI".to_string(), dec!(2001)),
        ]);
        assert_eq!(poller.refresh_cross_venue(&more).await.len(), 1);
    }
}
