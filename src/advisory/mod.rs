//! Optional advisory collaborators: regime guidance and cross-venue candidates

use anyhow::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use crate::types::{CrossVenueCandidate, PoolPair, RegimeLabel};

#[async_trait]
pub trait GuidanceSource: Send + Sync {
    async fn advise(&self, candidates: &[PoolPair], slippage_bps: u32) -> Result<Option<RegimeLabel>>;
}

#[async_trait]
pub trait CrossVenueMonitor: Send + Sync {
    /// `prices` maps `A/B` to the latest on-pool price of B per A.
    async fn find(
        &self,
        prices: &HashMap<String, Decimal>,
        min_profit_bps: u32,
    ) -> Result<Vec<CrossVenueCandidate>>;
}

/// Guidance pinned to one label, e.g. from operator configuration.
pub struct StaticGuidance {
    label: RegimeLabel,
}

impl StaticGuidance {
    pub fn new(label: RegimeLabel) -> Self {
        Self { label }
    }
}

#[async_trait]
impl GuidanceSource for StaticGuidance {
    async fn advise(&self, _candidates: &[PoolPair], _slippage_bps: u32) -> Result<Option<RegimeLabel>> {
        Ok(Some(self.label.clone()))
    }
}
