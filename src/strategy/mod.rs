//! Strategies driven by the runner, one cycle at a time

pub mod advisory;
pub mod pool_imbalance;
pub mod triangular;

pub use advisory::*;
pub use pool_imbalance::*;
pub use triangular::*;

use async_trait::async_trait;
use crate::types::{MarketConditions, TradeResult};

#[async_trait]
pub trait Strategy: Send {
    fn name(&self) -> &str;

    fn should_activate(&self, conditions: &MarketConditions) -> bool;

    /// Runs one full cycle. Failures are reported in the result, never returned.
    async fn run_cycle(&mut self) -> TradeResult;
}
