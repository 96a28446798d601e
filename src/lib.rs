//! Pool Arbitrage Engine - DEX pool imbalance and triangular arbitrage
//!
//! Scans a configured pool universe for forward/reverse price imbalances, manages the
//! resulting positions through their open/monitor/close lifecycle, and looks for profitable
//! multi-hop cycles across fee tiers. Pricing and execution go through a `SwapGateway`.

pub mod config;
pub mod types;
pub mod errors;
pub mod utils;
pub mod schedule;
pub mod gateway;
pub mod risk;
pub mod advisory;
pub mod scanner;
pub mod filter;
pub mod paths;
pub mod positions;
pub mod execution;
pub mod strategy;

// Re-export commonly used items
pub use config::Config;
pub use errors::{EngineError, EngineResult};
pub use types::*;
