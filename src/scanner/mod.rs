//! Pool imbalance scanning and opportunity scoring

pub mod scoring;
pub mod pool_scanner;

pub use scoring::*;
pub use pool_scanner::*;
