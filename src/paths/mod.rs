//! Triangular path analysis and hop-by-hop execution

pub mod analyzer;
pub mod executor;

pub use analyzer::*;
pub use executor::*;
