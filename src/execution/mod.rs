//! Swap execution: gateway-backed or simulated

pub mod engine;
pub mod simulation;

pub use engine::*;
pub use simulation::*;
