//! Utility functions and helpers

pub mod math;
pub mod logging;
pub mod retry;
pub mod display;

pub use math::*;
pub use logging::*;
pub use retry::*;
pub use display::*;
