//! Position lifecycle: open, monitor, close, reconcile

pub mod exit;
pub mod manager;

pub use exit::*;
pub use manager::*;
