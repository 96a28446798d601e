//! Core data types and structures

pub mod pools;
pub mod opportunity;
pub mod path;
pub mod position;
pub mod execution;
pub mod guidance;
pub mod market;

pub use pools::*;
pub use opportunity::*;
pub use path::*;
pub use position::*;
pub use execution::*;
pub use guidance::*;
pub use market::*;
