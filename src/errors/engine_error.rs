//! Custom error types for the engine

use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Quote failed: {token_in} → {token_out} @ {fee_tier}")]
    Quote {
        token_in: String,
        token_out: String,
        fee_tier: u32,
        #[source]
        source: anyhow::Error,
    },

    #[error("Path step failed: hop {hop} ({token_in} → {token_out}) returned no quote on any fee tier")]
    PathStepFailed {
        hop: usize,
        token_in: String,
        token_out: String,
    },

    #[error("Invalid path {route}: {reason}")]
    InvalidPath {
        route: String,
        reason: String,
    },

    #[error("Incomplete path {route}: expected {expected} hops with quotes, found {actual}")]
    IncompletePath {
        route: String,
        expected: usize,
        actual: usize,
    },

    #[error("Below profit floor: {profit_bps} bps < {min_profit_bps} bps")]
    BelowProfitFloor {
        profit_bps: Decimal,
        min_profit_bps: u32,
    },

    #[error("Swap failed: {token_in} → {token_out} - {message}")]
    Swap {
        token_in: String,
        token_out: String,
        message: String,
    },

    #[error("{context} failed")]
    Collaborator {
        context: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Invalid configuration: {key} - {message}")]
    Config {
        key: String,
        message: String,
    },
}

impl EngineError {
    pub fn config(key: &str, message: impl Into<String>) -> Self {
        EngineError::Config {
            key: key.to_string(),
            message: message.into(),
        }
    }

    /// The path cannot be traded this cycle; the strategy itself is healthy.
    pub fn is_path_unusable(&self) -> bool {
        matches!(
            self,
            EngineError::PathStepFailed { .. }
                | EngineError::IncompletePath { .. }
                | EngineError::BelowProfitFloor { .. }
        )
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
