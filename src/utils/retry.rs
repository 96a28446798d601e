//! Retry logic with exponential backoff

use anyhow::Result;
use std::time::Duration;
use tracing::warn;
use crate::errors::{EngineError, EngineResult};

#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub exponential_base: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 100,
            max_delay_ms: 5000,
            exponential_base: 2.0,
        }
    }
}

impl RetryConfig {
    /// Backoff after `delay_ms`, capped at `max_delay_ms` and jittered by ±5%.
    pub fn next_delay(&self, delay_ms: u64) -> u64 {
        let grown = ((delay_ms as f64 * self.exponential_base) as u64).min(self.max_delay_ms);
        let jitter = (grown as f64 * 0.1 * (rand::random::<f64>() - 0.5)) as i64;
        grown.saturating_add_signed(jitter)
    }
}

/// Runs `operation` until it succeeds or `max_attempts` is spent. The last collaborator
/// error is kept as the source of the returned `EngineError::Collaborator`.
pub async fn retry_with_backoff<F, Fut, T>(
    operation: F,
    config: &RetryConfig,
    context: &str,
) -> EngineResult<T>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let max_attempts = config.max_attempts.max(1);
    let mut delay_ms = config.initial_delay_ms;
    let mut attempt = 0u32;

    loop {
        attempt += 1;
        let error = match operation().await {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };
        if attempt >= max_attempts {
            return Err(EngineError::Collaborator {
                context: format!("{} after {} attempts", context, attempt),
                source: error,
            });
        }

        warn!("{} attempt {}/{} failed: {}. Retrying in {}ms", context, attempt, max_attempts, error, delay_ms);
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        delay_ms = config.next_delay(delay_ms);
    }
}
