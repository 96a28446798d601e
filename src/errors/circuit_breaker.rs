//! Circuit breaker over consecutive failed cycles

use std::time::{Duration, Instant};
use tracing::{error, info};

pub struct CircuitBreaker {
    pub consecutive_errors: u32,
    pub is_open: bool,
    pub last_error_time: Option<Instant>,
    pub max_consecutive_errors: u32,
    pub cooldown_duration: Duration,
}

impl CircuitBreaker {
    pub fn new(max_consecutive_errors: u32, cooldown_secs: u64) -> Self {
        Self {
            consecutive_errors: 0,
            is_open: false,
            last_error_time: None,
            max_consecutive_errors: max_consecutive_errors.max(1),
            cooldown_duration: Duration::from_secs(cooldown_secs),
        }
    }

    pub fn record_success(&mut self) {
        self.consecutive_errors = 0;
        self.is_open = false;
    }

    /// Returns true when this error tripped the breaker.
    pub fn record_error(&mut self) -> bool {
        self.consecutive_errors += 1;

        if !self.is_open && self.consecutive_errors >= self.max_consecutive_errors {
            self.is_open = true;
            self.last_error_time = Some(Instant::now());
            error!("Circuit breaker OPEN after {} consecutive errors", self.consecutive_errors);
            return true;
        }
        false
    }

    pub fn can_proceed(&mut self) -> bool {
        self.can_proceed_at(Instant::now())
    }

    pub fn can_proceed_at(&mut self, now: Instant) -> bool {
        if !self.is_open {
            return true;
        }

        if let Some(last_error) = self.last_error_time {
            if now.saturating_duration_since(last_error) >= self.cooldown_duration {
                info!("Circuit breaker cooldown complete, resetting");
                self.is_open = false;
                self.consecutive_errors = 0;
                return true;
            }
        }
        false
    }
}
