//! Interval gates for rate-limited polling

use std::time::{Duration, Instant};

/// Opens at most once per interval. The first acquisition always succeeds.
#[derive(Debug, Clone)]
pub struct IntervalGate {
    interval: Duration,
    last_fired: Option<Instant>,
}

impl IntervalGate {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_fired: None,
        }
    }

    pub fn from_secs(secs: u64) -> Self {
        Self::new(Duration::from_secs(secs))
    }

    pub fn try_acquire(&mut self) -> bool {
        self.try_acquire_at(Instant::now())
    }

    pub fn try_acquire_at(&mut self, now: Instant) -> bool {
        let ready = match self.last_fired {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.interval,
        };
        if ready {
            self.last_fired = Some(now);
        }
        ready
    }

    pub fn last_fired(&self) -> Option<Instant> {
        self.last_fired
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}
