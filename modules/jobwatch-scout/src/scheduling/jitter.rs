use std::time::Duration;

use rand::Rng;

/// Jitter bounds in seconds, inclusive.
pub const JITTER_MIN_SECS: i64 = -10;
pub const JITTER_MAX_SECS: i64 = 20;

/// The delay never drops below this, whatever the base and jitter.
pub const MIN_DELAY_SECS: u64 = 1;

/// Base interval plus a fresh random offset on every call to `next_delay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JitteredInterval {
    base_secs: u64,
}

impl JitteredInterval {
    pub fn new(base_secs: u64) -> Self {
        Self { base_secs }
    }

    pub fn base(&self) -> Duration {
        Duration::from_secs(self.base_secs)
    }

    pub fn next_delay(&self) -> Duration {
        let jitter = rand::rng().random_range(JITTER_MIN_SECS..=JITTER_MAX_SECS);
        self.delay_with(jitter)
    }

    /// Delay for a given jitter, clamped to `MIN_DELAY_SECS`.
    pub fn delay_with(&self, jitter_secs: i64) -> Duration {
        let secs = if jitter_secs >= 0 {
            self.base_secs.saturating_add(jitter_secs.unsigned_abs())
        } else {
            self.base_secs.saturating_sub(jitter_secs.unsigned_abs())
        };
        Duration::from_secs(secs.max(MIN_DELAY_SECS))
    }
}
