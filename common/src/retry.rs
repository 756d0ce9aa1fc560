// Retry strategies for rate-limited remote calls
//
// The remote service answers 429 when called too often and asks clients to
// wait a full minute before trying again.

use rand::Rng;
use std::time::Duration;

/// Default wait after a rate-limited response
pub const RATE_LIMIT_DELAY_SECS: u64 = 60;

/// Default number of retries after the first attempt
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Retry strategy trait for calculating retry delays
pub trait RetryStrategy: Send + Sync {
    /// Delay before retry number `attempt` (zero-based), `None` once the
    /// retry budget is spent
    fn next_delay(&self, attempt: u32) -> Option<Duration>;

    fn max_retries(&self) -> u32;

    fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_retries()
    }
}

/// Constant base delay plus up to `jitter_factor` of random extra wait
#[derive(Debug, Clone)]
pub struct RateLimitBackoff {
    base_delay_secs: u64,
    max_retries: u32,
    /// 0.0 to 1.0
    jitter_factor: f64,
}

impl Default for RateLimitBackoff {
    fn default() -> Self {
        Self {
            base_delay_secs: RATE_LIMIT_DELAY_SECS,
            max_retries: DEFAULT_MAX_RETRIES,
            jitter_factor: 0.1,
        }
    }
}

impl RateLimitBackoff {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(base_delay_secs: u64, max_retries: u32, jitter_factor: f64) -> Self {
        Self {
            base_delay_secs,
            max_retries,
            jitter_factor: jitter_factor.clamp(0.0, 1.0),
        }
    }

    fn add_jitter_ms(&self) -> u64 {
        let base_delay_ms = self.base_delay_secs * 1000;
        let jitter_range_ms = (base_delay_ms as f64 * self.jitter_factor) as u64;
        if jitter_range_ms == 0 {
            return base_delay_ms;
        }

        base_delay_ms + rand::thread_rng().gen_range(0..=jitter_range_ms)
    }
}

impl RetryStrategy for RateLimitBackoff {
    fn next_delay(&self, attempt: u32) -> Option<Duration> {
        if !self.should_retry(attempt) {
            return None;
        }
        Some(Duration::from_millis(self.add_jitter_ms()))
    }

    fn max_retries(&self) -> u32 {
        self.max_retries
    }
}

/// Fixed delay retry strategy (for testing or simple cases)
#[derive(Debug, Clone)]
pub struct FixedDelay {
    delay: Duration,
    max_retries: u32,
}

impl FixedDelay {
    pub fn new(delay: Duration, max_retries: u32) -> Self {
        Self { delay, max_retries }
    }
}

impl RetryStrategy for FixedDelay {
    fn next_delay(&self, attempt: u32) -> Option<Duration> {
        if !self.should_retry(attempt) {
            return None;
        }
        Some(self.delay)
    }

    fn max_retries(&self) -> u32 {
        self.max_retries
    }
}
