//! Exponential backoff for the initial load.
//!
//! The first load of the registry retries failed categories with
//! increasing delays before escalating. Background cycles never back off;
//! they simply try again on their next tick.

use std::time::Duration;

/// Tunable parameters for the exponential-backoff strategy.
#[derive(Debug, Clone)]
pub struct BackoffConfig {
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Upper bound on the delay between attempts.
    pub max_delay: Duration,
    /// Factor by which the delay grows after each failure.
    pub multiplier: f64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(60),
            multiplier: 2.0,
        }
    }
}

/// Calculate the next backoff delay from the current delay and config.
///
/// The result is clamped to [`BackoffConfig::max_delay`].
pub fn next_delay(current: Duration, config: &BackoffConfig) -> Duration {
    let next_ms = (current.as_millis() as f64 * config.multiplier) as u64;
    Duration::from_millis(next_ms).min(config.max_delay)
}

/// The delays waited before each of `retries` retries.
pub fn schedule(config: &BackoffConfig, retries: u32) -> Vec<Duration> {
    let mut delays = Vec::with_capacity(retries as usize);
    let mut delay = config.initial_delay.min(config.max_delay);
    for _ in 0..retries {
        delays.push(delay);
        delay = next_delay(delay, config);
    }
    delays
}
