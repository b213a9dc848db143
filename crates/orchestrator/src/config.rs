use std::time::Duration;

use jobwatch_client::config::{env_or, ConfigError};

use crate::backoff::BackoffConfig;

/// Poll cadences and initial-load retry policy.
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Period of the full refresh of every category.
    pub baseline_interval: Duration,
    /// Period of the full refresh while any job is live.
    pub live_interval: Duration,
    /// Period of the per-job status taps; `None` disables taps.
    pub tap_interval: Option<Duration>,
    /// Retries of the initial load after the first attempt.
    pub initial_retries: u32,
    pub initial_backoff: BackoffConfig,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            baseline_interval: Duration::from_secs(30),
            live_interval: Duration::from_secs(5),
            tap_interval: Some(Duration::from_secs(1)),
            initial_retries: 2,
            initial_backoff: BackoffConfig::default(),
        }
    }
}

impl PollConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                           | Default |
    /// |-----------------------------------|---------|
    /// | `JOBWATCH_BASELINE_INTERVAL_SECS` | `30`    |
    /// | `JOBWATCH_LIVE_INTERVAL_SECS`     | `5`     |
    /// | `JOBWATCH_TAP_INTERVAL_MS`        | `1000`  |
    /// | `JOBWATCH_INITIAL_RETRIES`        | `2`     |
    /// | `JOBWATCH_INITIAL_BACKOFF_SECS`   | `2`     |
    ///
    /// A tap interval of `0` disables progress taps. Zero cycle intervals
    /// are rejected.
    pub fn from_env() -> Result<Self, ConfigError> {
        let baseline_secs: u64 = env_or("JOBWATCH_BASELINE_INTERVAL_SECS", 30)?;
        let live_secs: u64 = env_or("JOBWATCH_LIVE_INTERVAL_SECS", 5)?;
        let tap_ms: u64 = env_or("JOBWATCH_TAP_INTERVAL_MS", 1000)?;
        let initial_retries: u32 = env_or("JOBWATCH_INITIAL_RETRIES", 2)?;
        let backoff_secs: u64 = env_or("JOBWATCH_INITIAL_BACKOFF_SECS", 2)?;

        if baseline_secs == 0 {
            return Err(ConfigError::Invalid {
                var: "JOBWATCH_BASELINE_INTERVAL_SECS",
                value: "0".into(),
            });
        }
        if live_secs == 0 {
            return Err(ConfigError::Invalid {
                var: "JOBWATCH_LIVE_INTERVAL_SECS",
                value: "0".into(),
            });
        }

        Ok(Self {
            baseline_interval: Duration::from_secs(baseline_secs),
            live_interval: Duration::from_secs(live_secs),
            tap_interval: (tap_ms > 0).then(|| Duration::from_millis(tap_ms)),
            initial_retries,
            initial_backoff: BackoffConfig {
                initial_delay: Duration::from_secs(backoff_secs),
                ..BackoffConfig::default()
            },
        })
    }

    /// Same configuration without progress taps.
    pub fn without_taps(mut self) -> Self {
        self.tap_interval = None;
        self
    }
}
