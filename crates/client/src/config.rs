use std::str::FromStr;
use std::time::Duration;

/// Errors raised while reading configuration from the environment.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} has an invalid value: {value:?}")]
    Invalid { var: &'static str, value: String },
}

/// Read `var` and parse it, falling back to `default` when unset.
pub fn env_or<T: FromStr>(var: &'static str, default: T) -> Result<T, ConfigError> {
    match std::env::var(var) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid { var, value: raw }),
        Err(_) => Ok(default),
    }
}

/// Connection settings for the job service.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the job service, without a trailing slash.
    pub api_url: String,
    /// Deadline for job listings.
    pub list_timeout: Duration,
    /// Deadline for cancel and delete.
    pub command_timeout: Duration,
    /// Deadline for every other call.
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8080".to_string(),
            list_timeout: Duration::from_secs(10),
            command_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(60),
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                         | Default                 |
    /// |---------------------------------|-------------------------|
    /// | `JOBWATCH_API_URL`              | `http://localhost:8080` |
    /// | `JOBWATCH_LIST_TIMEOUT_SECS`    | `10`                    |
    /// | `JOBWATCH_COMMAND_TIMEOUT_SECS` | `10`                    |
    /// | `JOBWATCH_REQUEST_TIMEOUT_SECS` | `60`                    |
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_url =
            std::env::var("JOBWATCH_API_URL").unwrap_or_else(|_| "http://localhost:8080".into());

        Ok(Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            list_timeout: Duration::from_secs(env_or("JOBWATCH_LIST_TIMEOUT_SECS", 10)?),
            command_timeout: Duration::from_secs(env_or("JOBWATCH_COMMAND_TIMEOUT_SECS", 10)?),
            request_timeout: Duration::from_secs(env_or("JOBWATCH_REQUEST_TIMEOUT_SECS", 60)?),
        })
    }

    /// Same configuration pointed at another service.
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into().trim_end_matches('/').to_string();
        self
    }
}
