//! Engine configuration loaded from environment variables.

use std::time::Duration;

/// Tunables for the orchestrator and its collaborators.
///
/// All fields have defaults matching the providers' documented limits;
/// override via environment variables for local experiments.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Concurrent submission slots (default: `3`).
    pub max_concurrent_submissions: usize,
    /// Delay between poll ticks (default: `2000` ms).
    pub poll_interval: Duration,
    /// Per-request transport timeout (default: `30` s).
    pub request_timeout: Duration,
    /// Backoff before the first retry (default: `1000` ms).
    pub retry_base_delay: Duration,
    /// Retries after the initial attempt (default: `3`).
    pub max_retries: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_concurrent_submissions: 3,
            poll_interval: Duration::from_millis(2000),
            request_timeout: Duration::from_secs(30),
            retry_base_delay: Duration::from_millis(1000),
            max_retries: 3,
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                     | Default |
    /// |-----------------------------|---------|
    /// | `LUMEN_MAX_CONCURRENT`      | `3`     |
    /// | `LUMEN_POLL_INTERVAL_MS`    | `2000`  |
    /// | `LUMEN_REQUEST_TIMEOUT_SECS`| `30`    |
    /// | `LUMEN_RETRY_BASE_MS`       | `1000`  |
    /// | `LUMEN_MAX_RETRIES`         | `3`     |
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_concurrent_submissions: env_parse(
                "LUMEN_MAX_CONCURRENT",
                defaults.max_concurrent_submissions,
            ),
            poll_interval: Duration::from_millis(env_parse(
                "LUMEN_POLL_INTERVAL_MS",
                defaults.poll_interval.as_millis() as u64,
            )),
            request_timeout: Duration::from_secs(env_parse(
                "LUMEN_REQUEST_TIMEOUT_SECS",
                defaults.request_timeout.as_secs(),
            )),
            retry_base_delay: Duration::from_millis(env_parse(
                "LUMEN_RETRY_BASE_MS",
                defaults.retry_base_delay.as_millis() as u64,
            )),
            max_retries: env_parse("LUMEN_MAX_RETRIES", defaults.max_retries),
        }
    }
}

/// Parse an env var, panicking on malformed values rather than running
/// with a silently wrong configuration.
fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw
            .parse()
            .unwrap_or_else(|_| panic!("{key} must be a valid {}", std::any::type_name::<T>())),
        Err(_) => default,
    }
}
