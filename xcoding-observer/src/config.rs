//! Observer configuration
//!
//! Every budget the observer uses is explicit here; nothing is hidden in
//! the polling loops. Defaults match an operator watching a single build.

use std::time::Duration;

use crate::error::ObserveError;

/// Observer configuration
#[derive(Debug, Clone)]
pub struct ObserverConfig {
    /// Namespace the job's unit is scheduled in
    pub namespace: String,

    /// Delay between discovery attempts
    pub poll_interval: Duration,

    /// Discovery attempts before giving up with "unit not found"
    pub max_attempts: u32,

    /// Delay between readiness checks
    pub readiness_interval: Duration,

    /// How long to wait for the container before streaming anyway
    pub readiness_timeout: Duration,

    /// Wall-clock budget for an idle log stream
    pub stream_budget: Duration,

    /// Silence tolerated before the stream budget is checked
    pub idle_slice: Duration,

    /// Container whose logs are relayed
    pub container: String,

    /// First segment of the unit label (`<job_prefix>-<job_id>-<task_name>`)
    pub job_prefix: String,

    /// Last segment of the unit label
    pub task_name: String,

    /// Abort discovery after this many consecutive hard errors.
    /// `None` counts hard errors as ordinary misses.
    pub max_consecutive_errors: Option<u32>,
}

impl ObserverConfig {
    /// Creates a configuration for a namespace with defaults
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            poll_interval: Duration::from_millis(500),
            max_attempts: 60,
            readiness_interval: Duration::from_secs(1),
            readiness_timeout: Duration::from_secs(30),
            stream_budget: Duration::from_secs(40),
            idle_slice: Duration::from_millis(200),
            container: "runner".to_string(),
            job_prefix: "build".to_string(),
            task_name: "job-1".to_string(),
            max_consecutive_errors: None,
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Recognised variables (all optional):
    /// - POD_NAMESPACE (default: xcoding)
    /// - XCODING_POLL_INTERVAL_MS (default: 500)
    /// - XCODING_MAX_ATTEMPTS (default: 60)
    /// - XCODING_READINESS_TIMEOUT (seconds, default: 30)
    /// - XCODING_STREAM_BUDGET (seconds, default: 40)
    /// - XCODING_CONTAINER (default: runner)
    pub fn from_env() -> Self {
        let mut config = Self::new(
            std::env::var("POD_NAMESPACE").unwrap_or_else(|_| "xcoding".to_string()),
        );

        if let Some(ms) = env_parse::<u64>("XCODING_POLL_INTERVAL_MS") {
            config.poll_interval = Duration::from_millis(ms);
        }
        if let Some(attempts) = env_parse::<u32>("XCODING_MAX_ATTEMPTS") {
            config.max_attempts = attempts;
        }
        if let Some(secs) = env_parse::<u64>("XCODING_READINESS_TIMEOUT") {
            config.readiness_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = env_parse::<u64>("XCODING_STREAM_BUDGET") {
            config.stream_budget = Duration::from_secs(secs);
        }
        if let Ok(container) = std::env::var("XCODING_CONTAINER") {
            config.container = container;
        }

        config
    }

    pub fn with_task(mut self, task_name: impl Into<String>) -> Self {
        self.task_name = task_name.into();
        self
    }

    pub fn with_container(mut self, container: impl Into<String>) -> Self {
        self.container = container.into();
        self
    }

    pub fn with_stream_budget(mut self, budget: Duration) -> Self {
        self.stream_budget = budget;
        self
    }

    pub fn with_fail_fast(mut self, max_consecutive_errors: u32) -> Self {
        self.max_consecutive_errors = Some(max_consecutive_errors);
        self
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<(), ObserveError> {
        let invalid = |msg: &str| Err(ObserveError::InvalidConfig(msg.to_string()));

        if self.namespace.is_empty() {
            return invalid("namespace cannot be empty");
        }
        if self.container.is_empty() {
            return invalid("container cannot be empty");
        }
        if self.job_prefix.is_empty() || self.task_name.is_empty() {
            return invalid("job_prefix and task_name cannot be empty");
        }
        if self.max_attempts == 0 {
            return invalid("max_attempts must be greater than 0");
        }
        if self.readiness_interval.is_zero() {
            return invalid("readiness_interval must be greater than 0");
        }
        if self.idle_slice.is_zero() {
            return invalid("idle_slice must be greater than 0");
        }
        if self.max_consecutive_errors == Some(0) {
            return invalid("max_consecutive_errors must be greater than 0 when set");
        }

        Ok(())
    }
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self::new("xcoding")
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.parse::<T>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ObserverConfig::default();
        assert_eq!(config.namespace, "xcoding");
        assert_eq!(config.poll_interval, Duration::from_millis(500));
        assert_eq!(config.max_attempts, 60);
        assert_eq!(config.readiness_timeout, Duration::from_secs(30));
        assert_eq!(config.container, "runner");
        assert!(config.max_consecutive_errors.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = ObserverConfig::default();
        assert!(config.validate().is_ok());

        config.max_attempts = 0;
        assert!(config.validate().is_err());
        config.max_attempts = 3;

        config.namespace = String::new();
        assert!(config.validate().is_err());
        config.namespace = "ci".to_string();

        config.max_consecutive_errors = Some(0);
        assert!(config.validate().is_err());

        let config = ObserverConfig::new("ci").with_fail_fast(5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builders() {
        let config = ObserverConfig::new("ci")
            .with_task("lint")
            .with_container("main")
            .with_stream_budget(Duration::from_secs(5));

        assert_eq!(config.task_name, "lint");
        assert_eq!(config.container, "main");
        assert_eq!(config.stream_budget, Duration::from_secs(5));
    }
}
