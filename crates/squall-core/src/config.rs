use std::time::Duration;

/// Timings of the serve loops. Each call kind has its own bound.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServeConfig {
    /// Sleep after an empty or failed poll.
    pub poll_interval: Duration,
    pub fetch_timeout: Duration,
    pub operation_timeout: Duration,
    pub list_timeout: Duration,
    pub health_interval: Duration,
    /// Bound on one HealthCheck or Describe call.
    pub health_timeout: Duration,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            fetch_timeout: Duration::from_secs(5),
            operation_timeout: Duration::from_secs(5 * 60),
            list_timeout: Duration::from_secs(30),
            health_interval: Duration::from_secs(5 * 60),
            health_timeout: Duration::from_secs(30),
        }
    }
}
