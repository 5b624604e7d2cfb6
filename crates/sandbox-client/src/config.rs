use std::time::Duration;

pub(crate) const DEFAULT_SUBMIT_TIMEOUT: Duration = Duration::from_secs(5);
pub(crate) const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(3);
pub(crate) const DEFAULT_HEALTH_TIMEOUT: Duration = Duration::from_secs(3);

/// Resource caps sent with every submission to contain runaway code.
///
/// Time limits are in seconds, memory and stack in KB, matching the wire
/// contract.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceLimits {
    pub cpu_time_secs: f64,
    pub wall_time_secs: f64,
    pub memory_kb: u32,
    pub stack_kb: u32,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            cpu_time_secs: 2.0,
            wall_time_secs: 5.0,
            memory_kb: 128_000,
            stack_kb: 64_000,
        }
    }
}

/// Connection settings for one execution service instance.
#[derive(Debug, Clone)]
pub struct SandboxConfig {
    pub base_url: String,
    /// Timeout for one submit call.
    pub submit_timeout: Duration,
    /// Timeout for one poll call (shorter: polls are cheap and repeated).
    pub poll_timeout: Duration,
    /// Timeout for the liveness probe.
    pub health_timeout: Duration,
    pub limits: ResourceLimits,
}

impl SandboxConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            submit_timeout: DEFAULT_SUBMIT_TIMEOUT,
            poll_timeout: DEFAULT_POLL_TIMEOUT,
            health_timeout: DEFAULT_HEALTH_TIMEOUT,
            limits: ResourceLimits::default(),
        }
    }
}
