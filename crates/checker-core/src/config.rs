use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration shared by every item check of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckerConfig {
    /// Hard wall-clock limit for a single probe process (default: 60000 ms).
    pub timeout: Duration,
    /// User agent sent when an item does not carry its own.
    pub user_agent: Option<String>,
    /// Path or name of the probing binary.
    pub probe_path: String,
    /// Maximum number of probe processes running at once during a batch check.
    pub max_concurrent_checks: usize,
    /// HTTP timeout for fetching a remote playlist.
    pub fetch_timeout: Duration,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(60_000),
            user_agent: None,
            probe_path: "ffprobe".to_string(),
            max_concurrent_checks: 4,
            fetch_timeout: Duration::from_secs(60),
        }
    }
}

impl CheckerConfig {
    pub fn with_timeout(mut self, ms: u64) -> Self {
        self.timeout = Duration::from_millis(ms);
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        let user_agent = user_agent.into();
        self.user_agent = if user_agent.is_empty() {
            None
        } else {
            Some(user_agent)
        };
        self
    }

    pub fn with_probe_path(mut self, path: impl Into<String>) -> Self {
        self.probe_path = path.into();
        self
    }

    pub fn with_max_concurrent_checks(mut self, max: usize) -> Self {
        self.max_concurrent_checks = max.max(1);
        self
    }

    pub fn with_fetch_timeout(mut self, ms: u64) -> Self {
        self.fetch_timeout = Duration::from_millis(ms);
        self
    }
}
