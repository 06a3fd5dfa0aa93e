use std::time::Duration;

/// What to do when some package tasks fail
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Publish nothing and report the failures as an error
    #[default]
    Abort,
    /// Publish the packages that succeeded and list the failures in the report
    Continue,
}

/// Installer configuration
#[derive(Clone, Debug)]
pub struct InstallConfig {
    /// Maximum concurrent package tasks; `None` runs one task per package at once
    pub concurrency: Option<usize>,
    /// Per-archive fetch deadline
    pub fetch_timeout: Option<Duration>,
    pub failure_policy: FailurePolicy,
    /// Target directory name inside the project
    pub target_dir: String,
}

impl Default for InstallConfig {
    fn default() -> Self {
        Self {
            concurrency: None,
            fetch_timeout: None,
            failure_policy: FailurePolicy::Abort,
            target_dir: "vendor".to_string(),
        }
    }
}

impl InstallConfig {
    /// Cap concurrent tasks; 0 removes the cap
    #[must_use]
    pub fn with_concurrency(mut self, max_concurrency: usize) -> Self {
        self.concurrency = (max_concurrency > 0).then_some(max_concurrency);
        self
    }

    /// Set the fetch deadline
    #[must_use]
    pub fn with_fetch_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    #[must_use]
    pub fn with_target_dir(mut self, name: impl Into<String>) -> Self {
        self.target_dir = name.into();
        self
    }
}
