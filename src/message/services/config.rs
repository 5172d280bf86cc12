//! Commit orchestrator configuration.

use std::time::Duration;

use crate::retry::RetryPolicy;

/// Settings for [`CommitOrchestrator`](super::CommitOrchestrator).
///
/// # Examples
///
/// ```
/// use parley::message::services::CommitConfig;
/// use std::time::Duration;
///
/// let config = CommitConfig::default();
/// assert_eq!(config.dependency_timeout, Duration::from_secs(2));
/// assert_eq!(config.max_sequence_conflicts, 3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitConfig {
    /// Backoff applied to transient dependency failures.
    pub retry: RetryPolicy,
    /// Upper bound on any single cache, ledger, or store call.
    pub dependency_timeout: Duration,
    /// Sequence collisions tolerated before the save fails.
    pub max_sequence_conflicts: u32,
    /// Server identifier collisions tolerated before the save fails.
    pub max_server_id_collisions: u32,
}

impl Default for CommitConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            dependency_timeout: Duration::from_secs(2),
            max_sequence_conflicts: 3,
            max_server_id_collisions: 3,
        }
    }
}

impl CommitConfig {
    /// Default limits with retries that do not sleep.
    ///
    /// Useful for test suites.
    #[must_use]
    pub fn for_tests() -> Self {
        Self {
            retry: RetryPolicy::immediate(3),
            ..Self::default()
        }
    }

    /// Returns a copy with a different retry policy.
    #[must_use]
    pub const fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Returns a copy with a different per-call timeout.
    #[must_use]
    pub const fn with_dependency_timeout(mut self, timeout: Duration) -> Self {
        self.dependency_timeout = timeout;
        self
    }
}
