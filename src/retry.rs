//! Bounded retry with exponential backoff for transient infrastructure
//! failures.
//!
//! Every port error type implements [`TransientError`] so services can decide
//! which failures are worth another round trip. Each attempt is bounded by a
//! timeout; an elapsed timeout is reported through the port's own error type
//! and is always transient.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Classification of port errors for retry decisions.
pub trait TransientError: Display {
    /// Returns `true` if the operation may succeed when repeated unchanged.
    fn is_transient(&self) -> bool;

    /// Builds the error reported when an attempt exceeds its deadline.
    fn timed_out(operation: &'static str, after: Duration) -> Self
    where
        Self: Sized;
}

/// Exponential backoff policy for transient failures.
///
/// # Examples
///
/// ```
/// use parley::retry::RetryPolicy;
/// use std::time::Duration;
///
/// let policy = RetryPolicy::default();
/// assert_eq!(policy.max_attempts, 3);
/// assert_eq!(policy.backoff_for(1), Duration::from_millis(50));
/// assert_eq!(policy.backoff_for(2), Duration::from_millis(100));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub initial_backoff: Duration,
    /// Factor applied to the delay after every retry.
    pub multiplier: u32,
    /// Upper bound on any single delay.
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(50),
            multiplier: 2,
            max_backoff: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Creates a policy that retries immediately.
    ///
    /// Useful for tests where wall-clock delays only slow the suite down.
    #[must_use]
    pub const fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_backoff: Duration::ZERO,
            multiplier: 1,
            max_backoff: Duration::ZERO,
        }
    }

    /// Returns the delay to wait after the given failed attempt (1-based).
    #[must_use]
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1);
        let factor = self.multiplier.saturating_pow(exponent);
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}

/// Runs a future with a deadline, mapping expiry into the caller's error.
///
/// # Errors
///
/// Returns the future's own error, or `E::timed_out` when the deadline
/// elapses first.
pub async fn with_deadline<T, E, Fut>(
    operation: &'static str,
    timeout: Duration,
    future: Fut,
) -> Result<T, E>
where
    E: TransientError,
    Fut: Future<Output = Result<T, E>>,
{
    tokio::time::timeout(timeout, future)
        .await
        .unwrap_or_else(|_| Err(E::timed_out(operation, timeout)))
}

/// Repeats an operation while it fails transiently, up to the policy's
/// attempt budget.
///
/// # Errors
///
/// Returns the last error once it is non-transient or the budget is spent.
pub async fn retry_transient<T, E, F, Fut>(
    policy: &RetryPolicy,
    timeout: Duration,
    operation: &'static str,
    mut attempt_fn: F,
) -> Result<T, E>
where
    E: TransientError,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt = 1;
    loop {
        match with_deadline(operation, timeout, attempt_fn()).await {
            Err(err) if err.is_transient() && attempt < policy.max_attempts => {
                let delay = policy.backoff_for(attempt);
                tracing::warn!(operation, attempt, ?delay, error = %err, "transient failure, retrying");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            outcome => return outcome,
        }
    }
}
