//! Plain counter cache used by the single-counter allocator.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use super::segment_cache::CacheResult;
use crate::sequence::domain::ConversationKey;

/// Owner token for the cold-start lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LockToken(Uuid);

impl LockToken {
    /// Creates a random token.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for LockToken {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LockToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Port for a per-conversation counter with a cold-start lock.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CounterCache: Send + Sync {
    /// Adds `by` to an existing counter and returns the new value.
    ///
    /// Returns `None` without creating anything when the counter is absent.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`](crate::sequence::error::CacheError) if the
    /// cache cannot be reached.
    async fn increment_existing(
        &self,
        key: &ConversationKey,
        by: u64,
        ttl: Duration,
    ) -> CacheResult<Option<u64>>;

    /// Seeds the counter unless one already exists. Returns `true` if set.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`](crate::sequence::error::CacheError) if the
    /// cache cannot be reached.
    async fn set_if_absent(&self, key: &ConversationKey, value: u64, ttl: Duration)
    -> CacheResult<bool>;

    /// Takes the cold-start lock if it is free. Returns `true` on success.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`](crate::sequence::error::CacheError) if the
    /// cache cannot be reached.
    async fn try_lock(
        &self,
        key: &ConversationKey,
        token: LockToken,
        ttl: Duration,
    ) -> CacheResult<bool>;

    /// Releases the lock if `token` still owns it. Returns `true` if
    /// released.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`](crate::sequence::error::CacheError) if the
    /// cache cannot be reached.
    async fn unlock(&self, key: &ConversationKey, token: LockToken) -> CacheResult<bool>;

    /// Drops the counter, if any.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`](crate::sequence::error::CacheError) if the
    /// cache cannot be reached.
    async fn invalidate(&self, key: &ConversationKey) -> CacheResult<()>;
}
