//! Low-latency cache of the segment each conversation is drawing from.

use std::time::Duration;

use async_trait::async_trait;

use crate::sequence::{
    domain::{ConversationKey, InstallOutcome, Segment, TakeOutcome},
    error::CacheError,
};

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Port for the segment cache.
///
/// Entries may disappear at any moment (eviction, restart, TTL); the
/// allocator treats a missing entry as a cue to reserve a new segment.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SegmentCache: Send + Sync {
    /// Atomically claims `need` numbers from the cached segment.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if the cache cannot be reached.
    async fn take(&self, key: &ConversationKey, need: u64) -> CacheResult<TakeOutcome>;

    /// Installs a freshly reserved segment with the given time to live.
    ///
    /// The install is a compare-and-set: it only replaces an entry whose
    /// `end` lies below `segment.start()`.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if the cache cannot be reached.
    async fn install(
        &self,
        key: &ConversationKey,
        segment: Segment,
        ttl: Duration,
    ) -> CacheResult<InstallOutcome>;

    /// Drops the cached segment, if any.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if the cache cannot be reached.
    async fn invalidate(&self, key: &ConversationKey) -> CacheResult<()>;
}
