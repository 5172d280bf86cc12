//! Segment allocator: hands out numbers from a cached block and refills the
//! block from the ledger when it runs dry.

use std::sync::Arc;

use mockable::Clock;
use tracing::{debug, instrument};

use super::config::SegmentAllocatorConfig;
use crate::sequence::{
    domain::{Allocation, ConversationKey, SequenceRange, TakeOutcome},
    error::AllocationError,
    ports::{SegmentCache, SequenceLedger},
};

/// Allocates sequence numbers through a segment cache backed by the ledger.
///
/// The common case is a single atomic take on the cache. Only when the
/// cached segment is missing or used up does the allocator make one ledger
/// round trip for a fresh block.
#[derive(Clone)]
pub struct SegmentAllocator {
    ledger: Arc<dyn SequenceLedger>,
    cache: Arc<dyn SegmentCache>,
    clock: Arc<dyn Clock + Send + Sync>,
    config: SegmentAllocatorConfig,
}

impl SegmentAllocator {
    /// Creates an allocator over the given ledger and cache.
    #[must_use]
    pub fn new(
        ledger: Arc<dyn SequenceLedger>,
        cache: Arc<dyn SegmentCache>,
        clock: Arc<dyn Clock + Send + Sync>,
        config: SegmentAllocatorConfig,
    ) -> Self {
        Self {
            ledger,
            cache,
            clock,
            config,
        }
    }

    /// Returns the allocator's configuration.
    #[must_use]
    pub const fn config(&self) -> &SegmentAllocatorConfig {
        &self.config
    }

    pub(super) fn ledger(&self) -> &dyn SequenceLedger {
        self.ledger.as_ref()
    }

    /// Claims `need` consecutive numbers for `key`.
    ///
    /// # Errors
    ///
    /// Returns [`AllocationError::ZeroNeed`] for `need == 0`, a wrapped
    /// ledger or cache error, or [`AllocationError::RetriesExhausted`] when
    /// concurrent allocators drained every fresh segment first.
    #[instrument(skip(self, key), fields(key = %key))]
    pub async fn allocate(
        &self,
        key: &ConversationKey,
        need: u64,
    ) -> Result<Allocation, AllocationError> {
        if need == 0 {
            return Err(AllocationError::ZeroNeed);
        }

        let max_attempts = self.config.max_attempts.max(1);
        for attempt in 1..=max_attempts {
            match self.cache.take(key, need).await? {
                TakeOutcome::Taken(range) => return Ok(self.stamp(range)),
                outcome => debug!(attempt, ?outcome, "segment cache miss"),
            }

            let block = self.config.block_size.block_size(need);
            let segment = self.ledger.reserve(key, block).await?;
            let installed = self
                .cache
                .install(key, segment, self.config.segment_ttl)
                .await?;
            debug!(
                attempt,
                start = segment.start().value(),
                end = segment.end().value(),
                ?installed,
                "reserved segment from ledger"
            );

            if let TakeOutcome::Taken(range) = self.cache.take(key, need).await? {
                return Ok(self.stamp(range));
            }
        }

        Err(AllocationError::RetriesExhausted {
            key: key.clone(),
            attempts: max_attempts,
        })
    }

    /// Drops the cached segment so the next allocation reserves afresh.
    ///
    /// # Errors
    ///
    /// Returns [`AllocationError::Cache`] if the cache cannot be reached.
    pub async fn invalidate(&self, key: &ConversationKey) -> Result<(), AllocationError> {
        self.cache.invalidate(key).await?;
        Ok(())
    }

    fn stamp(&self, range: SequenceRange) -> Allocation {
        Allocation::new(range, self.clock.utc())
    }
}
