//! Single-counter allocator: one atomic increment per allocation, seeded
//! from the ledger under a short lock when the counter is missing.

use std::sync::Arc;

use mockable::Clock;
use tracing::{debug, instrument, warn};

use super::config::CounterAllocatorConfig;
use crate::message::domain::SequenceNumber;
use crate::sequence::{
    domain::{Allocation, ConversationKey, SequenceRange},
    error::AllocationError,
    ports::{CounterCache, LockToken, SequenceLedger},
};

/// Allocates sequence numbers from a plain per-conversation counter.
///
/// Cheaper to operate than [`SegmentAllocator`](super::SegmentAllocator)
/// but every allocation hits the cache, and a lost counter is reseeded from
/// the ledger's high-water mark.
#[derive(Clone)]
pub struct CounterAllocator {
    ledger: Arc<dyn SequenceLedger>,
    counters: Arc<dyn CounterCache>,
    clock: Arc<dyn Clock + Send + Sync>,
    config: CounterAllocatorConfig,
}

impl CounterAllocator {
    /// Creates an allocator over the given ledger and counter cache.
    #[must_use]
    pub fn new(
        ledger: Arc<dyn SequenceLedger>,
        counters: Arc<dyn CounterCache>,
        clock: Arc<dyn Clock + Send + Sync>,
        config: CounterAllocatorConfig,
    ) -> Self {
        Self {
            ledger,
            counters,
            clock,
            config,
        }
    }

    /// Returns the allocator's configuration.
    #[must_use]
    pub const fn config(&self) -> &CounterAllocatorConfig {
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
    /// the counter could not be seeded in time.
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
            if let Some(allocation) = self.try_increment(key, need).await? {
                return Ok(allocation);
            }
            debug!(attempt, "counter missing; cold start");
            self.cold_start(key).await?;
        }

        // The last cold start may have seeded the counter.
        if let Some(allocation) = self.try_increment(key, need).await? {
            return Ok(allocation);
        }

        Err(AllocationError::RetriesExhausted {
            key: key.clone(),
            attempts: max_attempts,
        })
    }

    /// Drops the cached counter so the next allocation reseeds it.
    ///
    /// # Errors
    ///
    /// Returns [`AllocationError::Cache`] if the cache cannot be reached.
    pub async fn invalidate(&self, key: &ConversationKey) -> Result<(), AllocationError> {
        self.counters.invalidate(key).await?;
        Ok(())
    }

    async fn try_increment(
        &self,
        key: &ConversationKey,
        need: u64,
    ) -> Result<Option<Allocation>, AllocationError> {
        let incremented = self
            .counters
            .increment_existing(key, need, self.config.counter_ttl)
            .await?;
        Ok(incremented.map(|last| {
            let start = SequenceNumber::new(last.saturating_sub(need) + 1);
            Allocation::new(SequenceRange::new(start, need), self.clock.utc())
        }))
    }

    async fn cold_start(&self, key: &ConversationKey) -> Result<(), AllocationError> {
        let token = LockToken::new();
        let locked = self
            .counters
            .try_lock(key, token, self.config.lock_ttl)
            .await?;
        if !locked {
            tokio::time::sleep(self.config.lock_poll_interval).await;
            return Ok(());
        }

        let seeded = self.seed(key).await;
        match self.counters.unlock(key, token).await {
            Ok(true) => {}
            Ok(false) => warn!(%token, "cold-start lock expired before release"),
            Err(err) => warn!(%token, error = %err, "failed to release cold-start lock"),
        }
        seeded
    }

    async fn seed(&self, key: &ConversationKey) -> Result<(), AllocationError> {
        let floor = self
            .ledger
            .load(key)
            .await?
            .map_or(SequenceNumber::ZERO, |state| state.high_water_mark());
        let seeded = self
            .counters
            .set_if_absent(key, floor.value(), self.config.counter_ttl)
            .await?;
        if seeded {
            debug!(floor = floor.value(), "seeded counter from ledger");
        } else {
            debug!(
                floor = floor.value(),
                "counter already seeded by a concurrent allocator"
            );
        }
        Ok(())
    }
}
