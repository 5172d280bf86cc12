//! The allocator interface the commit path depends on.

use std::sync::Arc;

use mockable::Clock;
use tracing::{instrument, warn};

use super::{CounterAllocator, CounterAllocatorConfig, SegmentAllocator, SegmentAllocatorConfig};
use crate::message::domain::SequenceNumber;
use crate::sequence::{
    domain::{Allocation, ConversationKey, ConversationSequenceState},
    error::AllocationError,
    ports::{CounterCache, SegmentCache, SequenceLedger},
};

/// Result type for allocator operations.
pub type AllocationResult<T> = Result<T, AllocationError>;

/// Per-conversation sequence allocator.
///
/// Both strategies share the ledger semantics: numbers handed out for a
/// key are strictly increasing and never overlap, and the commit watermark
/// only rises.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use mockable::DefaultClock;
/// use parley::message::domain::{ConversationId, TenantId};
/// use parley::sequence::adapters::memory::{InMemorySegmentCache, InMemorySequenceLedger};
/// use parley::sequence::domain::ConversationKey;
/// use parley::sequence::services::{SegmentAllocatorConfig, SequenceAllocator};
///
/// # tokio_test_block_on(async {
/// let allocator = SequenceAllocator::segmented(
///     Arc::new(InMemorySequenceLedger::new(DefaultClock)),
///     Arc::new(InMemorySegmentCache::new(DefaultClock)),
///     Arc::new(DefaultClock),
///     SegmentAllocatorConfig::default(),
/// );
/// let key = ConversationKey::new(
///     TenantId::new("t1").expect("tenant"),
///     ConversationId::new("c1").expect("conversation"),
/// );
/// let first = allocator.allocate(&key, 1).await.expect("allocation");
/// assert_eq!(first.start().value(), 1);
/// # });
/// # fn tokio_test_block_on<F: std::future::Future>(future: F) -> F::Output {
/// #     tokio::runtime::Builder::new_current_thread()
/// #         .enable_all()
/// #         .build()
/// #         .expect("runtime")
/// #         .block_on(future)
/// # }
/// ```
#[derive(Clone)]
pub enum SequenceAllocator {
    /// Segment cache backed by ledger block reservations.
    Segmented(SegmentAllocator),
    /// Plain counter seeded from the ledger.
    SingleCounter(CounterAllocator),
}

impl SequenceAllocator {
    /// Builds a segment allocator.
    #[must_use]
    pub fn segmented(
        ledger: Arc<dyn SequenceLedger>,
        cache: Arc<dyn SegmentCache>,
        clock: Arc<dyn Clock + Send + Sync>,
        config: SegmentAllocatorConfig,
    ) -> Self {
        Self::Segmented(SegmentAllocator::new(ledger, cache, clock, config))
    }

    /// Builds a single-counter allocator.
    #[must_use]
    pub fn single_counter(
        ledger: Arc<dyn SequenceLedger>,
        counters: Arc<dyn CounterCache>,
        clock: Arc<dyn Clock + Send + Sync>,
        config: CounterAllocatorConfig,
    ) -> Self {
        Self::SingleCounter(CounterAllocator::new(ledger, counters, clock, config))
    }

    /// Claims `need` consecutive numbers for `key`.
    ///
    /// # Errors
    ///
    /// Returns [`AllocationError`] when the request is empty, a dependency
    /// fails, or the attempt budget runs out.
    pub async fn allocate(
        &self,
        key: &ConversationKey,
        need: u64,
    ) -> AllocationResult<Allocation> {
        match self {
            Self::Segmented(allocator) => allocator.allocate(key, need).await,
            Self::SingleCounter(allocator) => allocator.allocate(key, need).await,
        }
    }

    /// Moves the allocator past `floor` after a sequence collision.
    ///
    /// Raises the ledger's `issued_seq` to at least `floor` and then drops
    /// the cached state, so the next allocation for `key` lands above it.
    ///
    /// # Errors
    ///
    /// Returns [`AllocationError`] if the ledger or cache fails.
    #[instrument(skip(self, key, floor), fields(key = %key, floor = floor.value()))]
    pub async fn reconcile_floor(
        &self,
        key: &ConversationKey,
        floor: SequenceNumber,
    ) -> AllocationResult<()> {
        self.ledger().raise_issued(key, floor).await?;
        match self {
            Self::Segmented(allocator) => allocator.invalidate(key).await?,
            Self::SingleCounter(allocator) => allocator.invalidate(key).await?,
        }
        warn!("allocator floor reconciled");
        Ok(())
    }

    /// Raises the commit watermark after a successful insert.
    ///
    /// # Errors
    ///
    /// Returns [`AllocationError::Ledger`] if the update fails.
    pub async fn record_committed(
        &self,
        key: &ConversationKey,
        committed: SequenceNumber,
    ) -> AllocationResult<()> {
        self.ledger().raise_max(key, committed).await?;
        Ok(())
    }

    /// Raises the retention floor once older messages have been pruned.
    ///
    /// # Errors
    ///
    /// Returns [`AllocationError::Ledger`] if the update fails.
    pub async fn record_retained_from(
        &self,
        key: &ConversationKey,
        floor: SequenceNumber,
    ) -> AllocationResult<()> {
        self.ledger().raise_min(key, floor).await?;
        Ok(())
    }

    /// Reads the ledger watermarks for `key`.
    ///
    /// # Errors
    ///
    /// Returns [`AllocationError::Ledger`] if the read fails or the stored
    /// row is inconsistent.
    pub async fn watermarks(
        &self,
        key: &ConversationKey,
    ) -> AllocationResult<Option<ConversationSequenceState>> {
        Ok(self.ledger().load(key).await?)
    }

    fn ledger(&self) -> &dyn SequenceLedger {
        match self {
            Self::Segmented(allocator) => allocator.ledger(),
            Self::SingleCounter(allocator) => allocator.ledger(),
        }
    }
}
