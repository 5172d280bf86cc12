//! Shared fixtures for in-memory ingestion tests.

use std::io;
use std::sync::Arc;

use mockable::DefaultClock;
use parley::idempotency::adapters::memory::InMemoryIdempotencyIndex;
use parley::message::{
    adapters::memory::InMemoryMessageStore,
    domain::{ClientMessageId, ConversationId, MessageOrigin, Payload, SenderId, TenantId},
    services::{CommitConfig, CommitOrchestrator, SaveMessageRequest},
};
use parley::sequence::{
    adapters::memory::{InMemoryCounterCache, InMemorySegmentCache, InMemorySequenceLedger},
    domain::ConversationKey,
    services::{CounterAllocatorConfig, SegmentAllocatorConfig, SequenceAllocator},
};
use rstest::fixture;
use tokio::runtime::Runtime;

pub use crate::test_clock::ManualClock;

/// Orchestrator wired to in-memory adapters.
pub type MemoryOrchestrator = CommitOrchestrator<
    InMemoryMessageStore,
    InMemoryIdempotencyIndex<ManualClock>,
    ManualClock,
>;

/// Provides a tokio runtime for async operations in tests.
///
/// # Errors
///
/// Returns an error if the runtime cannot be created.
#[fixture]
pub fn runtime() -> io::Result<Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
}

/// Every adapter behind one orchestrator, kept for inspection.
pub struct Ingestion {
    /// The orchestrator under test.
    pub orchestrator: MemoryOrchestrator,
    /// Stored messages.
    pub store: Arc<InMemoryMessageStore>,
    /// Idempotency records.
    pub index: Arc<InMemoryIdempotencyIndex<ManualClock>>,
    /// Ledger watermarks.
    pub ledger: Arc<InMemorySequenceLedger<DefaultClock>>,
    /// Segment cache, for simulating cache loss.
    pub cache: Arc<InMemorySegmentCache<DefaultClock>>,
    /// Clock driving idempotency expiry.
    pub clock: ManualClock,
}

/// Provides an ingestion pipeline using the segment allocator.
#[fixture]
pub fn ingestion() -> Ingestion {
    let clock = ManualClock::new();
    let store = Arc::new(InMemoryMessageStore::new());
    let index = Arc::new(InMemoryIdempotencyIndex::new(clock.clone()));
    let ledger = Arc::new(InMemorySequenceLedger::new(DefaultClock));
    let cache = Arc::new(InMemorySegmentCache::new(DefaultClock));
    let allocator = SequenceAllocator::segmented(
        ledger.clone(),
        cache.clone(),
        Arc::new(DefaultClock),
        SegmentAllocatorConfig::default(),
    );
    let orchestrator = CommitOrchestrator::new(
        Arc::clone(&store),
        Arc::clone(&index),
        allocator,
        Arc::new(clock.clone()),
    )
    .with_config(CommitConfig::for_tests());
    Ingestion {
        orchestrator,
        store,
        index,
        ledger,
        cache,
        clock,
    }
}

/// Builds a single-counter allocator over fresh in-memory adapters.
pub fn counter_allocator() -> (
    SequenceAllocator,
    Arc<InMemorySequenceLedger<DefaultClock>>,
    Arc<InMemoryCounterCache<DefaultClock>>,
) {
    let ledger = Arc::new(InMemorySequenceLedger::new(DefaultClock));
    let counters = Arc::new(InMemoryCounterCache::new(DefaultClock));
    let allocator = SequenceAllocator::single_counter(
        ledger.clone(),
        counters.clone(),
        Arc::new(DefaultClock),
        CounterAllocatorConfig::default(),
    );
    (allocator, ledger, counters)
}

/// Provides the conversation most tests write into.
#[fixture]
pub fn conversation() -> ConversationKey {
    ConversationKey::new(
        TenantId::new("t1").expect("tenant"),
        ConversationId::new("c1").expect("conversation"),
    )
}

/// Builds an origin in tenant `t1`.
pub fn origin(conversation: &str, sender: &str, client_id: &str) -> MessageOrigin {
    MessageOrigin::new(
        TenantId::new("t1").expect("tenant"),
        ConversationId::new(conversation).expect("conversation"),
        SenderId::new(sender).expect("sender"),
        ClientMessageId::new(client_id).expect("client id"),
    )
}

/// Builds a save request for conversation `c1` from sender `u1`.
pub fn request(client_id: &str, body: &str) -> SaveMessageRequest {
    SaveMessageRequest::new(origin("c1", "u1", client_id), Payload::from(body))
}
