//! Sequence allocation through the public allocator API.

use std::io;

use parley::message::domain::SequenceNumber;
use parley::sequence::{domain::ConversationKey, error::AllocationError};
use rstest::rstest;
use tokio::runtime::Runtime;

use crate::in_memory::helpers::{conversation, counter_allocator, ingestion, runtime, Ingestion};

fn next(rt: &Runtime, ingestion: &Ingestion, key: &ConversationKey) -> u64 {
    rt.block_on(ingestion.orchestrator.allocator().allocate(key, 1))
        .expect("allocation should succeed")
        .start()
        .value()
}

/// Tests that a fresh conversation starts at 1 and counts upwards.
#[rstest]
fn segment_allocations_start_at_one(
    runtime: io::Result<Runtime>,
    ingestion: Ingestion,
    conversation: ConversationKey,
) {
    let rt = runtime.expect("runtime creation");
    let issued: Vec<u64> = (0..5).map(|_| next(&rt, &ingestion, &conversation)).collect();
    assert_eq!(issued, vec![1, 2, 3, 4, 5]);
    assert_eq!(ingestion.ledger.reservation_count(), 1);
}

/// Tests that losing the cache skips ahead instead of reissuing numbers.
#[rstest]
fn cache_loss_never_reissues(
    runtime: io::Result<Runtime>,
    ingestion: Ingestion,
    conversation: ConversationKey,
) {
    let rt = runtime.expect("runtime creation");
    let before: Vec<u64> = (0..3).map(|_| next(&rt, &ingestion, &conversation)).collect();
    ingestion.cache.clear();

    let after = next(&rt, &ingestion, &conversation);
    let state = rt
        .block_on(ingestion.orchestrator.allocator().watermarks(&conversation))
        .expect("watermarks")
        .expect("ledger row");

    assert!(before.iter().all(|&seq| seq < after));
    assert!(state.issued_seq().value() >= after);
    assert_eq!(ingestion.ledger.reservation_count(), 2);
}

/// Tests that a multi-number allocation is contiguous.
#[rstest]
fn batch_allocation_is_contiguous(
    runtime: io::Result<Runtime>,
    ingestion: Ingestion,
    conversation: ConversationKey,
) {
    let rt = runtime.expect("runtime creation");
    let batch = rt
        .block_on(ingestion.orchestrator.allocator().allocate(&conversation, 4))
        .expect("batch allocation");
    let numbers: Vec<u64> = batch.iter().map(|seq| seq.value()).collect();
    assert_eq!(numbers, vec![1, 2, 3, 4]);
    assert_eq!(next(&rt, &ingestion, &conversation), 5);
}

/// Tests that an empty request is rejected.
#[rstest]
fn zero_need_is_rejected(
    runtime: io::Result<Runtime>,
    ingestion: Ingestion,
    conversation: ConversationKey,
) {
    let rt = runtime.expect("runtime creation");
    let result = rt.block_on(ingestion.orchestrator.allocator().allocate(&conversation, 0));
    assert!(matches!(result, Err(AllocationError::ZeroNeed)));
}

/// Tests that watermarks only rise and the retention floor stays below the
/// commit watermark.
#[rstest]
fn watermarks_only_rise(
    runtime: io::Result<Runtime>,
    ingestion: Ingestion,
    conversation: ConversationKey,
) {
    let rt = runtime.expect("runtime creation");
    let allocator = ingestion.orchestrator.allocator();
    for _ in 0..6 {
        next(&rt, &ingestion, &conversation);
    }

    rt.block_on(allocator.record_committed(&conversation, SequenceNumber::new(6)))
        .expect("commit watermark");
    rt.block_on(allocator.record_committed(&conversation, SequenceNumber::new(2)))
        .expect("stale commit watermark");
    rt.block_on(allocator.record_retained_from(&conversation, SequenceNumber::new(50)))
        .expect("retention floor");

    let state = rt
        .block_on(allocator.watermarks(&conversation))
        .expect("watermarks")
        .expect("ledger row");
    assert_eq!(state.max_seq(), SequenceNumber::new(6));
    assert_eq!(state.min_seq(), SequenceNumber::new(6));
    assert!(state.issued_seq() >= state.max_seq());
}

/// Tests that the single counter seeds from the ledger and reseeds after
/// the counter is lost.
#[rstest]
fn counter_reseeds_from_commit_watermark(runtime: io::Result<Runtime>, conversation: ConversationKey) {
    let rt = runtime.expect("runtime creation");
    let (allocator, _ledger, counters) = counter_allocator();

    let first = rt
        .block_on(allocator.allocate(&conversation, 1))
        .expect("first allocation");
    assert_eq!(first.start().value(), 1);
    assert_eq!(counters.value(&conversation), Some(1));

    rt.block_on(allocator.record_committed(&conversation, SequenceNumber::new(9)))
        .expect("commit watermark");
    counters.clear();

    let reseeded = rt
        .block_on(allocator.allocate(&conversation, 1))
        .expect("allocation after loss");
    assert_eq!(reseeded.start().value(), 10);
}

/// Tests that a reconciled floor pushes the next allocation above it.
#[rstest]
fn reconcile_floor_moves_past_stored_numbers(
    runtime: io::Result<Runtime>,
    ingestion: Ingestion,
    conversation: ConversationKey,
) {
    let rt = runtime.expect("runtime creation");
    let allocator = ingestion.orchestrator.allocator();
    next(&rt, &ingestion, &conversation);

    rt.block_on(allocator.reconcile_floor(&conversation, SequenceNumber::new(500)))
        .expect("reconcile");

    assert!(next(&rt, &ingestion, &conversation) > 500);
}
