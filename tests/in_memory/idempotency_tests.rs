//! Idempotency record lifecycles against the in-memory index.

use std::io;
use std::time::Duration;

use parley::idempotency::{
    adapters::memory::InMemoryIdempotencyIndex,
    domain::{EnsurePendingOutcome, IdempotencyKey, IdempotencyStatus},
    error::IdempotencyError,
    ports::IdempotencyIndex,
};
use parley::message::domain::{Fingerprint, Payload, ServerMessageId};
use rstest::{fixture, rstest};
use tokio::runtime::Runtime;

use crate::in_memory::helpers::{ManualClock, origin, runtime};

#[fixture]
fn key() -> IdempotencyKey {
    IdempotencyKey::for_origin(&origin("c1", "u1", "abc"))
}

#[fixture]
fn fingerprint() -> Fingerprint {
    Fingerprint::of(&Payload::from("hello"))
}

/// Tests that an abandoned claim frees the key once its lifetime ends.
#[rstest]
fn pending_claim_expires(
    runtime: io::Result<Runtime>,
    key: IdempotencyKey,
    fingerprint: Fingerprint,
) {
    let rt = runtime.expect("runtime creation");
    let clock = ManualClock::new();
    let index = InMemoryIdempotencyIndex::new(clock.clone());
    let first = ServerMessageId::new();

    let created = rt
        .block_on(index.ensure_pending(&key, &fingerprint, first))
        .expect("claim");
    assert_eq!(created, EnsurePendingOutcome::Created { server_id: first });

    clock.advance(index.ttls().pending + Duration::from_secs(1));
    let second = ServerMessageId::new();
    let reclaimed = rt
        .block_on(index.ensure_pending(&key, &fingerprint, second))
        .expect("reclaim");
    assert_eq!(reclaimed, EnsurePendingOutcome::Created { server_id: second });
}

/// Tests that a committed record outlives the pending lifetime and then
/// expires.
#[rstest]
fn committed_record_lives_for_the_dedup_window(
    runtime: io::Result<Runtime>,
    key: IdempotencyKey,
    fingerprint: Fingerprint,
) {
    let rt = runtime.expect("runtime creation");
    let clock = ManualClock::new();
    let index = InMemoryIdempotencyIndex::new(clock.clone());
    let server_id = ServerMessageId::new();
    rt.block_on(index.ensure_pending(&key, &fingerprint, server_id))
        .expect("claim");
    rt.block_on(index.mark_committed(&key, server_id, &fingerprint))
        .expect("promote");

    clock.advance(index.ttls().pending * 2);
    let record = rt
        .block_on(index.get(&key))
        .expect("lookup")
        .expect("record should still be live");
    assert_eq!(record.status, IdempotencyStatus::Committed);

    clock.advance(index.ttls().committed);
    assert!(rt.block_on(index.get(&key)).expect("lookup").is_none());
}

/// Tests that rollback neither touches committed records nor lengthens
/// pending ones.
#[rstest]
fn rollback_only_shortens_pending_records(
    runtime: io::Result<Runtime>,
    key: IdempotencyKey,
    fingerprint: Fingerprint,
) {
    let rt = runtime.expect("runtime creation");
    let clock = ManualClock::new();
    let index = InMemoryIdempotencyIndex::new(clock.clone());
    let server_id = ServerMessageId::new();
    rt.block_on(index.ensure_pending(&key, &fingerprint, server_id))
        .expect("claim");
    rt.block_on(index.mark_committed(&key, server_id, &fingerprint))
        .expect("promote");

    rt.block_on(index.rollback_short_ttl(&key)).expect("rollback");
    clock.advance(index.ttls().rollback * 2);

    let record = rt.block_on(index.get(&key)).expect("lookup");
    assert!(record.is_some_and(|r| r.is_committed()));
}

/// Tests the compare-and-set that swaps a colliding server identifier.
#[rstest]
fn server_id_swap_requires_pending_and_matching_fingerprint(
    runtime: io::Result<Runtime>,
    key: IdempotencyKey,
    fingerprint: Fingerprint,
) {
    let rt = runtime.expect("runtime creation");
    let index = InMemoryIdempotencyIndex::new(ManualClock::new());
    let original = ServerMessageId::new();
    let replacement = ServerMessageId::new();
    rt.block_on(index.ensure_pending(&key, &fingerprint, original))
        .expect("claim");

    let other = Fingerprint::of(&Payload::from("world"));
    let rejected = rt
        .block_on(index.update_server_id_if_pending(&key, &other, replacement))
        .expect("swap attempt");
    assert!(!rejected);

    let swapped = rt
        .block_on(index.update_server_id_if_pending(&key, &fingerprint, replacement))
        .expect("swap");
    assert!(swapped);

    rt.block_on(index.mark_committed(&key, replacement, &fingerprint))
        .expect("promote");
    let after_commit = rt
        .block_on(index.update_server_id_if_pending(&key, &fingerprint, original))
        .expect("swap attempt");
    assert!(!after_commit);
}

/// Tests that a committed record refuses a different server identifier.
#[rstest]
fn committed_record_rejects_a_second_server_id(
    runtime: io::Result<Runtime>,
    key: IdempotencyKey,
    fingerprint: Fingerprint,
) {
    let rt = runtime.expect("runtime creation");
    let index = InMemoryIdempotencyIndex::new(ManualClock::new());
    let winner = ServerMessageId::new();
    rt.block_on(index.ensure_pending(&key, &fingerprint, winner))
        .expect("claim");
    rt.block_on(index.mark_committed(&key, winner, &fingerprint))
        .expect("promote");

    rt.block_on(index.mark_committed(&key, winner, &fingerprint))
        .expect("promoting twice to the same id is harmless");
    let result = rt.block_on(index.mark_committed(&key, ServerMessageId::new(), &fingerprint));
    assert!(matches!(
        result,
        Err(IdempotencyError::CommittedMismatch { committed, .. }) if committed == winner
    ));
}
