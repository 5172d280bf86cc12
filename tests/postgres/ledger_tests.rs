//! Sequence ledger tests against `PostgreSQL`.

use crate::postgres::helpers::{conversation, prepare, test_runtime};
use diesel::prelude::*;
use parley::message::domain::SequenceNumber;
use parley::sequence::ports::SequenceLedger;
use pg_embedded_setup_unpriv::TestCluster;
use pg_embedded_setup_unpriv::test_support::shared_test_cluster;
use rstest::rstest;

#[rstest]
fn reservations_never_overlap(shared_test_cluster: &'static TestCluster) {
    let adapters = prepare(shared_test_cluster, "reserve");
    let key = conversation("c1");
    let rt = test_runtime();

    let first = rt
        .block_on(adapters.ledger.reserve(&key, 4))
        .expect("first reservation");
    let second = rt
        .block_on(adapters.ledger.reserve(&key, 256))
        .expect("second reservation");
    let third = rt
        .block_on(adapters.ledger.reserve(&key, 1))
        .expect("third reservation");

    assert_eq!((first.start().value(), first.end().value()), (1, 4));
    assert_eq!((second.start().value(), second.end().value()), (5, 260));
    assert_eq!((third.start().value(), third.end().value()), (261, 261));

    let state = rt
        .block_on(adapters.ledger.load(&key))
        .expect("load")
        .expect("row exists after reserve");
    assert_eq!(state.issued_seq().value(), 261);
    assert_eq!(state.max_seq().value(), 0);
}

#[rstest]
fn concurrent_reservations_are_disjoint(shared_test_cluster: &'static TestCluster) {
    let adapters = prepare(shared_test_cluster, "reserve_concurrent");
    let key = conversation("c1");
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(4)
        .enable_all()
        .build()
        .expect("runtime");

    let mut numbers: Vec<u64> = rt.block_on(async {
        let ledger = std::sync::Arc::new(adapters.ledger);
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let ledger = std::sync::Arc::clone(&ledger);
                let key = key.clone();
                tokio::spawn(async move { ledger.reserve(&key, 10).await })
            })
            .collect();
        let mut numbers = Vec::new();
        for handle in handles {
            let segment = handle
                .await
                .expect("task should not panic")
                .expect("reservation");
            numbers.extend(segment.start().value()..=segment.end().value());
        }
        numbers
    });

    numbers.sort_unstable();
    assert_eq!(numbers, (1..=80).collect::<Vec<_>>());
}

#[rstest]
fn raises_never_lower_a_watermark(shared_test_cluster: &'static TestCluster) {
    let adapters = prepare(shared_test_cluster, "raise");
    let key = conversation("c1");
    let rt = test_runtime();

    rt.block_on(async {
        let ledger = &adapters.ledger;
        ledger
            .raise_max(&key, SequenceNumber::new(10))
            .await
            .expect("raise max");
        ledger
            .raise_max(&key, SequenceNumber::new(3))
            .await
            .expect("lower max is ignored");
        ledger
            .raise_issued(&key, SequenceNumber::new(5))
            .await
            .expect("lower issued is ignored");
        ledger
            .raise_min(&key, SequenceNumber::new(4))
            .await
            .expect("raise min");
        ledger
            .raise_min(&key, SequenceNumber::new(2))
            .await
            .expect("lower min is ignored");
    });

    let state = rt
        .block_on(adapters.ledger.load(&key))
        .expect("load")
        .expect("row exists");
    assert_eq!(state.issued_seq().value(), 10);
    assert_eq!(state.max_seq().value(), 10);
    assert_eq!(state.min_seq().value(), 4);
}

#[rstest]
fn raise_min_is_clamped_to_max(shared_test_cluster: &'static TestCluster) {
    let adapters = prepare(shared_test_cluster, "raise_min_clamp");
    let key = conversation("c1");
    let rt = test_runtime();

    rt.block_on(adapters.ledger.raise_max(&key, SequenceNumber::new(6)))
        .expect("raise max");
    rt.block_on(adapters.ledger.raise_min(&key, SequenceNumber::new(50)))
        .expect("raise min");

    let state = rt
        .block_on(adapters.ledger.load(&key))
        .expect("load")
        .expect("row exists");
    assert_eq!(state.min_seq().value(), 6);
}

#[rstest]
fn reservation_continues_above_committed_watermark(shared_test_cluster: &'static TestCluster) {
    let adapters = prepare(shared_test_cluster, "reserve_after_commit");
    let key = conversation("c1");
    let rt = test_runtime();

    rt.block_on(adapters.ledger.raise_max(&key, SequenceNumber::new(41)))
        .expect("raise max");
    let segment = rt
        .block_on(adapters.ledger.reserve(&key, 2))
        .expect("reservation");

    assert_eq!(segment.start().value(), 42);
    assert_eq!(segment.end().value(), 43);
}

#[rstest]
fn unknown_conversation_loads_as_absent(shared_test_cluster: &'static TestCluster) {
    let adapters = prepare(shared_test_cluster, "load_absent");
    let rt = test_runtime();

    let state = rt
        .block_on(adapters.ledger.load(&conversation("nowhere")))
        .expect("load");

    assert!(state.is_none());
}

#[rstest]
fn schema_rejects_out_of_order_watermarks(shared_test_cluster: &'static TestCluster) {
    let adapters = prepare(shared_test_cluster, "watermark_check");
    let key = conversation("c1");
    let rt = test_runtime();
    rt.block_on(adapters.ledger.raise_max(&key, SequenceNumber::new(5)))
        .expect("raise max");

    let mut conn = adapters.pool.get().expect("connection");
    let result = diesel::sql_query(
        "UPDATE conversation_sequences SET issued_seq = 1 WHERE conversation_id = 'c1'",
    )
    .execute(&mut conn);

    assert!(matches!(
        result,
        Err(diesel::result::Error::DatabaseError(
            diesel::result::DatabaseErrorKind::CheckViolation,
            _
        ))
    ));
}
