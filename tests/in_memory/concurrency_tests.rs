//! Many tasks saving into one conversation at once.

use std::collections::HashSet;
use std::sync::Arc;

use parley::message::domain::SequenceNumber;
use parley::sequence::domain::ConversationKey;
use rstest::rstest;

use crate::in_memory::helpers::{Ingestion, conversation, ingestion, request};

/// Tests that concurrent distinct sends get distinct sequence numbers.
#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_sends_get_distinct_sequences(
    ingestion: Ingestion,
    conversation: ConversationKey,
) {
    let Ingestion {
        orchestrator,
        store,
        ..
    } = ingestion;
    let orchestrator = Arc::new(orchestrator);

    let handles: Vec<_> = (0..48)
        .map(|n| {
            let orchestrator = Arc::clone(&orchestrator);
            tokio::spawn(async move {
                orchestrator
                    .save_message(request(&format!("client-{n}"), "hello"))
                    .await
            })
        })
        .collect();

    let mut sequences = HashSet::new();
    for handle in handles {
        let meta = handle
            .await
            .expect("task should not panic")
            .expect("save should succeed");
        assert!(sequences.insert(meta.sequence), "sequence reused");
    }

    assert_eq!(store.len(), 48);
    let highest = sequences.iter().copied().max().expect("at least one save");
    let state = orchestrator
        .allocator()
        .watermarks(&conversation)
        .await
        .expect("watermarks")
        .expect("ledger row");
    assert_eq!(state.max_seq(), highest);
    assert!(state.issued_seq() >= highest);
}

/// Tests that concurrent resends of one message store it exactly once.
#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_resends_store_once(ingestion: Ingestion) {
    let Ingestion {
        orchestrator,
        store,
        ..
    } = ingestion;
    let orchestrator = Arc::new(orchestrator);

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let orchestrator = Arc::clone(&orchestrator);
            tokio::spawn(async move { orchestrator.save_message(request("abc", "hello")).await })
        })
        .collect();

    let mut outcomes = Vec::new();
    for handle in handles {
        outcomes.push(handle.await.expect("task should not panic"));
    }

    let successes: Vec<_> = outcomes.iter().filter_map(|o| o.as_ref().ok()).collect();
    let first = successes.first().copied().expect("at least one save wins");
    assert!(successes.iter().all(|meta| *meta == first));
    assert!(
        outcomes
            .iter()
            .filter_map(|o| o.as_ref().err())
            .all(|err| err.is_retryable()),
        "losers may only see retryable errors"
    );
    assert_eq!(store.len(), 1);
    assert!(first.sequence >= SequenceNumber::new(1));
}
