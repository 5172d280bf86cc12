//! The save workflow end to end over in-memory adapters.

use std::io;

use parley::message::{
    domain::{ConversationId, Payload, SequenceNumber, TenantId},
    ports::MessageStore,
    services::{SaveMessageError, SaveMessageRequest},
};
use rstest::rstest;
use tokio::runtime::Runtime;

use crate::in_memory::helpers::{Ingestion, ingestion, origin, request, runtime};

/// Tests the canonical send, resend, misuse, and next-send sequence.
#[rstest]
fn send_resend_conflict_and_next(runtime: io::Result<Runtime>, ingestion: Ingestion) {
    let rt = runtime.expect("runtime creation");
    let orchestrator = &ingestion.orchestrator;

    let first = rt
        .block_on(orchestrator.save_message(request("abc", "hello")))
        .expect("first send");
    assert_eq!(first.sequence, SequenceNumber::new(1));

    let resend = rt
        .block_on(orchestrator.save_message(request("abc", "hello")))
        .expect("resend");
    assert_eq!(resend, first);

    let misuse = rt.block_on(orchestrator.save_message(request("abc", "world")));
    assert!(matches!(
        misuse,
        Err(SaveMessageError::IdempotencyConflict { .. })
    ));

    let next = rt
        .block_on(orchestrator.save_message(request("xyz", "hello")))
        .expect("next send");
    assert_eq!(next.sequence, SequenceNumber::new(2));
    assert_ne!(next.server_id, first.server_id);
    assert_eq!(ingestion.store.len(), 2);
}

/// Tests that each conversation numbers its messages independently.
#[rstest]
fn conversations_are_numbered_independently(runtime: io::Result<Runtime>, ingestion: Ingestion) {
    let rt = runtime.expect("runtime creation");
    let orchestrator = &ingestion.orchestrator;

    for client_id in ["a", "b", "c"] {
        rt.block_on(orchestrator.save_message(request(client_id, "hello")))
            .expect("save into c1");
    }
    let elsewhere = rt
        .block_on(orchestrator.save_message(SaveMessageRequest::new(
            origin("c2", "u1", "d"),
            Payload::from("hello"),
        )))
        .expect("save into c2");

    assert_eq!(elsewhere.sequence, SequenceNumber::new(1));
}

/// Tests that the same client identifier from two senders is two messages.
#[rstest]
fn client_ids_are_scoped_per_sender(runtime: io::Result<Runtime>, ingestion: Ingestion) {
    let rt = runtime.expect("runtime creation");
    let orchestrator = &ingestion.orchestrator;

    let from_u1 = rt
        .block_on(orchestrator.save_message(request("abc", "hello")))
        .expect("u1 send");
    let from_u2 = rt
        .block_on(orchestrator.save_message(SaveMessageRequest::new(
            origin("c1", "u2", "abc"),
            Payload::from("world"),
        )))
        .expect("u2 send");

    assert_ne!(from_u1.server_id, from_u2.server_id);
    assert_eq!(from_u2.sequence, SequenceNumber::new(2));
}

/// Tests that losing the segment cache leaves gaps but keeps order.
#[rstest]
fn cache_loss_leaves_gaps_but_keeps_order(runtime: io::Result<Runtime>, ingestion: Ingestion) {
    let rt = runtime.expect("runtime creation");
    let orchestrator = &ingestion.orchestrator;

    let before = rt
        .block_on(orchestrator.save_message(request("a", "one")))
        .expect("before loss");
    ingestion.cache.clear();
    let after = rt
        .block_on(orchestrator.save_message(request("b", "two")))
        .expect("after loss");

    assert!(after.sequence > before.sequence);

    let tenant = TenantId::new("t1").expect("tenant");
    let conversation = ConversationId::new("c1").expect("conversation");
    let history = rt
        .block_on(
            ingestion
                .store
                .find_after(&tenant, &conversation, SequenceNumber::ZERO, 10),
        )
        .expect("history");
    let order: Vec<&str> = history
        .iter()
        .map(|message| message.client_message_id().as_str())
        .collect();
    assert_eq!(order, vec!["a", "b"]);
}

/// Tests that a resend after the dedup window still finds the stored row.
#[rstest]
fn late_resend_is_answered_from_the_stored_row(
    runtime: io::Result<Runtime>,
    ingestion: Ingestion,
) {
    let rt = runtime.expect("runtime creation");
    let orchestrator = &ingestion.orchestrator;

    let first = rt
        .block_on(orchestrator.save_message(request("abc", "hello")))
        .expect("first send");
    ingestion
        .clock
        .advance(ingestion.index.ttls().committed + ingestion.index.ttls().pending);

    let late = rt
        .block_on(orchestrator.save_message(request("abc", "hello")))
        .expect("late resend is answered from the stored row");
    assert_eq!(late.server_id, first.server_id);
    assert_eq!(late.sequence, first.sequence);
    assert_eq!(ingestion.store.len(), 1);
}
