//! Message store tests against `PostgreSQL`, including the mapping from
//! real unique-index violations onto duplicate errors.

use crate::postgres::helpers::{message, prepare, test_runtime};
use parley::message::{
    domain::{ConversationId, SequenceNumber, ServerMessageId, TenantId},
    error::MessageStoreError,
    ports::MessageStore,
};
use pg_embedded_setup_unpriv::TestCluster;
use pg_embedded_setup_unpriv::test_support::shared_test_cluster;
use rstest::rstest;

#[rstest]
fn insert_then_find_by_both_keys(shared_test_cluster: &'static TestCluster) {
    let adapters = prepare(shared_test_cluster, "store_find");
    let stored = message("u1", "abc", ServerMessageId::new(), 1);
    let rt = test_runtime();

    rt.block_on(adapters.store.insert(&stored))
        .expect("insert should succeed");

    let by_client = rt
        .block_on(adapters.store.find_by_client_message(
            stored.tenant_id(),
            stored.sender_id(),
            stored.client_message_id(),
        ))
        .expect("lookup")
        .expect("message should exist");
    assert_eq!(by_client.server_id(), stored.server_id());
    assert_eq!(by_client.sequence().value(), 1);
    assert_eq!(by_client.payload(), stored.payload());
    assert_eq!(by_client.fingerprint(), stored.fingerprint());

    let by_id = rt
        .block_on(adapters.store.find_by_server_id(stored.server_id()))
        .expect("lookup")
        .expect("message should exist");
    assert_eq!(by_id.client_message_id(), stored.client_message_id());
}

#[rstest]
fn server_id_violation_maps_to_duplicate_server_id(shared_test_cluster: &'static TestCluster) {
    let adapters = prepare(shared_test_cluster, "dup_server_id");
    let server_id = ServerMessageId::new();
    let rt = test_runtime();
    rt.block_on(adapters.store.insert(&message("u1", "a", server_id, 1)))
        .expect("first insert");

    let err = rt
        .block_on(adapters.store.insert(&message("u2", "b", server_id, 2)))
        .expect_err("server id is taken");

    assert!(matches!(err, MessageStoreError::DuplicateServerId(id) if id == server_id));
}

#[rstest]
fn sequence_violation_maps_to_duplicate_sequence(shared_test_cluster: &'static TestCluster) {
    let adapters = prepare(shared_test_cluster, "dup_sequence");
    let rt = test_runtime();
    rt.block_on(
        adapters
            .store
            .insert(&message("u1", "a", ServerMessageId::new(), 4)),
    )
    .expect("first insert");

    let err = rt
        .block_on(
            adapters
                .store
                .insert(&message("u2", "b", ServerMessageId::new(), 4)),
        )
        .expect_err("sequence is taken");

    assert!(matches!(
        err,
        MessageStoreError::DuplicateSequence { sequence, .. } if sequence.value() == 4
    ));
}

#[rstest]
fn client_message_violation_maps_to_duplicate_client_message(
    shared_test_cluster: &'static TestCluster,
) {
    let adapters = prepare(shared_test_cluster, "dup_client_message");
    let rt = test_runtime();
    rt.block_on(
        adapters
            .store
            .insert(&message("u1", "abc", ServerMessageId::new(), 1)),
    )
    .expect("first insert");

    let err = rt
        .block_on(
            adapters
                .store
                .insert(&message("u1", "abc", ServerMessageId::new(), 2)),
        )
        .expect_err("client id is taken");

    assert!(matches!(
        err,
        MessageStoreError::DuplicateClientMessage { ref client_message_id, .. }
            if client_message_id.as_str() == "abc"
    ));
}

#[rstest]
fn history_is_ordered_by_sequence(shared_test_cluster: &'static TestCluster) {
    let adapters = prepare(shared_test_cluster, "history");
    let tenant = TenantId::new("t1").expect("tenant");
    let conversation = ConversationId::new("c1").expect("conversation");
    let rt = test_runtime();

    for (client_id, seq) in [("a", 3), ("b", 9), ("c", 5), ("d", 1)] {
        rt.block_on(
            adapters
                .store
                .insert(&message("u1", client_id, ServerMessageId::new(), seq)),
        )
        .expect("insert");
    }

    let max = rt
        .block_on(adapters.store.max_sequence(&tenant, &conversation))
        .expect("query");
    assert_eq!(max, Some(SequenceNumber::new(9)));

    let after = rt
        .block_on(
            adapters
                .store
                .find_after(&tenant, &conversation, SequenceNumber::new(1), 2),
        )
        .expect("query");
    let seqs: Vec<u64> = after.iter().map(|m| m.sequence().value()).collect();
    assert_eq!(seqs, vec![3, 5]);
}

#[rstest]
fn empty_conversation_has_no_max_sequence(shared_test_cluster: &'static TestCluster) {
    let adapters = prepare(shared_test_cluster, "empty_max");
    let rt = test_runtime();

    let max = rt
        .block_on(adapters.store.max_sequence(
            &TenantId::new("t1").expect("tenant"),
            &ConversationId::new("c1").expect("conversation"),
        ))
        .expect("query");

    assert_eq!(max, None);
}
