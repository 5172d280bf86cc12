//! In-memory implementation of the `MessageStore` port.
//!
//! Provides a simple, thread-safe store for tests and single-process
//! deployments. All three uniqueness constraints are checked and applied
//! under one write lock, mirroring a database insert.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::message::{
    domain::{
        ClientMessageId, ConversationId, Message, SenderId, SequenceNumber, ServerMessageId,
        TenantId,
    },
    error::MessageStoreError,
    ports::store::{MessageStore, StoreResult},
};

type ClientKey = (TenantId, SenderId, ClientMessageId);
type ConversationKey = (TenantId, ConversationId);

#[derive(Debug, Default)]
struct StoreState {
    messages: HashMap<ServerMessageId, Message>,
    by_client: HashMap<ClientKey, ServerMessageId>,
    by_conversation: HashMap<ConversationKey, BTreeMap<SequenceNumber, ServerMessageId>>,
}

/// In-memory implementation of [`MessageStore`].
///
/// Thread-safe via internal [`RwLock`].
///
/// # Example
///
/// ```
/// use parley::message::adapters::memory::InMemoryMessageStore;
///
/// let store = InMemoryMessageStore::new();
/// assert!(store.is_empty());
/// ```
#[derive(Debug, Default, Clone)]
pub struct InMemoryMessageStore {
    state: Arc<RwLock<StoreState>>,
}

impl InMemoryMessageStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored messages.
    ///
    /// Returns `0` if the internal lock is poisoned.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state
            .read()
            .map(|guard| guard.messages.len())
            .unwrap_or(0)
    }

    /// Returns `true` if no messages are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn poisoned<E: std::fmt::Display>(err: E) -> MessageStoreError {
        MessageStoreError::unavailable(format!("lock poisoned: {err}"))
    }
}

fn client_key(message: &Message) -> ClientKey {
    (
        message.tenant_id().clone(),
        message.sender_id().clone(),
        message.client_message_id().clone(),
    )
}

fn conversation_key(message: &Message) -> ConversationKey {
    (
        message.tenant_id().clone(),
        message.conversation_id().clone(),
    )
}

#[async_trait]
impl MessageStore for InMemoryMessageStore {
    async fn insert(&self, message: &Message) -> StoreResult<()> {
        let mut guard = self.state.write().map_err(Self::poisoned)?;

        let by_client = client_key(message);
        if guard.by_client.contains_key(&by_client) {
            return Err(MessageStoreError::DuplicateClientMessage {
                tenant_id: by_client.0,
                sender_id: by_client.1,
                client_message_id: by_client.2,
            });
        }

        if guard.messages.contains_key(&message.server_id()) {
            return Err(MessageStoreError::DuplicateServerId(message.server_id()));
        }

        let by_conversation = conversation_key(message);
        let sequence_taken = guard
            .by_conversation
            .get(&by_conversation)
            .is_some_and(|sequences| sequences.contains_key(&message.sequence()));
        if sequence_taken {
            return Err(MessageStoreError::DuplicateSequence {
                tenant_id: by_conversation.0,
                conversation_id: by_conversation.1,
                sequence: message.sequence(),
            });
        }

        guard.by_client.insert(by_client, message.server_id());
        guard
            .by_conversation
            .entry(by_conversation)
            .or_default()
            .insert(message.sequence(), message.server_id());
        guard.messages.insert(message.server_id(), message.clone());
        Ok(())
    }

    async fn find_by_client_message(
        &self,
        tenant_id: &TenantId,
        sender_id: &SenderId,
        client_message_id: &ClientMessageId,
    ) -> StoreResult<Option<Message>> {
        let guard = self.state.read().map_err(Self::poisoned)?;
        let key = (
            tenant_id.clone(),
            sender_id.clone(),
            client_message_id.clone(),
        );
        Ok(guard
            .by_client
            .get(&key)
            .and_then(|id| guard.messages.get(id))
            .cloned())
    }

    async fn find_by_server_id(&self, server_id: ServerMessageId) -> StoreResult<Option<Message>> {
        let guard = self.state.read().map_err(Self::poisoned)?;
        Ok(guard.messages.get(&server_id).cloned())
    }

    async fn max_sequence(
        &self,
        tenant_id: &TenantId,
        conversation_id: &ConversationId,
    ) -> StoreResult<Option<SequenceNumber>> {
        let guard = self.state.read().map_err(Self::poisoned)?;
        let key = (tenant_id.clone(), conversation_id.clone());
        Ok(guard
            .by_conversation
            .get(&key)
            .and_then(|sequences| sequences.keys().next_back().copied()))
    }

    async fn find_after(
        &self,
        tenant_id: &TenantId,
        conversation_id: &ConversationId,
        after: SequenceNumber,
        limit: usize,
    ) -> StoreResult<Vec<Message>> {
        let guard = self.state.read().map_err(Self::poisoned)?;
        let key = (tenant_id.clone(), conversation_id.clone());
        let Some(sequences) = guard.by_conversation.get(&key) else {
            return Ok(Vec::new());
        };

        Ok(sequences
            .range(after.next()..)
            .take(limit)
            .filter_map(|(_, id)| guard.messages.get(id).cloned())
            .collect())
    }
}
