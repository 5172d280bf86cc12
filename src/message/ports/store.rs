//! Store port for message persistence.
//!
//! Defines the abstract interface for storing and retrieving messages,
//! allowing different persistence implementations (`PostgreSQL`, in-memory, etc.).

use crate::message::{
    domain::{
        ClientMessageId, ConversationId, Message, SenderId, SequenceNumber, ServerMessageId,
        TenantId,
    },
    error::MessageStoreError,
};
use async_trait::async_trait;

/// Result type for message store operations.
pub type StoreResult<T> = Result<T, MessageStoreError>;

/// Port for durable message persistence.
///
/// # Implementation Notes
///
/// Implementations must enforce, atomically with the insert:
/// - `(tenant, conversation, sequence)` is unique
/// - `(tenant, sender, client_message_id)` is unique
/// - `server_id` is unique
///
/// and report a violation through the matching duplicate variant of
/// [`MessageStoreError`]. Messages are never updated after insertion.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Inserts a new message.
    ///
    /// This is the commit point of a save: once it returns `Ok`, the message
    /// is durable and discoverable.
    ///
    /// # Errors
    ///
    /// Returns [`MessageStoreError::DuplicateSequence`],
    /// [`MessageStoreError::DuplicateClientMessage`], or
    /// [`MessageStoreError::DuplicateServerId`] on a uniqueness violation,
    /// and a transient or database error when the store fails.
    async fn insert(&self, message: &Message) -> StoreResult<()>;

    /// Finds the message a sender stored under a client identifier.
    ///
    /// # Errors
    ///
    /// Returns [`MessageStoreError`] if the query fails.
    async fn find_by_client_message(
        &self,
        tenant_id: &TenantId,
        sender_id: &SenderId,
        client_message_id: &ClientMessageId,
    ) -> StoreResult<Option<Message>>;

    /// Finds a message by its server identifier.
    ///
    /// # Errors
    ///
    /// Returns [`MessageStoreError`] if the query fails.
    async fn find_by_server_id(&self, server_id: ServerMessageId) -> StoreResult<Option<Message>>;

    /// Returns the highest sequence number stored for a conversation.
    ///
    /// Returns `None` for a conversation without messages.
    ///
    /// # Errors
    ///
    /// Returns [`MessageStoreError`] if the query fails.
    async fn max_sequence(
        &self,
        tenant_id: &TenantId,
        conversation_id: &ConversationId,
    ) -> StoreResult<Option<SequenceNumber>>;

    /// Returns up to `limit` messages with a sequence number greater than
    /// `after`, ordered by sequence number.
    ///
    /// # Errors
    ///
    /// Returns [`MessageStoreError`] if the query fails.
    async fn find_after(
        &self,
        tenant_id: &TenantId,
        conversation_id: &ConversationId,
        after: SequenceNumber,
        limit: usize,
    ) -> StoreResult<Vec<Message>>;
}
