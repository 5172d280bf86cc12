//! Error types for message persistence.
//!
//! Uses `thiserror` for ergonomic error handling with typed variants
//! that can be inspected by callers. The three duplicate variants map
//! one-to-one onto the store's uniqueness constraints so the commit
//! orchestrator can pick the matching recovery path.

use super::domain::{
    ClientMessageId, ConversationId, SenderId, SequenceNumber, ServerMessageId, TenantId,
};
use crate::retry::TransientError;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during message persistence.
#[derive(Debug, Clone, Error)]
pub enum MessageStoreError {
    /// A message already occupies this position in the conversation.
    #[error("duplicate sequence number {sequence} in conversation {tenant_id}/{conversation_id}")]
    DuplicateSequence {
        /// Owning tenant.
        tenant_id: TenantId,
        /// The conversation containing the conflict.
        conversation_id: ConversationId,
        /// The conflicting sequence number.
        sequence: SequenceNumber,
    },

    /// The sender already stored a message under this client identifier.
    #[error("duplicate client message id {client_message_id} from sender {sender_id}")]
    DuplicateClientMessage {
        /// Owning tenant.
        tenant_id: TenantId,
        /// The sender that reused the client identifier.
        sender_id: SenderId,
        /// The conflicting client identifier.
        client_message_id: ClientMessageId,
    },

    /// A message with this server identifier already exists.
    #[error("duplicate server message id: {0}")]
    DuplicateServerId(ServerMessageId),

    /// The store could not be reached; the call may be repeated.
    #[error("message store unavailable: {0}")]
    Unavailable(String),

    /// A store call exceeded its deadline.
    #[error("message store operation {operation} timed out after {after:?}")]
    Timeout {
        /// The operation that timed out.
        operation: &'static str,
        /// The deadline that elapsed.
        after: Duration,
    },

    /// A database error occurred.
    #[error("database error: {0}")]
    Database(Arc<dyn std::error::Error + Send + Sync>),

    /// A serialization error occurred.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl MessageStoreError {
    /// Creates a database error from any error type.
    #[must_use]
    pub fn database(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Database(Arc::new(err))
    }

    /// Creates a serialization error.
    #[must_use]
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization(message.into())
    }

    /// Creates an unavailability error.
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }
}

impl TransientError for MessageStoreError {
    fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Timeout { .. })
    }

    fn timed_out(operation: &'static str, after: Duration) -> Self {
        Self::Timeout { operation, after }
    }
}
