//! The stored message record and the metadata returned to callers.
//!
//! Messages are immutable after insertion. Edits and redactions belong to an
//! external collaborator.

use super::{
    ClientMessageId, ConversationId, Fingerprint, Payload, SenderId, SequenceNumber,
    ServerMessageId, TenantId,
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Who sent a message, where, and under which client identifier.
///
/// The origin is fixed by the transport layer before the ingestion core sees
/// the request and is shared by every attempt to store the same logical
/// message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageOrigin {
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Target conversation.
    pub conversation_id: ConversationId,
    /// Authenticated sender.
    pub sender_id: SenderId,
    /// Client-supplied deduplication identifier.
    pub client_message_id: ClientMessageId,
}

impl MessageOrigin {
    /// Creates an origin from its parts.
    #[must_use]
    pub const fn new(
        tenant_id: TenantId,
        conversation_id: ConversationId,
        sender_id: SenderId,
        client_message_id: ClientMessageId,
    ) -> Self {
        Self {
            tenant_id,
            conversation_id,
            sender_id,
            client_message_id,
        }
    }
}

/// A message durably stored in a conversation.
///
/// # Invariants
///
/// - `(tenant, conversation, sequence)` is unique
/// - `(tenant, sender, client_message_id)` is unique
/// - `server_id` is unique
/// - the record never changes after insertion
///
/// # Examples
///
/// ```
/// use parley::message::domain::{
///     ClientMessageId, ConversationId, Fingerprint, Message, MessageOrigin, Payload, SenderId,
///     SequenceNumber, ServerMessageId, TenantId,
/// };
/// use mockable::DefaultClock;
///
/// let origin = MessageOrigin::new(
///     TenantId::new("t1").expect("tenant"),
///     ConversationId::new("c1").expect("conversation"),
///     SenderId::new("u1").expect("sender"),
///     ClientMessageId::new("abc").expect("client id"),
/// );
/// let payload = Payload::from("hello");
/// let fingerprint = Fingerprint::of(&payload);
/// let message = Message::new(
///     origin,
///     ServerMessageId::new(),
///     SequenceNumber::new(1),
///     payload,
///     fingerprint,
///     &DefaultClock,
/// );
/// assert_eq!(message.sequence().value(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    origin: MessageOrigin,
    server_id: ServerMessageId,
    sequence: SequenceNumber,
    payload: Payload,
    fingerprint: Fingerprint,
    created_at: DateTime<Utc>,
}

impl Message {
    /// Creates a message stamped with the clock's current time.
    #[must_use]
    pub fn new(
        origin: MessageOrigin,
        server_id: ServerMessageId,
        sequence: SequenceNumber,
        payload: Payload,
        fingerprint: Fingerprint,
        clock: &impl Clock,
    ) -> Self {
        Self::from_persisted(
            origin,
            server_id,
            sequence,
            payload,
            fingerprint,
            clock.utc(),
        )
    }

    /// Reconstructs a message loaded from storage.
    #[must_use]
    pub const fn from_persisted(
        origin: MessageOrigin,
        server_id: ServerMessageId,
        sequence: SequenceNumber,
        payload: Payload,
        fingerprint: Fingerprint,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            origin,
            server_id,
            sequence,
            payload,
            fingerprint,
            created_at,
        }
    }

    /// Returns the message origin.
    #[must_use]
    pub const fn origin(&self) -> &MessageOrigin {
        &self.origin
    }

    /// Returns the tenant identifier.
    #[must_use]
    pub const fn tenant_id(&self) -> &TenantId {
        &self.origin.tenant_id
    }

    /// Returns the conversation identifier.
    #[must_use]
    pub const fn conversation_id(&self) -> &ConversationId {
        &self.origin.conversation_id
    }

    /// Returns the sender identifier.
    #[must_use]
    pub const fn sender_id(&self) -> &SenderId {
        &self.origin.sender_id
    }

    /// Returns the client-supplied message identifier.
    #[must_use]
    pub const fn client_message_id(&self) -> &ClientMessageId {
        &self.origin.client_message_id
    }

    /// Returns the server-assigned identifier.
    #[must_use]
    pub const fn server_id(&self) -> ServerMessageId {
        self.server_id
    }

    /// Returns the position within the conversation.
    #[must_use]
    pub const fn sequence(&self) -> SequenceNumber {
        self.sequence
    }

    /// Returns the payload.
    #[must_use]
    pub const fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Returns the payload fingerprint.
    #[must_use]
    pub const fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }

    /// Returns the insertion timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the acknowledgement metadata for this message.
    #[must_use]
    pub const fn meta(&self) -> MessageMeta {
        MessageMeta {
            server_id: self.server_id,
            sequence: self.sequence,
            created_at: self.created_at,
        }
    }
}

/// Result of a successful save, handed to the delivery collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageMeta {
    /// Server-assigned identifier.
    pub server_id: ServerMessageId,
    /// Position within the conversation.
    pub sequence: SequenceNumber,
    /// Insertion timestamp.
    pub created_at: DateTime<Utc>,
}
