//! Conversion helpers for the `PostgreSQL` message store.
//!
//! Provides functions for converting between database rows and domain types.

use super::super::models::MessageRow;
use crate::message::{
    domain::{
        ClientMessageId, ConversationId, Fingerprint, Message, MessageOrigin, Payload, SenderId,
        SequenceNumber, ServerMessageId, TenantId,
    },
    error::MessageStoreError,
    ports::store::StoreResult,
};

/// Wraps a serialization/conversion error for consistent error handling.
pub(super) fn ser_err<E: std::fmt::Display>(e: E) -> MessageStoreError {
    MessageStoreError::serialization(e.to_string())
}

/// Converts a database row to a domain Message.
///
/// # Errors
///
/// Returns [`MessageStoreError::Serialization`] if a stored identifier or
/// fingerprint fails domain validation or the sequence number is negative.
pub(super) fn row_to_message(row: MessageRow) -> StoreResult<Message> {
    let origin = MessageOrigin::new(
        TenantId::new(row.tenant_id).map_err(ser_err)?,
        ConversationId::new(row.conversation_id).map_err(ser_err)?,
        SenderId::new(row.sender_id).map_err(ser_err)?,
        ClientMessageId::new(row.client_message_id).map_err(ser_err)?,
    );
    let sequence = u64::try_from(row.seq).map_err(ser_err)?;
    let fingerprint = Fingerprint::new(row.fingerprint).map_err(ser_err)?;

    Ok(Message::from_persisted(
        origin,
        ServerMessageId::from_uuid(row.server_id),
        SequenceNumber::new(sequence),
        Payload::new(row.payload),
        fingerprint,
        row.created_at,
    ))
}

/// Converts a sequence number into its `BIGINT` column value.
pub(super) fn sequence_to_column(sequence: SequenceNumber) -> StoreResult<i64> {
    i64::try_from(sequence.value()).map_err(ser_err)
}
