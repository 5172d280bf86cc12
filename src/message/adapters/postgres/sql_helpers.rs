//! SQL execution helpers for the `PostgreSQL` message store.
//!
//! Contains the insert operation and the mapping from constraint violations
//! to the semantic duplicate errors the commit orchestrator recovers from.

use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};

use super::super::models::NewMessageRow;
use super::super::schema::messages;
use crate::message::{
    domain::Message, error::MessageStoreError, ports::store::StoreResult,
};

/// Primary key on `server_id`.
pub const SERVER_ID_CONSTRAINT: &str = "messages_pkey";

/// Unique `(tenant_id, conversation_id, seq)`.
pub const SEQUENCE_CONSTRAINT: &str = "messages_conversation_seq_unique";

/// Unique `(tenant_id, sender_id, client_message_id)`.
pub const CLIENT_MESSAGE_CONSTRAINT: &str = "messages_sender_client_message_unique";

/// Inserts a message into the database.
///
/// Relies on the unique indexes for correctness; there is no pre-check, so
/// concurrent inserts race only at the constraint.
pub(super) fn insert_message(
    conn: &mut PgConnection,
    row: &NewMessageRow,
    message: &Message,
) -> StoreResult<()> {
    diesel::insert_into(messages::table)
        .values(row)
        .execute(conn)
        .map_err(|e| map_insert_error(e, message))?;
    Ok(())
}

/// Maps Diesel errors to semantic store errors.
pub(super) fn map_insert_error(err: DieselError, message: &Message) -> MessageStoreError {
    let DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) = &err else {
        return map_query_error(err);
    };

    info.constraint_name()
        .and_then(|constraint| map_constraint_to_duplicate_error(constraint, message))
        .unwrap_or_else(|| MessageStoreError::database(err))
}

/// Maps a constraint name to a semantic duplicate error.
///
/// Returns `None` for constraints this store does not own.
#[must_use]
pub fn map_constraint_to_duplicate_error(
    constraint: &str,
    message: &Message,
) -> Option<MessageStoreError> {
    match constraint {
        SERVER_ID_CONSTRAINT => Some(MessageStoreError::DuplicateServerId(message.server_id())),
        SEQUENCE_CONSTRAINT => Some(MessageStoreError::DuplicateSequence {
            tenant_id: message.tenant_id().clone(),
            conversation_id: message.conversation_id().clone(),
            sequence: message.sequence(),
        }),
        CLIENT_MESSAGE_CONSTRAINT => Some(MessageStoreError::DuplicateClientMessage {
            tenant_id: message.tenant_id().clone(),
            sender_id: message.sender_id().clone(),
            client_message_id: message.client_message_id().clone(),
        }),
        _ => None,
    }
}

/// Maps non-constraint Diesel errors, classifying the retryable ones.
pub(super) fn map_query_error(err: DieselError) -> MessageStoreError {
    match err {
        DieselError::DatabaseError(
            DatabaseErrorKind::SerializationFailure | DatabaseErrorKind::ClosedConnection,
            ref info,
        ) => MessageStoreError::unavailable(info.message().to_owned()),
        _ => MessageStoreError::database(err),
    }
}
