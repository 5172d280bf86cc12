//! Diesel model types for message persistence.
//!
//! These types map database rows to Rust structs using Diesel's derive macros.
//! They serve as the boundary between the database and domain layers.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use super::schema::messages;
use crate::message::{domain::Message, error::MessageStoreError};

/// Database row representation of a message.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = messages)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct MessageRow {
    /// Server-assigned message identifier.
    pub server_id: Uuid,
    /// Owning tenant.
    pub tenant_id: String,
    /// Conversation the message belongs to.
    pub conversation_id: String,
    /// Authenticated sender.
    pub sender_id: String,
    /// Client-supplied deduplication identifier.
    pub client_message_id: String,
    /// Position within the conversation.
    pub seq: i64,
    /// Opaque message body.
    pub payload: Vec<u8>,
    /// Content fingerprint.
    pub fingerprint: String,
    /// Insertion timestamp.
    pub created_at: DateTime<Utc>,
}

/// Data for inserting a new message.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = messages)]
pub struct NewMessageRow {
    /// Server-assigned message identifier.
    pub server_id: Uuid,
    /// Owning tenant.
    pub tenant_id: String,
    /// Conversation the message belongs to.
    pub conversation_id: String,
    /// Authenticated sender.
    pub sender_id: String,
    /// Client-supplied deduplication identifier.
    pub client_message_id: String,
    /// Position within the conversation.
    pub seq: i64,
    /// Opaque message body.
    pub payload: Vec<u8>,
    /// Content fingerprint.
    pub fingerprint: String,
    /// Insertion timestamp.
    pub created_at: DateTime<Utc>,
}

impl NewMessageRow {
    /// Creates a `NewMessageRow` from a domain `Message`.
    ///
    /// # Errors
    ///
    /// Returns [`MessageStoreError::Serialization`] if the sequence number
    /// does not fit in a `BIGINT`.
    pub fn try_from_domain(message: &Message) -> Result<Self, MessageStoreError> {
        let seq = i64::try_from(message.sequence().value())
            .map_err(|e| MessageStoreError::serialization(e.to_string()))?;

        Ok(Self {
            server_id: message.server_id().into_inner(),
            tenant_id: message.tenant_id().as_str().to_owned(),
            conversation_id: message.conversation_id().as_str().to_owned(),
            sender_id: message.sender_id().as_str().to_owned(),
            client_message_id: message.client_message_id().as_str().to_owned(),
            seq,
            payload: message.payload().as_bytes().to_vec(),
            fingerprint: message.fingerprint().as_str().to_owned(),
            created_at: message.created_at(),
        })
    }
}
