//! Diesel schema for message persistence.

diesel::table! {
    /// Ingested chat messages, one row per logical send.
    messages (server_id) {
        /// Server-assigned message identifier.
        server_id -> Uuid,
        /// Owning tenant.
        #[max_length = 255]
        tenant_id -> Varchar,
        /// Conversation the message belongs to.
        #[max_length = 255]
        conversation_id -> Varchar,
        /// Authenticated sender.
        #[max_length = 255]
        sender_id -> Varchar,
        /// Client-supplied deduplication identifier.
        #[max_length = 255]
        client_message_id -> Varchar,
        /// Position within the conversation.
        seq -> Int8,
        /// Opaque message body.
        payload -> Bytea,
        /// Content fingerprint of the payload.
        #[max_length = 128]
        fingerprint -> Varchar,
        /// Insertion timestamp.
        created_at -> Timestamptz,
    }
}
