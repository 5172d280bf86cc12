//! Diesel schema for the sequence ledger.

diesel::table! {
    /// One row of watermarks per conversation.
    conversation_sequences (tenant_id, conversation_id) {
        /// Owning tenant.
        #[max_length = 255]
        tenant_id -> Varchar,
        /// Conversation identifier.
        #[max_length = 255]
        conversation_id -> Varchar,
        /// Highest number ever reserved.
        issued_seq -> Int8,
        /// Highest number known committed.
        max_seq -> Int8,
        /// Lowest retained number.
        min_seq -> Int8,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}
