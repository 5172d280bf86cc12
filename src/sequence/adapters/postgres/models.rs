//! Diesel row models for the sequence ledger.

use chrono::{DateTime, Utc};
use diesel::prelude::*;

use super::schema::conversation_sequences;

/// Query result row for ledger records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = conversation_sequences)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct SequenceRow {
    /// Owning tenant.
    pub tenant_id: String,
    /// Conversation identifier.
    pub conversation_id: String,
    /// Highest number ever reserved.
    pub issued_seq: i64,
    /// Highest number known committed.
    pub max_seq: i64,
    /// Lowest retained number.
    pub min_seq: i64,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Insert model for the first reservation of a conversation.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = conversation_sequences)]
pub struct NewSequenceRow {
    /// Owning tenant.
    pub tenant_id: String,
    /// Conversation identifier.
    pub conversation_id: String,
    /// Reservation size, which is also the initial `issued_seq`.
    pub issued_seq: i64,
    /// Always zero on insert.
    pub max_seq: i64,
    /// Always zero on insert.
    pub min_seq: i64,
    /// Creation timestamp.
    pub updated_at: DateTime<Utc>,
}
