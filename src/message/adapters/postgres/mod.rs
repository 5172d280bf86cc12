//! `PostgreSQL` implementation of the `MessageStore` port using Diesel ORM.
//!
//! The three uniqueness guarantees are enforced by the schema in
//! `migrations/`; this adapter maps each violated constraint back onto the
//! matching [`MessageStoreError`](crate::message::error::MessageStoreError)
//! variant.

mod blocking_helpers;
mod conversion_helpers;
mod sql_helpers;

use async_trait::async_trait;
use diesel::prelude::*;

use super::models::{MessageRow, NewMessageRow};
use super::schema::messages;
use crate::message::{
    domain::{
        ClientMessageId, ConversationId, Message, SenderId, SequenceNumber, ServerMessageId,
        TenantId,
    },
    ports::store::{MessageStore, StoreResult},
};

pub use blocking_helpers::PgPool;
use blocking_helpers::{get_conn, run_blocking};
use conversion_helpers::{row_to_message, ser_err, sequence_to_column};
pub use sql_helpers::{
    CLIENT_MESSAGE_CONSTRAINT, SEQUENCE_CONSTRAINT, SERVER_ID_CONSTRAINT,
    map_constraint_to_duplicate_error,
};
use sql_helpers::{insert_message, map_query_error};

/// `PostgreSQL` implementation of [`MessageStore`].
///
/// Uses Diesel ORM with connection pooling via r2d2. Thread-safe for
/// concurrent access. All database operations are offloaded to a blocking
/// thread pool via [`tokio::task::spawn_blocking`] to avoid blocking
/// the async runtime.
///
/// # Example
///
/// ```ignore
/// use diesel::r2d2::{ConnectionManager, Pool};
/// use diesel::PgConnection;
/// use parley::message::adapters::postgres::PostgresMessageStore;
///
/// let manager = ConnectionManager::<PgConnection>::new("postgres://...");
/// let pool = Pool::builder().build(manager).expect("pool");
/// let store = PostgresMessageStore::new(pool);
/// ```
#[derive(Debug, Clone)]
pub struct PostgresMessageStore {
    pool: PgPool,
}

impl PostgresMessageStore {
    /// Creates a new store with the given connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns a reference to the connection pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl MessageStore for PostgresMessageStore {
    async fn insert(&self, message: &Message) -> StoreResult<()> {
        let pool = self.pool.clone();
        let row = NewMessageRow::try_from_domain(message)?;
        let message = message.clone();

        run_blocking(move || {
            let mut conn = get_conn(&pool)?;
            insert_message(&mut conn, &row, &message)
        })
        .await
    }

    async fn find_by_client_message(
        &self,
        tenant_id: &TenantId,
        sender_id: &SenderId,
        client_message_id: &ClientMessageId,
    ) -> StoreResult<Option<Message>> {
        let pool = self.pool.clone();
        let tenant = tenant_id.as_str().to_owned();
        let sender = sender_id.as_str().to_owned();
        let client_id = client_message_id.as_str().to_owned();

        run_blocking(move || {
            let mut conn = get_conn(&pool)?;

            messages::table
                .filter(messages::tenant_id.eq(tenant))
                .filter(messages::sender_id.eq(sender))
                .filter(messages::client_message_id.eq(client_id))
                .select(MessageRow::as_select())
                .first::<MessageRow>(&mut conn)
                .optional()
                .map_err(map_query_error)?
                .map(row_to_message)
                .transpose()
        })
        .await
    }

    async fn find_by_server_id(&self, server_id: ServerMessageId) -> StoreResult<Option<Message>> {
        let pool = self.pool.clone();
        let uuid = server_id.into_inner();

        run_blocking(move || {
            let mut conn = get_conn(&pool)?;

            messages::table
                .filter(messages::server_id.eq(uuid))
                .select(MessageRow::as_select())
                .first::<MessageRow>(&mut conn)
                .optional()
                .map_err(map_query_error)?
                .map(row_to_message)
                .transpose()
        })
        .await
    }

    async fn max_sequence(
        &self,
        tenant_id: &TenantId,
        conversation_id: &ConversationId,
    ) -> StoreResult<Option<SequenceNumber>> {
        let pool = self.pool.clone();
        let tenant = tenant_id.as_str().to_owned();
        let conversation = conversation_id.as_str().to_owned();

        run_blocking(move || {
            let mut conn = get_conn(&pool)?;

            let max_seq: Option<i64> = messages::table
                .filter(messages::tenant_id.eq(tenant))
                .filter(messages::conversation_id.eq(conversation))
                .select(diesel::dsl::max(messages::seq))
                .first(&mut conn)
                .map_err(map_query_error)?;

            max_seq
                .map(|value| u64::try_from(value).map(SequenceNumber::new).map_err(ser_err))
                .transpose()
        })
        .await
    }

    async fn find_after(
        &self,
        tenant_id: &TenantId,
        conversation_id: &ConversationId,
        after: SequenceNumber,
        limit: usize,
    ) -> StoreResult<Vec<Message>> {
        let pool = self.pool.clone();
        let tenant = tenant_id.as_str().to_owned();
        let conversation = conversation_id.as_str().to_owned();
        let after_seq = sequence_to_column(after)?;
        let row_limit = i64::try_from(limit).map_err(ser_err)?;

        run_blocking(move || {
            let mut conn = get_conn(&pool)?;

            let rows = messages::table
                .filter(messages::tenant_id.eq(tenant))
                .filter(messages::conversation_id.eq(conversation))
                .filter(messages::seq.gt(after_seq))
                .order(messages::seq.asc())
                .limit(row_limit)
                .select(MessageRow::as_select())
                .load::<MessageRow>(&mut conn)
                .map_err(map_query_error)?;

            rows.into_iter().map(row_to_message).collect()
        })
        .await
    }
}
