//! `PostgreSQL` ledger implementation.
//!
//! Reservation is a single upsert that adds to `issued_seq` and returns the
//! new value; raise-only updates use `GREATEST` so concurrent writers can
//! never move a watermark backwards.

use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::upsert::excluded;
use diesel::sql_types::{BigInt, Text, Timestamptz};
use mockable::Clock;

use super::models::{NewSequenceRow, SequenceRow};
use super::schema::conversation_sequences;
use crate::message::domain::SequenceNumber;
use crate::sequence::{
    domain::{ConversationKey, ConversationSequenceState, Segment, WatermarkViolation},
    error::LedgerError,
    ports::ledger::{LedgerResult, SequenceLedger},
};

/// `PostgreSQL` connection pool type used by the ledger.
pub type LedgerPgPool = Pool<ConnectionManager<PgConnection>>;

const RAISE_ISSUED_SQL: &str = concat!(
    "INSERT INTO conversation_sequences ",
    "(tenant_id, conversation_id, issued_seq, max_seq, min_seq, updated_at) ",
    "VALUES ($1, $2, $3, 0, 0, $4) ",
    "ON CONFLICT (tenant_id, conversation_id) DO UPDATE SET ",
    "issued_seq = GREATEST(conversation_sequences.issued_seq, EXCLUDED.issued_seq), ",
    "updated_at = EXCLUDED.updated_at",
);

const RAISE_MAX_SQL: &str = concat!(
    "INSERT INTO conversation_sequences ",
    "(tenant_id, conversation_id, issued_seq, max_seq, min_seq, updated_at) ",
    "VALUES ($1, $2, $3, $3, 0, $4) ",
    "ON CONFLICT (tenant_id, conversation_id) DO UPDATE SET ",
    "max_seq = GREATEST(conversation_sequences.max_seq, EXCLUDED.max_seq), ",
    "issued_seq = GREATEST(conversation_sequences.issued_seq, EXCLUDED.max_seq), ",
    "updated_at = EXCLUDED.updated_at",
);

const RAISE_MIN_SQL: &str = concat!(
    "UPDATE conversation_sequences ",
    "SET min_seq = GREATEST(min_seq, LEAST($3, max_seq)), updated_at = $4 ",
    "WHERE tenant_id = $1 AND conversation_id = $2",
);

/// `PostgreSQL`-backed sequence ledger.
#[derive(Debug, Clone)]
pub struct PostgresSequenceLedger<C: Clock + Send + Sync> {
    pool: LedgerPgPool,
    clock: C,
}

impl<C: Clock + Send + Sync> PostgresSequenceLedger<C> {
    /// Creates a new ledger from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: LedgerPgPool, clock: C) -> Self {
        Self { pool, clock }
    }

    async fn run_blocking<F, T>(&self, f: F) -> LedgerResult<T>
    where
        F: FnOnce(&mut PgConnection) -> LedgerResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool
                .get()
                .map_err(|err| LedgerError::unavailable(err.to_string()))?;
            f(&mut connection)
        })
        .await
        .map_err(LedgerError::database)?
    }

    async fn raise(
        &self,
        sql: &'static str,
        key: &ConversationKey,
        value: SequenceNumber,
    ) -> LedgerResult<()> {
        let (tenant, conversation) = key_columns(key);
        let value = to_column(value.value())?;
        let now = self.clock.utc();

        self.run_blocking(move |connection| {
            diesel::sql_query(sql)
                .bind::<Text, _>(tenant)
                .bind::<Text, _>(conversation)
                .bind::<BigInt, _>(value)
                .bind::<Timestamptz, _>(now)
                .execute(connection)
                .map_err(map_query_error)?;
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl<C: Clock + Send + Sync> SequenceLedger for PostgresSequenceLedger<C> {
    async fn reserve(&self, key: &ConversationKey, count: u64) -> LedgerResult<Segment> {
        let overflow = || LedgerError::Overflow { key: key.clone() };
        let (tenant_id, conversation_id) = key_columns(key);
        let block = i64::try_from(count).map_err(|_| overflow())?;
        let new_row = NewSequenceRow {
            tenant_id,
            conversation_id,
            issued_seq: block,
            max_seq: 0,
            min_seq: 0,
            updated_at: self.clock.utc(),
        };

        let issued = self
            .run_blocking(move |connection| {
                diesel::insert_into(conversation_sequences::table)
                    .values(&new_row)
                    .on_conflict((
                        conversation_sequences::tenant_id,
                        conversation_sequences::conversation_id,
                    ))
                    .do_update()
                    .set((
                        conversation_sequences::issued_seq.eq(conversation_sequences::issued_seq
                            + excluded(conversation_sequences::issued_seq)),
                        conversation_sequences::updated_at
                            .eq(excluded(conversation_sequences::updated_at)),
                    ))
                    .returning(conversation_sequences::issued_seq)
                    .get_result::<i64>(connection)
                    .map_err(map_query_error)
            })
            .await?;

        let previous = issued
            .checked_sub(block)
            .and_then(|value| u64::try_from(value).ok())
            .ok_or_else(overflow)?;
        Segment::following(previous, count).ok_or_else(overflow)
    }

    async fn raise_issued(&self, key: &ConversationKey, floor: SequenceNumber) -> LedgerResult<()> {
        self.raise(RAISE_ISSUED_SQL, key, floor).await
    }

    async fn raise_max(
        &self,
        key: &ConversationKey,
        committed: SequenceNumber,
    ) -> LedgerResult<()> {
        self.raise(RAISE_MAX_SQL, key, committed).await
    }

    async fn raise_min(&self, key: &ConversationKey, floor: SequenceNumber) -> LedgerResult<()> {
        self.raise(RAISE_MIN_SQL, key, floor).await
    }

    async fn load(&self, key: &ConversationKey) -> LedgerResult<Option<ConversationSequenceState>> {
        let (tenant, conversation) = key_columns(key);
        let lookup_key = key.clone();

        let row = self
            .run_blocking(move |connection| {
                conversation_sequences::table
                    .filter(conversation_sequences::tenant_id.eq(tenant))
                    .filter(conversation_sequences::conversation_id.eq(conversation))
                    .select(SequenceRow::as_select())
                    .first::<SequenceRow>(connection)
                    .optional()
                    .map_err(map_query_error)
            })
            .await?;

        row.map(|persisted| row_to_state(lookup_key, persisted))
            .transpose()
    }
}

fn key_columns(key: &ConversationKey) -> (String, String) {
    (
        key.tenant_id().as_str().to_owned(),
        key.conversation_id().as_str().to_owned(),
    )
}

fn to_column(value: u64) -> LedgerResult<i64> {
    i64::try_from(value).map_err(LedgerError::database)
}

fn row_to_state(key: ConversationKey, row: SequenceRow) -> LedgerResult<ConversationSequenceState> {
    // Negative columns cannot come from this adapter; clamp them so the
    // violation still reports out-of-order watermarks.
    let watermark = |value: i64| u64::try_from(value).unwrap_or_default();
    let issued = watermark(row.issued_seq);
    let max = watermark(row.max_seq);
    let min = watermark(row.min_seq);

    if row.issued_seq < 0 || row.max_seq < 0 || row.min_seq < 0 {
        return Err(LedgerError::Inconsistent {
            key,
            violation: WatermarkViolation {
                issued_seq: issued,
                max_seq: max,
                min_seq: min,
            },
        });
    }

    ConversationSequenceState::from_persisted(key.clone(), issued, max, min, row.updated_at)
        .map_err(|violation| LedgerError::Inconsistent { key, violation })
}

fn map_query_error(err: DieselError) -> LedgerError {
    match err {
        DieselError::DatabaseError(
            DatabaseErrorKind::SerializationFailure | DatabaseErrorKind::ClosedConnection,
            ref info,
        ) => LedgerError::unavailable(info.message().to_owned()),
        other => LedgerError::database(other),
    }
}
