//! `PostgreSQL` adapter for the sequence ledger.

mod ledger;
mod models;
mod schema;

pub use ledger::{LedgerPgPool, PostgresSequenceLedger};
