//! In-memory idempotency index.

mod index;

pub use index::InMemoryIdempotencyIndex;
