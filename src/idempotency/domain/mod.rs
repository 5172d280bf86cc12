//! Domain model for client-side deduplication.

mod key;
mod record;

pub use key::IdempotencyKey;
pub use record::{
    EnsurePendingOutcome, IdempotencyRecord, IdempotencyStatus, IdempotencyTtls,
    ParseIdempotencyStatusError,
};
