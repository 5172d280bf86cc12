//! Idempotency index port.

use async_trait::async_trait;

use crate::idempotency::{
    domain::{EnsurePendingOutcome, IdempotencyKey, IdempotencyRecord},
    error::IdempotencyError,
};
use crate::message::domain::{Fingerprint, ServerMessageId};

/// Result type for idempotency index operations.
pub type IndexResult<T> = Result<T, IdempotencyError>;

/// Port for the TTL-bounded deduplication index.
///
/// # Implementation Notes
///
/// Every method is a single atomic compare-and-set against the record for
/// one key. Records expire on their own; an expired record reads as absent.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdempotencyIndex: Send + Sync {
    /// Claims `key` with a pending record unless one already exists.
    ///
    /// An existing record is returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`IdempotencyError`] if the index cannot be reached.
    async fn ensure_pending(
        &self,
        key: &IdempotencyKey,
        fingerprint: &Fingerprint,
        proposed: ServerMessageId,
    ) -> IndexResult<EnsurePendingOutcome>;

    /// Promotes the record to committed with the stored message's identity.
    ///
    /// Repeating the call for the same identifier is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`IdempotencyError::CommittedMismatch`] when the key is
    /// already committed to another identifier, or a transient error.
    async fn mark_committed(
        &self,
        key: &IdempotencyKey,
        server_id: ServerMessageId,
        fingerprint: &Fingerprint,
    ) -> IndexResult<()>;

    /// Replaces the proposed identifier while the record is still pending
    /// with the same fingerprint. Returns `true` if replaced.
    ///
    /// # Errors
    ///
    /// Returns [`IdempotencyError`] if the index cannot be reached.
    async fn update_server_id_if_pending(
        &self,
        key: &IdempotencyKey,
        fingerprint: &Fingerprint,
        server_id: ServerMessageId,
    ) -> IndexResult<bool>;

    /// Shortens a pending record's lifetime so a retry can start over soon.
    ///
    /// Committed records are left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`IdempotencyError`] if the index cannot be reached.
    async fn rollback_short_ttl(&self, key: &IdempotencyKey) -> IndexResult<()>;

    /// Reads the live record for `key`.
    ///
    /// # Errors
    ///
    /// Returns [`IdempotencyError`] if the index cannot be reached.
    async fn get(&self, key: &IdempotencyKey) -> IndexResult<Option<IdempotencyRecord>>;
}
