//! Durable ledger port.
//!
//! The ledger is the source of truth for how far each conversation's
//! numbering has advanced. Caches in front of it may lose state at any time;
//! the ledger may not.

use async_trait::async_trait;

use crate::message::domain::SequenceNumber;
use crate::sequence::{
    domain::{ConversationKey, ConversationSequenceState, Segment},
    error::LedgerError,
};

/// Result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Port for the per-conversation watermark ledger.
///
/// # Implementation Notes
///
/// Every method is a single atomic statement. Rows are created lazily on
/// first use. Watermarks never decrease.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SequenceLedger: Send + Sync {
    /// Reserves `count` numbers past `issued_seq` and returns them.
    ///
    /// Concurrent reservations for one key never overlap.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Overflow`] when the range cannot be
    /// represented, or a transient or database error.
    async fn reserve(&self, key: &ConversationKey, count: u64) -> LedgerResult<Segment>;

    /// Raises `issued_seq` to at least `floor`.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError`] if the update fails.
    async fn raise_issued(&self, key: &ConversationKey, floor: SequenceNumber) -> LedgerResult<()>;

    /// Raises the commit watermark `max_seq` to at least `committed`.
    ///
    /// `issued_seq` is raised alongside when needed.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError`] if the update fails.
    async fn raise_max(&self, key: &ConversationKey, committed: SequenceNumber)
    -> LedgerResult<()>;

    /// Raises the retention floor `min_seq`, clamped to `max_seq`.
    ///
    /// Does nothing for a conversation without a row.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError`] if the update fails.
    async fn raise_min(&self, key: &ConversationKey, floor: SequenceNumber) -> LedgerResult<()>;

    /// Reads a conversation's watermarks.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Inconsistent`] if the stored row breaks the
    /// watermark order, or a transient or database error.
    async fn load(&self, key: &ConversationKey) -> LedgerResult<Option<ConversationSequenceState>>;
}
