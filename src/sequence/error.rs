//! Error types for sequence allocation.
//!
//! Each port has its own error enum; [`AllocationError`] wraps them at the
//! allocator boundary so callers can still tell a transient outage from a
//! broken invariant.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use super::domain::{ConversationKey, WatermarkViolation};
use crate::retry::TransientError;

/// Errors raised by a durable sequence ledger.
#[derive(Debug, Clone, Error)]
pub enum LedgerError {
    /// The ledger could not be reached; the call may be repeated.
    #[error("sequence ledger unavailable: {0}")]
    Unavailable(String),

    /// A ledger call exceeded its deadline.
    #[error("sequence ledger operation {operation} timed out after {after:?}")]
    Timeout {
        /// The operation that timed out.
        operation: &'static str,
        /// The deadline that elapsed.
        after: Duration,
    },

    /// The stored watermarks are out of order.
    #[error("inconsistent ledger state for {key}: {violation}")]
    Inconsistent {
        /// The affected conversation.
        key: ConversationKey,
        /// The observed violation.
        violation: WatermarkViolation,
    },

    /// The conversation has run out of representable sequence numbers.
    #[error("sequence space exhausted for {key}")]
    Overflow {
        /// The affected conversation.
        key: ConversationKey,
    },

    /// A database error occurred.
    #[error("database error: {0}")]
    Database(Arc<dyn std::error::Error + Send + Sync>),
}

impl LedgerError {
    /// Creates a database error from any error type.
    #[must_use]
    pub fn database(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Database(Arc::new(err))
    }

    /// Creates an unavailability error.
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }
}

impl TransientError for LedgerError {
    fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Timeout { .. })
    }

    fn timed_out(operation: &'static str, after: Duration) -> Self {
        Self::Timeout { operation, after }
    }
}

/// Errors raised by the segment and counter caches.
#[derive(Debug, Clone, Error)]
pub enum CacheError {
    /// The cache could not be reached; the call may be repeated.
    #[error("sequence cache unavailable: {0}")]
    Unavailable(String),

    /// A cache call exceeded its deadline.
    #[error("sequence cache operation {operation} timed out after {after:?}")]
    Timeout {
        /// The operation that timed out.
        operation: &'static str,
        /// The deadline that elapsed.
        after: Duration,
    },
}

impl CacheError {
    /// Creates an unavailability error.
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }
}

impl TransientError for CacheError {
    fn is_transient(&self) -> bool {
        true
    }

    fn timed_out(operation: &'static str, after: Duration) -> Self {
        Self::Timeout { operation, after }
    }
}

/// Errors returned by the sequence allocator.
#[derive(Debug, Clone, Error)]
pub enum AllocationError {
    /// Zero numbers were requested.
    #[error("at least one sequence number must be requested")]
    ZeroNeed,

    /// The ledger failed.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// The cache failed.
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// Concurrent allocators kept winning every race.
    #[error("allocation for {key} gave up after {attempts} attempts")]
    RetriesExhausted {
        /// The contended conversation.
        key: ConversationKey,
        /// Attempts made.
        attempts: u32,
    },

    /// Allocation exceeded its deadline.
    #[error("allocation step {operation} timed out after {after:?}")]
    Timeout {
        /// The step that timed out.
        operation: &'static str,
        /// The deadline that elapsed.
        after: Duration,
    },
}

impl AllocationError {
    /// Returns `true` when the ledger holds watermarks that cannot be
    /// trusted; retrying will not help.
    #[must_use]
    pub const fn is_inconsistency(&self) -> bool {
        matches!(self, Self::Ledger(LedgerError::Inconsistent { .. }))
    }
}

impl TransientError for AllocationError {
    fn is_transient(&self) -> bool {
        match self {
            Self::Ledger(err) => err.is_transient(),
            Self::Cache(err) => err.is_transient(),
            Self::RetriesExhausted { .. } | Self::Timeout { .. } => true,
            Self::ZeroNeed => false,
        }
    }

    fn timed_out(operation: &'static str, after: Duration) -> Self {
        Self::Timeout { operation, after }
    }
}
