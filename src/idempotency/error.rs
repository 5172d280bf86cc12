//! Error types for the idempotency index.

use std::time::Duration;

use thiserror::Error;

use super::domain::IdempotencyKey;
use crate::message::domain::ServerMessageId;
use crate::retry::TransientError;

/// Errors raised by an idempotency index.
#[derive(Debug, Clone, Error)]
pub enum IdempotencyError {
    /// The index could not be reached; the call may be repeated.
    #[error("idempotency index unavailable: {0}")]
    Unavailable(String),

    /// An index call exceeded its deadline.
    #[error("idempotency index operation {operation} timed out after {after:?}")]
    Timeout {
        /// The operation that timed out.
        operation: &'static str,
        /// The deadline that elapsed.
        after: Duration,
    },

    /// The key is already committed to a different message.
    #[error("idempotency key {key} is committed to {committed}, not {attempted}")]
    CommittedMismatch {
        /// The affected key.
        key: IdempotencyKey,
        /// The identifier already committed.
        committed: ServerMessageId,
        /// The identifier the caller tried to commit.
        attempted: ServerMessageId,
    },
}

impl IdempotencyError {
    /// Creates an unavailability error.
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }
}

impl TransientError for IdempotencyError {
    fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Timeout { .. })
    }

    fn timed_out(operation: &'static str, after: Duration) -> Self {
        Self::Timeout { operation, after }
    }
}
