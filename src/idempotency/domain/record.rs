//! Idempotency records and their lifecycle states.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

use crate::message::domain::{Fingerprint, ServerMessageId};

/// Lifecycle state of an idempotency record.
///
/// Records move forward from `Pending` to `Committed` only. A pending
/// record may instead be rolled back, which shortens its lifetime so a
/// retry can start over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdempotencyStatus {
    /// A save is in flight or was abandoned.
    Pending,
    /// The message is durably stored.
    Committed,
}

impl IdempotencyStatus {
    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Committed => "committed",
        }
    }
}

impl fmt::Display for IdempotencyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown status string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown idempotency status: {0}")]
pub struct ParseIdempotencyStatusError(pub String);

impl TryFrom<&str> for IdempotencyStatus {
    type Error = ParseIdempotencyStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "pending" => Ok(Self::Pending),
            "committed" => Ok(Self::Committed),
            other => Err(ParseIdempotencyStatusError(other.to_owned())),
        }
    }
}

/// Stored deduplication state for one idempotency key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdempotencyRecord {
    /// Server identifier proposed for, or committed to, the message.
    pub server_id: ServerMessageId,
    /// Fingerprint of the payload the key was first used with.
    pub fingerprint: Fingerprint,
    /// Lifecycle state.
    pub status: IdempotencyStatus,
}

impl IdempotencyRecord {
    /// Creates a pending record.
    #[must_use]
    pub const fn pending(server_id: ServerMessageId, fingerprint: Fingerprint) -> Self {
        Self {
            server_id,
            fingerprint,
            status: IdempotencyStatus::Pending,
        }
    }

    /// Creates a committed record.
    #[must_use]
    pub const fn committed(server_id: ServerMessageId, fingerprint: Fingerprint) -> Self {
        Self {
            server_id,
            fingerprint,
            status: IdempotencyStatus::Committed,
        }
    }

    /// Returns `true` once the message is durably stored.
    #[must_use]
    pub fn is_committed(&self) -> bool {
        self.status == IdempotencyStatus::Committed
    }
}

/// Outcome of claiming an idempotency key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnsurePendingOutcome {
    /// No record existed; a pending one now holds the proposed identifier.
    Created {
        /// The identifier the caller proposed.
        server_id: ServerMessageId,
    },
    /// A record already existed and was left unchanged.
    Existing(IdempotencyRecord),
}

/// Lifetimes of idempotency records in each state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdempotencyTtls {
    /// How long a pending record blocks retries of the same key.
    pub pending: Duration,
    /// The idempotency window for committed messages.
    pub committed: Duration,
    /// Remaining lifetime of a rolled-back record.
    pub rollback: Duration,
}

impl Default for IdempotencyTtls {
    fn default() -> Self {
        Self {
            pending: Duration::from_secs(10 * 60),
            committed: Duration::from_secs(48 * 60 * 60),
            rollback: Duration::from_secs(5),
        }
    }
}
