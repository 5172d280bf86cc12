//! Errors reported by the commit orchestrator.

use std::fmt;

use thiserror::Error;

use crate::idempotency::error::IdempotencyError;
use crate::message::{
    domain::{ClientMessageId, ConversationId, MessageOrigin, TenantId},
    error::MessageStoreError,
};
use crate::sequence::error::AllocationError;

/// Identifies the save an error belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SaveContext {
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Target conversation.
    pub conversation_id: ConversationId,
    /// Client-supplied deduplication identifier.
    pub client_message_id: ClientMessageId,
}

impl From<&MessageOrigin> for SaveContext {
    fn from(origin: &MessageOrigin) -> Self {
        Self {
            tenant_id: origin.tenant_id.clone(),
            conversation_id: origin.conversation_id.clone(),
            client_message_id: origin.client_message_id.clone(),
        }
    }
}

impl fmt::Display for SaveContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "tenant={} conversation={} client_message_id={}",
            self.tenant_id, self.conversation_id, self.client_message_id
        )
    }
}

/// Why a write was abandoned.
#[derive(Debug, Clone, Error)]
pub enum WriteFailure {
    /// The message store kept failing.
    #[error(transparent)]
    Store(#[from] MessageStoreError),

    /// The idempotency index kept failing.
    #[error(transparent)]
    Index(#[from] IdempotencyError),

    /// Every reconciled sequence number was taken as well.
    #[error("sequence number still taken after {attempts} reconciliations")]
    SequenceConflicts {
        /// Collisions observed.
        attempts: u32,
    },

    /// Every candidate server identifier was taken as well.
    #[error("server id still taken after {attempts} candidates")]
    ServerIdCollisions {
        /// Collisions observed.
        attempts: u32,
    },

    /// The pending idempotency record expired or was rolled back mid-save.
    #[error("idempotency claim lost before the message was stored")]
    ClaimLost,
}

/// Errors returned by [`CommitOrchestrator::save_message`](super::CommitOrchestrator::save_message).
#[derive(Debug, Clone, Error)]
pub enum SaveMessageError {
    /// No sequence number could be allocated. Retryable.
    #[error("sequence allocation failed for {context}: {source}")]
    Allocation {
        /// The failed save.
        context: SaveContext,
        /// The allocator failure.
        #[source]
        source: AllocationError,
    },

    /// The client message identifier was already used with a different
    /// payload. Not retryable.
    #[error("client message id reused with a different payload for {context}")]
    IdempotencyConflict {
        /// The rejected save.
        context: SaveContext,
    },

    /// The insert could not be completed; the idempotency record has been
    /// rolled back. Retryable.
    #[error("message write failed for {context}: {reason}")]
    WriteFailed {
        /// The failed save.
        context: SaveContext,
        /// What gave out.
        #[source]
        reason: WriteFailure,
    },

    /// Stored state contradicts itself; retrying will not help.
    #[error("internal inconsistency for {context}: {detail}")]
    InternalInconsistency {
        /// The failed save.
        context: SaveContext,
        /// What was contradictory.
        detail: String,
    },
}

/// Result type for save operations.
pub type SaveResult<T> = Result<T, SaveMessageError>;

impl SaveMessageError {
    /// Returns the save this error belongs to.
    #[must_use]
    pub const fn context(&self) -> &SaveContext {
        match self {
            Self::Allocation { context, .. }
            | Self::IdempotencyConflict { context }
            | Self::WriteFailed { context, .. }
            | Self::InternalInconsistency { context, .. } => context,
        }
    }

    /// Returns `true` if the client may retry the same request.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Allocation { .. } | Self::WriteFailed { .. })
    }

    pub(super) fn write_failed(context: &SaveContext, reason: impl Into<WriteFailure>) -> Self {
        Self::WriteFailed {
            context: context.clone(),
            reason: reason.into(),
        }
    }

    pub(super) fn conflict(context: &SaveContext) -> Self {
        Self::IdempotencyConflict {
            context: context.clone(),
        }
    }

    pub(super) fn inconsistency(context: &SaveContext, detail: impl Into<String>) -> Self {
        Self::InternalInconsistency {
            context: context.clone(),
            detail: detail.into(),
        }
    }

    pub(super) fn allocation(context: &SaveContext, source: AllocationError) -> Self {
        if source.is_inconsistency() {
            return Self::inconsistency(context, source.to_string());
        }
        Self::Allocation {
            context: context.clone(),
            source,
        }
    }
}
