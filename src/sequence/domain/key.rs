//! Conversation key shared by the ledger and the caches.

use crate::message::domain::{ConversationId, TenantId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one ordered message stream: `(tenant, conversation)`.
///
/// Sequence numbers are scoped to a key; there is no ordering across keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConversationKey {
    tenant_id: TenantId,
    conversation_id: ConversationId,
}

impl ConversationKey {
    /// Creates a key from its parts.
    #[must_use]
    pub const fn new(tenant_id: TenantId, conversation_id: ConversationId) -> Self {
        Self {
            tenant_id,
            conversation_id,
        }
    }

    /// Returns the tenant identifier.
    #[must_use]
    pub const fn tenant_id(&self) -> &TenantId {
        &self.tenant_id
    }

    /// Returns the conversation identifier.
    #[must_use]
    pub const fn conversation_id(&self) -> &ConversationId {
        &self.conversation_id
    }
}

impl fmt::Display for ConversationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.tenant_id, self.conversation_id)
    }
}
