//! Idempotency key.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::message::domain::{ClientMessageId, MessageOrigin, SenderId, TenantId};

/// Deduplication key: one record per `(tenant, sender, client message id)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdempotencyKey {
    tenant_id: TenantId,
    sender_id: SenderId,
    client_message_id: ClientMessageId,
}

impl IdempotencyKey {
    /// Creates a key from its parts.
    #[must_use]
    pub const fn new(
        tenant_id: TenantId,
        sender_id: SenderId,
        client_message_id: ClientMessageId,
    ) -> Self {
        Self {
            tenant_id,
            sender_id,
            client_message_id,
        }
    }

    /// Derives the key for a message origin.
    #[must_use]
    pub fn for_origin(origin: &MessageOrigin) -> Self {
        Self::new(
            origin.tenant_id.clone(),
            origin.sender_id.clone(),
            origin.client_message_id.clone(),
        )
    }

    /// Returns the tenant identifier.
    #[must_use]
    pub const fn tenant_id(&self) -> &TenantId {
        &self.tenant_id
    }

    /// Returns the sender identifier.
    #[must_use]
    pub const fn sender_id(&self) -> &SenderId {
        &self.sender_id
    }

    /// Returns the client message identifier.
    #[must_use]
    pub const fn client_message_id(&self) -> &ClientMessageId {
        &self.client_message_id
    }
}

impl fmt::Display for IdempotencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.tenant_id, self.sender_id, self.client_message_id
        )
    }
}
