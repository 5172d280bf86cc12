//! Port for generating candidate server message identifiers.

use crate::message::domain::ServerMessageId;

/// Source of candidate server identifiers.
///
/// Collisions are rare but possible; the commit orchestrator recovers from
/// them by asking for another candidate.
#[cfg_attr(test, mockall::automock)]
pub trait ServerIdGenerator: Send + Sync {
    /// Returns a fresh candidate identifier.
    fn generate(&self) -> ServerMessageId;
}

/// Generates random version 4 UUIDs.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomServerIdGenerator;

impl ServerIdGenerator for RandomServerIdGenerator {
    fn generate(&self) -> ServerMessageId {
        ServerMessageId::new()
    }
}
