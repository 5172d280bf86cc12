//! Domain types for the message subsystem.
//!
//! This module contains pure domain types with no infrastructure dependencies.
//! All types are immutable after construction and serialisable via serde.

mod error;
mod ids;
mod message;
mod payload;

pub use error::{IdentifierError, ParseFingerprintError};
pub use ids::{
    ClientMessageId, ConversationId, SenderId, SequenceNumber, ServerMessageId, TenantId,
};
pub use message::{Message, MessageMeta, MessageOrigin};
pub use payload::{Fingerprint, Payload};
