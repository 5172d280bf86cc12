//! Per-conversation sequence numbering.
//!
//! This module hands out strictly increasing sequence numbers for each
//! `(tenant, conversation)` pair. It follows the same hexagonal layout as the
//! message module:
//!
//! - **Domain**: [`domain::ConversationKey`], [`domain::Segment`],
//!   [`domain::ConversationSequenceState`], [`domain::BlockSizePolicy`]
//! - **Ports**: [`ports::SequenceLedger`], [`ports::SegmentCache`],
//!   [`ports::CounterCache`]
//! - **Adapters**: in-memory ledger and caches, `PostgreSQL` ledger
//! - **Services**: [`services::SequenceAllocator`]
//!
//! The ledger is durable and authoritative. The caches in front of it are
//! an optimisation only: losing them costs a ledger round trip, never a
//! duplicate number.

pub mod adapters;
pub mod domain;
pub mod error;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
