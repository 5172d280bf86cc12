//! Parley: the message-ingestion core of a multi-node chat platform.
//!
//! Given an inbound "send message" request from an authenticated client,
//! this crate assigns the message a strictly increasing position within its
//! conversation and stores it exactly once, even when requests are retried,
//! reordered, or handled by different stateless nodes at the same time, and
//! even when the cache in front of the sequence generator loses its state.
//!
//! # Architecture
//!
//! Parley follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (database, caches)
//!
//! # Modules
//!
//! - [`message`]: Stored messages, the message store, and the commit workflow
//! - [`sequence`]: Per-conversation sequence allocation over a durable ledger
//! - [`idempotency`]: Deduplication of client retries
//! - [`retry`]: Backoff and deadline helpers shared by the services

mod expiry;
pub mod idempotency;
pub mod message;
pub mod retry;
pub mod sequence;

#[cfg(test)]
mod test_clock;
