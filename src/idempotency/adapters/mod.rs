//! Adapter implementations of the idempotency ports.
//!
//! Only an in-memory index ships here; a networked cache adapter implements
//! [`IdempotencyIndex`](super::ports::IdempotencyIndex) with the same
//! compare-and-set semantics.

pub mod memory;
