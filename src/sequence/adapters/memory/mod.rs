//! In-memory adapters for sequence allocation.
//!
//! Suitable for tests and single-process deployments; state is lost on
//! drop.

mod counter_cache;
mod ledger;
mod segment_cache;

pub use counter_cache::InMemoryCounterCache;
pub use ledger::InMemorySequenceLedger;
pub use segment_cache::InMemorySegmentCache;
