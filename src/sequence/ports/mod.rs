//! Port trait definitions for sequence allocation.

pub mod counter_cache;
pub mod ledger;
pub mod segment_cache;

pub use counter_cache::{CounterCache, LockToken};
pub use ledger::{LedgerResult, SequenceLedger};
pub use segment_cache::{CacheResult, SegmentCache};
