//! Port trait definitions for deduplication.

pub mod index;

pub use index::{IdempotencyIndex, IndexResult};
