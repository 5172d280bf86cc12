//! Sequence allocation services.

mod allocator;
mod config;
mod counter;
mod segment;

pub use allocator::{AllocationResult, SequenceAllocator};
pub use config::{CounterAllocatorConfig, SegmentAllocatorConfig};
pub use counter::CounterAllocator;
pub use segment::SegmentAllocator;
