//! Allocator configuration.

use std::time::Duration;

use crate::sequence::domain::BlockSizePolicy;

/// Settings for the segment allocator.
///
/// # Examples
///
/// ```
/// use parley::sequence::services::SegmentAllocatorConfig;
///
/// let config = SegmentAllocatorConfig::with_fixed_block(4);
/// assert_eq!(config.block_size.block_size(1), 4);
/// assert_eq!(config.max_attempts, 4);
/// ```
#[derive(Debug, Clone)]
pub struct SegmentAllocatorConfig {
    /// How many numbers to reserve from the ledger per round trip.
    pub block_size: BlockSizePolicy,
    /// Lifetime of a cached segment after its last use.
    pub segment_ttl: Duration,
    /// Take/reserve rounds before giving up on a contended conversation.
    pub max_attempts: u32,
}

impl Default for SegmentAllocatorConfig {
    fn default() -> Self {
        Self {
            block_size: BlockSizePolicy::Adaptive,
            segment_ttl: Duration::from_secs(60 * 60),
            max_attempts: 4,
        }
    }
}

impl SegmentAllocatorConfig {
    /// Default settings with a fixed block size.
    #[must_use]
    pub fn with_fixed_block(size: u64) -> Self {
        Self {
            block_size: BlockSizePolicy::Fixed(size),
            ..Self::default()
        }
    }
}

/// Settings for the single-counter allocator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterAllocatorConfig {
    /// Lifetime of a counter after its last increment.
    pub counter_ttl: Duration,
    /// Lifetime of the cold-start lock, bounding how long a crashed holder
    /// can stall other nodes.
    pub lock_ttl: Duration,
    /// Delay between rechecks while another node seeds the counter.
    pub lock_poll_interval: Duration,
    /// Increment/seed rounds before giving up.
    pub max_attempts: u32,
}

impl Default for CounterAllocatorConfig {
    fn default() -> Self {
        Self {
            counter_ttl: Duration::from_secs(60 * 60),
            lock_ttl: Duration::from_secs(5),
            lock_poll_interval: Duration::from_millis(20),
            max_attempts: 50,
        }
    }
}
