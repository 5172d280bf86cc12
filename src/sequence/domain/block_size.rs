//! Segment sizing policies.

use std::fmt;
use std::sync::Arc;

/// Needs below this are served from a fixed small block.
pub const SMALL_NEED_THRESHOLD: u64 = 32;
/// Block reserved for small needs under [`BlockSizePolicy::Adaptive`].
pub const SMALL_NEED_BLOCK: u64 = 256;
/// Multiplier applied to large needs under [`BlockSizePolicy::Adaptive`].
pub const LARGE_NEED_MULTIPLIER: u64 = 8;

/// Decides how many numbers to reserve from the ledger per round trip.
///
/// Whatever the policy, a block never holds fewer numbers than the request
/// that triggered it.
///
/// # Examples
///
/// ```
/// use parley::sequence::domain::BlockSizePolicy;
///
/// assert_eq!(BlockSizePolicy::Adaptive.block_size(1), 256);
/// assert_eq!(BlockSizePolicy::Adaptive.block_size(40), 320);
/// assert_eq!(BlockSizePolicy::Fixed(4).block_size(1), 4);
/// assert_eq!(BlockSizePolicy::Fixed(4).block_size(10), 10);
/// ```
#[derive(Clone, Default)]
pub enum BlockSizePolicy {
    /// `256` for needs below `32`, otherwise eight times the need.
    #[default]
    Adaptive,
    /// A fixed block size.
    Fixed(u64),
    /// A caller-supplied sizing function.
    Custom(Arc<dyn Fn(u64) -> u64 + Send + Sync>),
}

impl BlockSizePolicy {
    /// Returns the block size to reserve for a request of `need` numbers.
    #[must_use]
    pub fn block_size(&self, need: u64) -> u64 {
        let proposed = match self {
            Self::Adaptive if need < SMALL_NEED_THRESHOLD => SMALL_NEED_BLOCK,
            Self::Adaptive => need.saturating_mul(LARGE_NEED_MULTIPLIER),
            Self::Fixed(size) => *size,
            Self::Custom(size_for) => size_for(need),
        };
        proposed.max(need).max(1)
    }
}

impl fmt::Debug for BlockSizePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Adaptive => f.write_str("Adaptive"),
            Self::Fixed(size) => f.debug_tuple("Fixed").field(size).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}
