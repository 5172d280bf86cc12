//! Domain model for per-conversation sequence numbering.

mod allocation;
mod block_size;
mod key;
mod segment;
mod state;

pub use allocation::Allocation;
pub use block_size::{
    BlockSizePolicy, LARGE_NEED_MULTIPLIER, SMALL_NEED_BLOCK, SMALL_NEED_THRESHOLD,
};
pub use key::ConversationKey;
pub use segment::{InstallOutcome, Segment, SegmentEntry, SequenceRange, TakeOutcome};
pub use state::{ConversationSequenceState, WatermarkViolation};
