//! Allocator results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::SequenceRange;
use crate::message::domain::SequenceNumber;

/// Consecutive sequence numbers granted to one caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    range: SequenceRange,
    allocated_at: DateTime<Utc>,
}

impl Allocation {
    /// Stamps a claimed range with the time it was granted.
    #[must_use]
    pub const fn new(range: SequenceRange, allocated_at: DateTime<Utc>) -> Self {
        Self {
            range,
            allocated_at,
        }
    }

    /// First granted number.
    #[must_use]
    pub const fn start(&self) -> SequenceNumber {
        self.range.start()
    }

    /// Last granted number.
    #[must_use]
    pub const fn end(&self) -> SequenceNumber {
        self.range.end()
    }

    /// Number of granted values.
    #[must_use]
    pub const fn count(&self) -> u64 {
        self.range.count()
    }

    /// When the numbers were granted.
    #[must_use]
    pub const fn allocated_at(&self) -> DateTime<Utc> {
        self.allocated_at
    }

    /// Iterates over every granted number in order.
    pub fn iter(&self) -> impl Iterator<Item = SequenceNumber> + use<> {
        let start = self.start().value();
        let end = self.end().value();
        (start..=end).map(SequenceNumber::new)
    }
}
