//! Segments of reserved sequence numbers and the cache entry that serves
//! them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::message::domain::SequenceNumber;

/// A contiguous, inclusive range of sequence numbers reserved from the
/// ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Segment {
    start: SequenceNumber,
    end: SequenceNumber,
}

impl Segment {
    /// Builds the segment that follows `previous` and spans `count` numbers.
    ///
    /// Returns `None` when `count` is zero or the range would overflow.
    ///
    /// # Examples
    ///
    /// ```
    /// use parley::sequence::domain::Segment;
    ///
    /// let segment = Segment::following(8, 4).expect("valid segment");
    /// assert_eq!(segment.start().value(), 9);
    /// assert_eq!(segment.end().value(), 12);
    /// assert_eq!(segment.len(), 4);
    /// ```
    #[must_use]
    pub fn following(previous: u64, count: u64) -> Option<Self> {
        if count == 0 {
            return None;
        }
        let start = previous.checked_add(1)?;
        let end = previous.checked_add(count)?;
        Some(Self {
            start: SequenceNumber::new(start),
            end: SequenceNumber::new(end),
        })
    }

    /// First number of the segment.
    #[must_use]
    pub const fn start(&self) -> SequenceNumber {
        self.start
    }

    /// Last number of the segment.
    #[must_use]
    pub const fn end(&self) -> SequenceNumber {
        self.end
    }

    /// Number of sequence numbers in the segment.
    #[must_use]
    pub const fn len(&self) -> u64 {
        self.end.value() - self.start.value() + 1
    }

    /// Segments always hold at least one number.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }
}

/// A run of consecutive sequence numbers handed to one caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceRange {
    start: SequenceNumber,
    count: u64,
}

impl SequenceRange {
    /// Creates a range of `count` numbers starting at `start`.
    #[must_use]
    pub const fn new(start: SequenceNumber, count: u64) -> Self {
        Self { start, count }
    }

    /// First number of the range.
    #[must_use]
    pub const fn start(&self) -> SequenceNumber {
        self.start
    }

    /// Number of values in the range.
    #[must_use]
    pub const fn count(&self) -> u64 {
        self.count
    }

    /// Last number of the range.
    #[must_use]
    pub const fn end(&self) -> SequenceNumber {
        SequenceNumber::new(
            self.start
                .value()
                .saturating_add(self.count.saturating_sub(1)),
        )
    }
}

/// Result of an atomic take against a cached segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TakeOutcome {
    /// The numbers were claimed from the cached segment.
    Taken(SequenceRange),
    /// No segment is cached for the conversation.
    NotFound,
    /// The cached segment cannot satisfy the request; nothing changed.
    Exhausted,
}

/// Result of installing a freshly reserved segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallOutcome {
    /// The segment now backs the conversation.
    Installed,
    /// A segment at least as new was already cached and was kept.
    Superseded,
}

/// Cached position inside a segment.
///
/// `current` is the last number handed out; `current == end` means the
/// segment is used up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentEntry {
    current: u64,
    end: u64,
    last_touch: DateTime<Utc>,
}

impl SegmentEntry {
    /// Creates an entry positioned just before the segment's first number.
    #[must_use]
    pub const fn fresh(segment: Segment, now: DateTime<Utc>) -> Self {
        Self {
            current: segment.start().value() - 1,
            end: segment.end().value(),
            last_touch: now,
        }
    }

    /// Last number handed out from this entry.
    #[must_use]
    pub const fn current(&self) -> u64 {
        self.current
    }

    /// Last number the entry may hand out.
    #[must_use]
    pub const fn end(&self) -> u64 {
        self.end
    }

    /// When the entry was last installed or taken from.
    #[must_use]
    pub const fn last_touch(&self) -> DateTime<Utc> {
        self.last_touch
    }

    /// Numbers still available.
    #[must_use]
    pub const fn remaining(&self) -> u64 {
        self.end - self.current
    }

    /// Claims `need` numbers, or leaves the entry untouched when fewer
    /// remain.
    pub fn take(&mut self, need: u64, now: DateTime<Utc>) -> TakeOutcome {
        if need == 0 || need > self.remaining() {
            return TakeOutcome::Exhausted;
        }
        let start = SequenceNumber::new(self.current + 1);
        self.current += need;
        self.last_touch = now;
        TakeOutcome::Taken(SequenceRange::new(start, need))
    }

    /// Whether `segment` may replace this entry.
    ///
    /// Only a segment starting beyond everything this entry could still
    /// hand out may be installed over it.
    #[must_use]
    pub const fn is_superseded_by(&self, segment: &Segment) -> bool {
        self.end < segment.start().value()
    }
}
