//! Durable per-conversation watermarks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{ConversationKey, Segment};
use crate::message::domain::SequenceNumber;

/// Ledger row for one conversation.
///
/// Holds three watermarks that only ever rise:
/// - `issued_seq`: highest number ever reserved
/// - `max_seq`: highest number known committed
/// - `min_seq`: lowest retained number, advanced by retention
///
/// and keeps `min_seq <= max_seq <= issued_seq`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationSequenceState {
    key: ConversationKey,
    issued_seq: u64,
    max_seq: u64,
    min_seq: u64,
    updated_at: DateTime<Utc>,
}

/// Stored watermarks that break `min_seq <= max_seq <= issued_seq`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("watermarks out of order: min={min_seq} max={max_seq} issued={issued_seq}")]
pub struct WatermarkViolation {
    /// Stored `issued_seq`.
    pub issued_seq: u64,
    /// Stored `max_seq`.
    pub max_seq: u64,
    /// Stored `min_seq`.
    pub min_seq: u64,
}

impl ConversationSequenceState {
    /// Creates the row written on a conversation's first allocation.
    #[must_use]
    pub const fn empty(key: ConversationKey, now: DateTime<Utc>) -> Self {
        Self {
            key,
            issued_seq: 0,
            max_seq: 0,
            min_seq: 0,
            updated_at: now,
        }
    }

    /// Reconstructs a row read from storage, checking the watermark order.
    ///
    /// # Errors
    ///
    /// Returns [`WatermarkViolation`] if `min <= max <= issued` does not
    /// hold.
    pub fn from_persisted(
        key: ConversationKey,
        issued_seq: u64,
        max_seq: u64,
        min_seq: u64,
        updated_at: DateTime<Utc>,
    ) -> Result<Self, WatermarkViolation> {
        if min_seq > max_seq || max_seq > issued_seq {
            return Err(WatermarkViolation {
                issued_seq,
                max_seq,
                min_seq,
            });
        }
        Ok(Self {
            key,
            issued_seq,
            max_seq,
            min_seq,
            updated_at,
        })
    }

    /// Conversation the row belongs to.
    #[must_use]
    pub const fn key(&self) -> &ConversationKey {
        &self.key
    }

    /// Highest number ever reserved.
    #[must_use]
    pub const fn issued_seq(&self) -> SequenceNumber {
        SequenceNumber::new(self.issued_seq)
    }

    /// Highest number known committed.
    #[must_use]
    pub const fn max_seq(&self) -> SequenceNumber {
        SequenceNumber::new(self.max_seq)
    }

    /// Lowest retained number.
    #[must_use]
    pub const fn min_seq(&self) -> SequenceNumber {
        SequenceNumber::new(self.min_seq)
    }

    /// Last modification time.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Highest number that may already be in use anywhere.
    #[must_use]
    pub fn high_water_mark(&self) -> SequenceNumber {
        SequenceNumber::new(self.issued_seq.max(self.max_seq))
    }

    /// Reserves the next `count` numbers, returning the new segment.
    ///
    /// Returns `None` without changing the row when `count` is zero or the
    /// counter would overflow.
    pub fn reserve(&mut self, count: u64, now: DateTime<Utc>) -> Option<Segment> {
        let segment = Segment::following(self.issued_seq, count)?;
        self.issued_seq = segment.end().value();
        self.updated_at = now;
        Some(segment)
    }

    /// Raises `issued_seq` to at least `floor`.
    pub fn raise_issued(&mut self, floor: SequenceNumber, now: DateTime<Utc>) {
        if floor.value() > self.issued_seq {
            self.issued_seq = floor.value();
            self.updated_at = now;
        }
    }

    /// Raises `max_seq` to at least `committed`, dragging `issued_seq` along.
    pub fn raise_max(&mut self, committed: SequenceNumber, now: DateTime<Utc>) {
        if committed.value() > self.max_seq {
            self.max_seq = committed.value();
            self.issued_seq = self.issued_seq.max(self.max_seq);
            self.updated_at = now;
        }
    }

    /// Raises `min_seq` to at least `floor`, never past `max_seq`.
    pub fn raise_min(&mut self, floor: SequenceNumber, now: DateTime<Utc>) {
        let target = floor.value().min(self.max_seq);
        if target > self.min_seq {
            self.min_seq = target;
            self.updated_at = now;
        }
    }
}
