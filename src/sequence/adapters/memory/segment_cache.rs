//! In-memory implementation of the `SegmentCache` port.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use mockable::Clock;

use crate::expiry::{ExpiringMap, expires_after};
use crate::sequence::{
    domain::{ConversationKey, InstallOutcome, Segment, SegmentEntry, TakeOutcome},
    error::CacheError,
    ports::segment_cache::{CacheResult, SegmentCache},
};

#[derive(Debug, Clone, Copy)]
struct Slot {
    entry: SegmentEntry,
    ttl: Duration,
}

type Slots = ExpiringMap<ConversationKey, Slot>;

/// In-memory implementation of [`SegmentCache`].
///
/// A take or install holds the internal [`Mutex`] for its whole
/// check-then-set, which is what a cache-side script would guarantee.
/// A successful take refreshes the entry's expiry.
#[derive(Debug, Clone)]
pub struct InMemorySegmentCache<C: Clock + Send + Sync> {
    slots: Arc<Mutex<Slots>>,
    clock: C,
}

impl<C: Clock + Send + Sync> InMemorySegmentCache<C> {
    /// Creates an empty cache with the given clock.
    #[must_use]
    pub fn new(clock: C) -> Self {
        Self {
            slots: Arc::new(Mutex::new(ExpiringMap::default())),
            clock,
        }
    }

    /// Returns the live entry for a conversation, if any.
    #[must_use]
    pub fn entry(&self, key: &ConversationKey) -> Option<SegmentEntry> {
        let now = self.clock.utc();
        self.slots
            .lock()
            .ok()
            .and_then(|mut slots| slots.live(key, now).map(|slot| slot.entry))
    }

    /// Drops every entry, as a cache restart would.
    pub fn clear(&self) {
        if let Ok(mut slots) = self.slots.lock() {
            *slots = ExpiringMap::default();
        }
    }

    fn lock(&self) -> CacheResult<MutexGuard<'_, Slots>> {
        self.slots
            .lock()
            .map_err(|e| CacheError::unavailable(format!("lock poisoned: {e}")))
    }
}

#[async_trait]
impl<C: Clock + Send + Sync> SegmentCache for InMemorySegmentCache<C> {
    async fn take(&self, key: &ConversationKey, need: u64) -> CacheResult<TakeOutcome> {
        let now = self.clock.utc();
        let mut slots = self.lock()?;
        let Some(cached) = slots.live_mut(key, now) else {
            return Ok(TakeOutcome::NotFound);
        };

        let outcome = cached.value.entry.take(need, now);
        if matches!(outcome, TakeOutcome::Taken(_)) {
            cached.expires_at = expires_after(now, cached.value.ttl);
        }
        Ok(outcome)
    }

    async fn install(
        &self,
        key: &ConversationKey,
        segment: Segment,
        ttl: Duration,
    ) -> CacheResult<InstallOutcome> {
        let now = self.clock.utc();
        let mut slots = self.lock()?;
        let keeps_existing = slots
            .live(key, now)
            .is_some_and(|slot| !slot.entry.is_superseded_by(&segment));
        if keeps_existing {
            return Ok(InstallOutcome::Superseded);
        }

        let slot = Slot {
            entry: SegmentEntry::fresh(segment, now),
            ttl,
        };
        slots.insert(key.clone(), slot, now, ttl);
        Ok(InstallOutcome::Installed)
    }

    async fn invalidate(&self, key: &ConversationKey) -> CacheResult<()> {
        self.lock()?.remove(key);
        Ok(())
    }
}
