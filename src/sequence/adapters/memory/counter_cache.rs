//! In-memory implementation of the `CounterCache` port.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use mockable::Clock;

use crate::expiry::{ExpiringMap, expires_after};
use crate::sequence::{
    domain::ConversationKey,
    error::CacheError,
    ports::{
        counter_cache::{CounterCache, LockToken},
        segment_cache::CacheResult,
    },
};

#[derive(Debug, Default)]
struct CounterState {
    counters: ExpiringMap<ConversationKey, u64>,
    locks: ExpiringMap<ConversationKey, LockToken>,
}

/// In-memory implementation of [`CounterCache`].
///
/// Counters and locks live under one [`Mutex`], so every call is atomic.
#[derive(Debug, Clone)]
pub struct InMemoryCounterCache<C: Clock + Send + Sync> {
    state: Arc<Mutex<CounterState>>,
    clock: C,
}

impl<C: Clock + Send + Sync> InMemoryCounterCache<C> {
    /// Creates an empty cache with the given clock.
    #[must_use]
    pub fn new(clock: C) -> Self {
        Self {
            state: Arc::new(Mutex::new(CounterState::default())),
            clock,
        }
    }

    /// Returns the live counter value for a conversation, if any.
    #[must_use]
    pub fn value(&self, key: &ConversationKey) -> Option<u64> {
        let now = self.clock.utc();
        self.state
            .lock()
            .ok()
            .and_then(|mut state| state.counters.live(key, now).copied())
    }

    /// Drops every counter and lock, as a cache restart would.
    pub fn clear(&self) {
        if let Ok(mut state) = self.state.lock() {
            *state = CounterState::default();
        }
    }

    fn lock(&self) -> CacheResult<MutexGuard<'_, CounterState>> {
        self.state
            .lock()
            .map_err(|e| CacheError::unavailable(format!("lock poisoned: {e}")))
    }
}

#[async_trait]
impl<C: Clock + Send + Sync> CounterCache for InMemoryCounterCache<C> {
    async fn increment_existing(
        &self,
        key: &ConversationKey,
        by: u64,
        ttl: Duration,
    ) -> CacheResult<Option<u64>> {
        let now = self.clock.utc();
        let mut state = self.lock()?;
        let Some(counter) = state.counters.live_mut(key, now) else {
            return Ok(None);
        };

        let Some(next) = counter.value.checked_add(by) else {
            return Err(CacheError::unavailable(format!("counter overflow for {key}")));
        };
        counter.value = next;
        counter.expires_at = expires_after(now, ttl);
        Ok(Some(next))
    }

    async fn set_if_absent(
        &self,
        key: &ConversationKey,
        value: u64,
        ttl: Duration,
    ) -> CacheResult<bool> {
        let now = self.clock.utc();
        let mut state = self.lock()?;
        if state.counters.live(key, now).is_some() {
            return Ok(false);
        }
        state
            .counters
            .insert(key.clone(), value, now, ttl);
        Ok(true)
    }

    async fn try_lock(
        &self,
        key: &ConversationKey,
        token: LockToken,
        ttl: Duration,
    ) -> CacheResult<bool> {
        let now = self.clock.utc();
        let mut state = self.lock()?;
        if state.locks.live(key, now).is_some() {
            return Ok(false);
        }
        state.locks.insert(key.clone(), token, now, ttl);
        Ok(true)
    }

    async fn unlock(&self, key: &ConversationKey, token: LockToken) -> CacheResult<bool> {
        let now = self.clock.utc();
        let mut state = self.lock()?;
        if state.locks.live(key, now) != Some(&token) {
            return Ok(false);
        }
        state.locks.remove(key);
        Ok(true)
    }

    async fn invalidate(&self, key: &ConversationKey) -> CacheResult<()> {
        self.lock()?.counters.remove(key);
        Ok(())
    }
}
