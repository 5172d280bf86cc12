//! TTL bookkeeping shared by the in-memory cache adapters.
//!
//! Expired entries read as absent. They are dropped on the next access to
//! their key, and a periodic sweep on insert drops the rest.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

/// Minimum clock time between two full sweeps of a map.
const SWEEP_INTERVAL: TimeDelta = TimeDelta::seconds(30);

/// Returns the instant `ttl` after `now`, saturating far in the future.
pub(crate) fn expires_after(now: DateTime<Utc>, ttl: Duration) -> DateTime<Utc> {
    TimeDelta::from_std(ttl)
        .ok()
        .and_then(|delta| now.checked_add_signed(delta))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// A cached value with its expiry.
#[derive(Debug, Clone)]
pub(crate) struct Expiring<V> {
    pub(crate) value: V,
    pub(crate) expires_at: DateTime<Utc>,
}

/// Map whose entries vanish once their expiry has passed.
#[derive(Debug)]
pub(crate) struct ExpiringMap<K, V> {
    entries: HashMap<K, Expiring<V>>,
    last_sweep: Option<DateTime<Utc>>,
}

impl<K, V> Default for ExpiringMap<K, V> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            last_sweep: None,
        }
    }
}

impl<K: Eq + Hash, V> ExpiringMap<K, V> {
    /// Returns the live entry for `key`, evicting it first if expired.
    pub(crate) fn live_mut<Q>(&mut self, key: &Q, now: DateTime<Utc>) -> Option<&mut Expiring<V>>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        let expired = self
            .entries
            .get(key)
            .is_some_and(|entry| entry.expires_at <= now);
        if expired {
            self.entries.remove(key);
        }
        self.entries.get_mut(key)
    }

    /// Returns the live value for `key`.
    pub(crate) fn live<Q>(&mut self, key: &Q, now: DateTime<Utc>) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.live_mut(key, now).map(|entry| &entry.value)
    }

    /// Inserts or replaces an entry that lives for `ttl` from `now`.
    ///
    /// Sweeps every expired entry first when the last sweep is at least
    /// [`SWEEP_INTERVAL`] old.
    pub(crate) fn insert(&mut self, key: K, value: V, now: DateTime<Utc>, ttl: Duration) {
        self.sweep_if_due(now);
        let expires_at = expires_after(now, ttl);
        self.entries.insert(key, Expiring { value, expires_at });
    }

    fn sweep_if_due(&mut self, now: DateTime<Utc>) {
        let due = self
            .last_sweep
            .is_none_or(|last| now.signed_duration_since(last) >= SWEEP_INTERVAL);
        if due {
            self.entries.retain(|_, entry| entry.expires_at > now);
            self.last_sweep = Some(now);
        }
    }

    /// Removes an entry regardless of expiry.
    pub(crate) fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.entries.remove(key).map(|entry| entry.value)
    }

    /// Counts live entries.
    pub(crate) fn live_len(&self, now: DateTime<Utc>) -> usize {
        self.entries
            .values()
            .filter(|entry| entry.expires_at > now)
            .count()
    }
}
