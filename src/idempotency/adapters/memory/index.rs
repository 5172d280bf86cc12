//! In-memory implementation of the `IdempotencyIndex` port.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use mockable::Clock;
use tracing::debug;

use crate::expiry::{ExpiringMap, expires_after};
use crate::idempotency::{
    domain::{
        EnsurePendingOutcome, IdempotencyKey, IdempotencyRecord, IdempotencyStatus,
        IdempotencyTtls,
    },
    error::IdempotencyError,
    ports::index::{IdempotencyIndex, IndexResult},
};
use crate::message::domain::{Fingerprint, ServerMessageId};

type Records = ExpiringMap<IdempotencyKey, IdempotencyRecord>;

/// In-memory implementation of [`IdempotencyIndex`].
///
/// Every call holds the internal [`Mutex`] for its whole compare-and-set.
/// Expiry is driven by the injected clock.
#[derive(Debug, Clone)]
pub struct InMemoryIdempotencyIndex<C: Clock + Send + Sync> {
    records: Arc<Mutex<Records>>,
    ttls: IdempotencyTtls,
    clock: C,
}

impl<C: Clock + Send + Sync> InMemoryIdempotencyIndex<C> {
    /// Creates an empty index with default lifetimes.
    #[must_use]
    pub fn new(clock: C) -> Self {
        Self::with_ttls(clock, IdempotencyTtls::default())
    }

    /// Creates an empty index with the given lifetimes.
    #[must_use]
    pub fn with_ttls(clock: C, ttls: IdempotencyTtls) -> Self {
        Self {
            records: Arc::new(Mutex::new(ExpiringMap::default())),
            ttls,
            clock,
        }
    }

    /// Returns the configured lifetimes.
    #[must_use]
    pub const fn ttls(&self) -> IdempotencyTtls {
        self.ttls
    }

    /// Returns the number of live records.
    ///
    /// Returns `0` if the internal lock is poisoned.
    #[must_use]
    pub fn len(&self) -> usize {
        let now = self.clock.utc();
        self.records
            .lock()
            .map(|records| records.live_len(now))
            .unwrap_or(0)
    }

    /// Returns `true` if no live records exist.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> IndexResult<MutexGuard<'_, Records>> {
        self.records
            .lock()
            .map_err(|e| IdempotencyError::unavailable(format!("lock poisoned: {e}")))
    }
}

#[async_trait]
impl<C: Clock + Send + Sync> IdempotencyIndex for InMemoryIdempotencyIndex<C> {
    async fn ensure_pending(
        &self,
        key: &IdempotencyKey,
        fingerprint: &Fingerprint,
        proposed: ServerMessageId,
    ) -> IndexResult<EnsurePendingOutcome> {
        let now = self.clock.utc();
        let mut records = self.lock()?;
        if let Some(existing) = records.live(key, now) {
            return Ok(EnsurePendingOutcome::Existing(existing.clone()));
        }

        records.insert(
            key.clone(),
            IdempotencyRecord::pending(proposed, fingerprint.clone()),
            now,
            self.ttls.pending,
        );
        Ok(EnsurePendingOutcome::Created {
            server_id: proposed,
        })
    }

    async fn mark_committed(
        &self,
        key: &IdempotencyKey,
        server_id: ServerMessageId,
        fingerprint: &Fingerprint,
    ) -> IndexResult<()> {
        let now = self.clock.utc();
        let mut records = self.lock()?;
        if let Some(existing) = records.live(key, now).filter(|record| record.is_committed()) {
            if existing.server_id == server_id {
                return Ok(());
            }
            return Err(IdempotencyError::CommittedMismatch {
                key: key.clone(),
                committed: existing.server_id,
                attempted: server_id,
            });
        }

        records.insert(
            key.clone(),
            IdempotencyRecord::committed(server_id, fingerprint.clone()),
            now,
            self.ttls.committed,
        );
        Ok(())
    }

    async fn update_server_id_if_pending(
        &self,
        key: &IdempotencyKey,
        fingerprint: &Fingerprint,
        server_id: ServerMessageId,
    ) -> IndexResult<bool> {
        let now = self.clock.utc();
        let mut records = self.lock()?;
        let Some(cached) = records.live_mut(key, now) else {
            return Ok(false);
        };

        let record = &mut cached.value;
        if record.status != IdempotencyStatus::Pending || record.fingerprint != *fingerprint {
            return Ok(false);
        }
        record.server_id = server_id;
        Ok(true)
    }

    async fn rollback_short_ttl(&self, key: &IdempotencyKey) -> IndexResult<()> {
        let now = self.clock.utc();
        let mut records = self.lock()?;
        let Some(cached) = records.live_mut(key, now) else {
            return Ok(());
        };

        if cached.value.is_committed() {
            debug!(%key, "rollback skipped for committed record");
            return Ok(());
        }
        cached.expires_at = cached.expires_at.min(expires_after(now, self.ttls.rollback));
        Ok(())
    }

    async fn get(&self, key: &IdempotencyKey) -> IndexResult<Option<IdempotencyRecord>> {
        let now = self.clock.utc();
        let mut records = self.lock()?;
        Ok(records.live(key, now).cloned())
    }
}
