//! In-memory implementation of the `SequenceLedger` port.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use mockable::Clock;

use crate::message::domain::SequenceNumber;
use crate::sequence::{
    domain::{ConversationKey, ConversationSequenceState, Segment},
    error::LedgerError,
    ports::ledger::{LedgerResult, SequenceLedger},
};

/// In-memory implementation of [`SequenceLedger`].
///
/// Thread-safe via an internal [`Mutex`]; every method runs under one lock
/// acquisition, which gives it the atomicity of a single SQL statement.
/// Counts reservations so tests can assert how often the allocator fell
/// back to the ledger.
#[derive(Debug, Clone)]
pub struct InMemorySequenceLedger<C: Clock + Send + Sync> {
    rows: Arc<Mutex<HashMap<ConversationKey, ConversationSequenceState>>>,
    reservations: Arc<AtomicU64>,
    clock: C,
}

impl<C: Clock + Send + Sync> InMemorySequenceLedger<C> {
    /// Creates an empty ledger with the given clock.
    #[must_use]
    pub fn new(clock: C) -> Self {
        Self {
            rows: Arc::new(Mutex::new(HashMap::new())),
            reservations: Arc::new(AtomicU64::new(0)),
            clock,
        }
    }

    /// Returns how many times [`SequenceLedger::reserve`] has been called.
    #[must_use]
    pub fn reservation_count(&self) -> u64 {
        self.reservations.load(Ordering::SeqCst)
    }

    fn lock(
        &self,
    ) -> LedgerResult<MutexGuard<'_, HashMap<ConversationKey, ConversationSequenceState>>> {
        self.rows
            .lock()
            .map_err(|e| LedgerError::unavailable(format!("lock poisoned: {e}")))
    }

    fn row<'a>(
        &self,
        rows: &'a mut HashMap<ConversationKey, ConversationSequenceState>,
        key: &ConversationKey,
    ) -> &'a mut ConversationSequenceState {
        rows.entry(key.clone())
            .or_insert_with(|| ConversationSequenceState::empty(key.clone(), self.clock.utc()))
    }
}

#[async_trait]
impl<C: Clock + Send + Sync> SequenceLedger for InMemorySequenceLedger<C> {
    async fn reserve(&self, key: &ConversationKey, count: u64) -> LedgerResult<Segment> {
        self.reservations.fetch_add(1, Ordering::SeqCst);
        let now = self.clock.utc();
        let mut rows = self.lock()?;
        self.row(&mut rows, key)
            .reserve(count, now)
            .ok_or_else(|| LedgerError::Overflow { key: key.clone() })
    }

    async fn raise_issued(&self, key: &ConversationKey, floor: SequenceNumber) -> LedgerResult<()> {
        let now = self.clock.utc();
        let mut rows = self.lock()?;
        self.row(&mut rows, key).raise_issued(floor, now);
        Ok(())
    }

    async fn raise_max(
        &self,
        key: &ConversationKey,
        committed: SequenceNumber,
    ) -> LedgerResult<()> {
        let now = self.clock.utc();
        let mut rows = self.lock()?;
        self.row(&mut rows, key).raise_max(committed, now);
        Ok(())
    }

    async fn raise_min(&self, key: &ConversationKey, floor: SequenceNumber) -> LedgerResult<()> {
        let now = self.clock.utc();
        let mut rows = self.lock()?;
        if let Some(row) = rows.get_mut(key) {
            row.raise_min(floor, now);
        }
        Ok(())
    }

    async fn load(&self, key: &ConversationKey) -> LedgerResult<Option<ConversationSequenceState>> {
        let rows = self.lock()?;
        Ok(rows.get(key).cloned())
    }
}
