//! Commit orchestrator: the `save_message` workflow.
//!
//! A save claims its idempotency key, allocates a sequence number, and
//! inserts the message. The insert is the single commit point; everything
//! after it is bookkeeping that a later retry can repair. Every conflict the
//! store reports has its own recovery path:
//!
//! | Store reports | Recovery |
//! |---|---|
//! | duplicate client message id | replay the stored winner |
//! | duplicate server id | swap in a new candidate, keep the sequence |
//! | duplicate sequence | raise the allocator floor, allocate again |
//! | transient failure | back off and retry |

use std::sync::Arc;

use mockable::Clock;
use tracing::{debug, error, info, instrument, warn};

use super::config::CommitConfig;
use super::error::{SaveContext, SaveMessageError, SaveResult, WriteFailure};
use crate::idempotency::{
    domain::{EnsurePendingOutcome, IdempotencyKey, IdempotencyStatus},
    error::IdempotencyError,
    ports::IdempotencyIndex,
};
use crate::message::{
    domain::{
        Fingerprint, Message, MessageMeta, MessageOrigin, Payload, SequenceNumber,
        ServerMessageId,
    },
    error::MessageStoreError,
    ports::{MessageStore, RandomServerIdGenerator, ServerIdGenerator},
};
use crate::retry::{TransientError, retry_transient, with_deadline};
use crate::sequence::{domain::ConversationKey, services::SequenceAllocator};

/// An inbound request to store one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveMessageRequest {
    origin: MessageOrigin,
    payload: Payload,
    fingerprint: Option<Fingerprint>,
}

impl SaveMessageRequest {
    /// Creates a request whose fingerprint is derived from the payload.
    #[must_use]
    pub const fn new(origin: MessageOrigin, payload: Payload) -> Self {
        Self {
            origin,
            payload,
            fingerprint: None,
        }
    }

    /// Uses a caller-computed fingerprint instead of hashing the payload.
    #[must_use]
    pub fn with_fingerprint(mut self, fingerprint: Fingerprint) -> Self {
        self.fingerprint = Some(fingerprint);
        self
    }

    /// Returns the message origin.
    #[must_use]
    pub const fn origin(&self) -> &MessageOrigin {
        &self.origin
    }

    /// Returns the payload.
    #[must_use]
    pub const fn payload(&self) -> &Payload {
        &self.payload
    }
}

/// State of one save after its key has been claimed.
struct Attempt {
    origin: MessageOrigin,
    payload: Payload,
    fingerprint: Fingerprint,
    key: IdempotencyKey,
    conversation: ConversationKey,
    context: SaveContext,
    server_id: ServerMessageId,
}

impl Attempt {
    fn message(&self, sequence: SequenceNumber, clock: &impl Clock) -> Message {
        Message::new(
            self.origin.clone(),
            self.server_id,
            sequence,
            self.payload.clone(),
            self.fingerprint.clone(),
            clock,
        )
    }
}

enum Claim {
    Replay(MessageMeta),
    Proceed(ServerMessageId),
}

/// Stores messages exactly once with a strictly increasing per-conversation
/// sequence number.
///
/// Safe to share between tasks; concurrent saves never wait on each other
/// beyond the atomic operations of the underlying ports.
#[derive(Clone)]
pub struct CommitOrchestrator<S, I, C>
where
    S: MessageStore,
    I: IdempotencyIndex,
    C: Clock + Send + Sync,
{
    store: Arc<S>,
    index: Arc<I>,
    allocator: SequenceAllocator,
    ids: Arc<dyn ServerIdGenerator>,
    clock: Arc<C>,
    config: CommitConfig,
}

impl<S, I, C> CommitOrchestrator<S, I, C>
where
    S: MessageStore,
    I: IdempotencyIndex,
    C: Clock + Send + Sync,
{
    /// Creates an orchestrator with default configuration and random
    /// server identifiers.
    #[must_use]
    pub fn new(store: Arc<S>, index: Arc<I>, allocator: SequenceAllocator, clock: Arc<C>) -> Self {
        Self {
            store,
            index,
            allocator,
            ids: Arc::new(RandomServerIdGenerator),
            clock,
            config: CommitConfig::default(),
        }
    }

    /// Replaces the configuration.
    #[must_use]
    pub const fn with_config(mut self, config: CommitConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces the server identifier source.
    #[must_use]
    pub fn with_id_generator(mut self, ids: Arc<dyn ServerIdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    /// Returns the active configuration.
    #[must_use]
    pub const fn config(&self) -> &CommitConfig {
        &self.config
    }

    /// Returns the sequence allocator.
    #[must_use]
    pub const fn allocator(&self) -> &SequenceAllocator {
        &self.allocator
    }

    /// Stores a message, or returns the metadata of the copy already stored
    /// under the same client message identifier.
    ///
    /// # Errors
    ///
    /// Returns [`SaveMessageError::IdempotencyConflict`] when the client
    /// message identifier was used with a different payload,
    /// [`SaveMessageError::Allocation`] or [`SaveMessageError::WriteFailed`]
    /// when dependencies fail (both retryable), and
    /// [`SaveMessageError::InternalInconsistency`] when stored state
    /// contradicts itself.
    #[instrument(
        skip(self, request),
        fields(
            tenant = %request.origin.tenant_id,
            conversation = %request.origin.conversation_id,
            client_message_id = %request.origin.client_message_id,
        )
    )]
    pub async fn save_message(&self, request: SaveMessageRequest) -> SaveResult<MessageMeta> {
        let SaveMessageRequest {
            origin,
            payload,
            fingerprint,
        } = request;
        let fingerprint = fingerprint.unwrap_or_else(|| Fingerprint::of(&payload));
        let context = SaveContext::from(&origin);
        let key = IdempotencyKey::for_origin(&origin);

        let server_id = match self.claim(&key, &fingerprint, &context).await? {
            Claim::Replay(meta) => {
                debug!(seq = meta.sequence.value(), "replaying stored message");
                return Ok(meta);
            }
            Claim::Proceed(server_id) => server_id,
        };

        let mut attempt = Attempt {
            conversation: ConversationKey::new(
                origin.tenant_id.clone(),
                origin.conversation_id.clone(),
            ),
            origin,
            payload,
            fingerprint,
            key,
            context,
            server_id,
        };
        let outcome = self.commit(&mut attempt).await;
        if let Err(err) = &outcome {
            self.roll_back(&attempt, err).await;
        }
        outcome
    }

    /// Claims the idempotency key, or decides the request is a replay.
    async fn claim(
        &self,
        key: &IdempotencyKey,
        fingerprint: &Fingerprint,
        context: &SaveContext,
    ) -> SaveResult<Claim> {
        let proposed = self.ids.generate();
        let outcome = retry_transient(
            &self.config.retry,
            self.config.dependency_timeout,
            "ensure_pending",
            || self.index.ensure_pending(key, fingerprint, proposed),
        )
        .await
        .map_err(|err| SaveMessageError::write_failed(context, err))?;

        let record = match outcome {
            EnsurePendingOutcome::Created { server_id } => return Ok(Claim::Proceed(server_id)),
            EnsurePendingOutcome::Existing(record) => record,
        };
        if record.fingerprint != *fingerprint {
            return Err(SaveMessageError::conflict(context));
        }

        match (self.find_stored(key, context).await?, record.status) {
            (Some(stored), _) if stored.fingerprint() != fingerprint => {
                Err(SaveMessageError::conflict(context))
            }
            (Some(stored), IdempotencyStatus::Committed) => Ok(Claim::Replay(stored.meta())),
            (Some(stored), IdempotencyStatus::Pending) => {
                // An earlier attempt stored the row but never promoted the
                // record.
                self.promote(key, &stored).await;
                Ok(Claim::Replay(stored.meta()))
            }
            (None, IdempotencyStatus::Committed) => {
                let detail = "idempotency record is committed but no message is stored";
                error!(server_id = %record.server_id, "{detail}");
                Err(SaveMessageError::inconsistency(context, detail))
            }
            (None, IdempotencyStatus::Pending) => Ok(Claim::Proceed(record.server_id)),
        }
    }

    async fn commit(&self, attempt: &mut Attempt) -> SaveResult<MessageMeta> {
        let mut sequence = self.allocate(attempt).await?;
        let mut transient_failures = 0_u32;
        let mut sequence_conflicts = 0_u32;
        let mut id_collisions = 0_u32;

        loop {
            let message = attempt.message(sequence, &*self.clock);
            let inserted = with_deadline(
                "insert",
                self.config.dependency_timeout,
                self.store.insert(&message),
            )
            .await;
            let Err(err) = inserted else {
                return Ok(self.finish(attempt, &message).await);
            };

            match err {
                MessageStoreError::DuplicateClientMessage { .. } => {
                    return self.adopt_winner(attempt).await;
                }
                MessageStoreError::DuplicateServerId(taken) => {
                    id_collisions += 1;
                    if id_collisions > self.config.max_server_id_collisions {
                        let reason = WriteFailure::ServerIdCollisions {
                            attempts: id_collisions,
                        };
                        return Err(SaveMessageError::write_failed(&attempt.context, reason));
                    }
                    warn!(%taken, "server id collision, rotating candidate");
                    if let Some(meta) = self.rotate_server_id(attempt).await? {
                        return Ok(meta);
                    }
                }
                MessageStoreError::DuplicateSequence {
                    sequence: taken, ..
                } => {
                    sequence_conflicts += 1;
                    if sequence_conflicts > self.config.max_sequence_conflicts {
                        let reason = WriteFailure::SequenceConflicts {
                            attempts: sequence_conflicts,
                        };
                        return Err(SaveMessageError::write_failed(&attempt.context, reason));
                    }
                    sequence = self.reconcile_sequence(attempt, taken).await?;
                }
                err if err.is_transient() => {
                    transient_failures += 1;
                    if transient_failures >= self.config.retry.max_attempts {
                        return Err(SaveMessageError::write_failed(&attempt.context, err));
                    }
                    let delay = self.config.retry.backoff_for(transient_failures);
                    warn!(
                        attempt = transient_failures,
                        ?delay,
                        error = %err,
                        "transient insert failure, backing off"
                    );
                    tokio::time::sleep(delay).await;
                }
                err => return Err(SaveMessageError::write_failed(&attempt.context, err)),
            }
        }
    }

    async fn allocate(&self, attempt: &Attempt) -> SaveResult<SequenceNumber> {
        with_deadline(
            "allocate",
            self.config.dependency_timeout,
            self.allocator.allocate(&attempt.conversation, 1),
        )
        .await
        .map(|allocation| allocation.start())
        .map_err(|err| SaveMessageError::allocation(&attempt.context, err))
    }

    /// Post-commit bookkeeping. Failures are logged, never surfaced: the
    /// message is already durable and a retry repairs the index.
    async fn finish(&self, attempt: &Attempt, message: &Message) -> MessageMeta {
        self.promote(&attempt.key, message).await;

        let watermark = with_deadline(
            "record_committed",
            self.config.dependency_timeout,
            self.allocator
                .record_committed(&attempt.conversation, message.sequence()),
        )
        .await;
        if let Err(err) = watermark {
            warn!(error = %err, "failed to raise commit watermark");
        }

        info!(
            seq = message.sequence().value(),
            server_id = %message.server_id(),
            "message committed"
        );
        message.meta()
    }

    /// Marks the key committed to `stored`.
    async fn promote(&self, key: &IdempotencyKey, stored: &Message) {
        let promoted = with_deadline(
            "mark_committed",
            self.config.dependency_timeout,
            self.index
                .mark_committed(key, stored.server_id(), stored.fingerprint()),
        )
        .await;
        match promoted {
            Ok(()) => {}
            Err(err @ IdempotencyError::CommittedMismatch { .. }) => {
                error!(error = %err, "idempotency record disagrees with the stored message");
            }
            Err(err) => warn!(error = %err, "failed to promote idempotency record"),
        }
    }

    /// Another attempt stored this client message first.
    async fn adopt_winner(&self, attempt: &Attempt) -> SaveResult<MessageMeta> {
        let Some(winner) = self.find_stored(&attempt.key, &attempt.context).await? else {
            let detail = "store reported a duplicate client message id but holds no such row";
            error!("{detail}");
            return Err(SaveMessageError::inconsistency(&attempt.context, detail));
        };
        if winner.fingerprint() != &attempt.fingerprint {
            return Err(SaveMessageError::conflict(&attempt.context));
        }

        debug!(server_id = %winner.server_id(), "adopting concurrently stored message");
        self.promote(&attempt.key, &winner).await;
        Ok(winner.meta())
    }

    /// Swaps in a fresh server identifier. Returns the stored winner's
    /// metadata if the key was committed in the meantime.
    async fn rotate_server_id(&self, attempt: &mut Attempt) -> SaveResult<Option<MessageMeta>> {
        let candidate = self.ids.generate();
        let swapped = retry_transient(
            &self.config.retry,
            self.config.dependency_timeout,
            "update_server_id_if_pending",
            || {
                self.index
                    .update_server_id_if_pending(&attempt.key, &attempt.fingerprint, candidate)
            },
        )
        .await
        .map_err(|err| SaveMessageError::write_failed(&attempt.context, err))?;

        if swapped {
            attempt.server_id = candidate;
            return Ok(None);
        }

        match self.find_stored(&attempt.key, &attempt.context).await? {
            Some(winner) if winner.fingerprint() == &attempt.fingerprint => {
                self.promote(&attempt.key, &winner).await;
                Ok(Some(winner.meta()))
            }
            Some(_) => Err(SaveMessageError::conflict(&attempt.context)),
            None => Err(SaveMessageError::write_failed(
                &attempt.context,
                WriteFailure::ClaimLost,
            )),
        }
    }

    /// Moves the allocator past everything stored and allocates again.
    async fn reconcile_sequence(
        &self,
        attempt: &Attempt,
        taken: SequenceNumber,
    ) -> SaveResult<SequenceNumber> {
        let stored_max = retry_transient(
            &self.config.retry,
            self.config.dependency_timeout,
            "max_sequence",
            || {
                self.store
                    .max_sequence(&attempt.origin.tenant_id, &attempt.origin.conversation_id)
            },
        )
        .await
        .map_err(|err| SaveMessageError::write_failed(&attempt.context, err))?;

        let floor = stored_max.map_or(taken, |stored| stored.max(taken));
        warn!(
            taken = taken.value(),
            floor = floor.value(),
            "sequence number already stored, reconciling allocator"
        );
        with_deadline(
            "reconcile_floor",
            self.config.dependency_timeout,
            self.allocator.reconcile_floor(&attempt.conversation, floor),
        )
        .await
        .map_err(|err| SaveMessageError::allocation(&attempt.context, err))?;

        self.allocate(attempt).await
    }

    async fn find_stored(
        &self,
        key: &IdempotencyKey,
        context: &SaveContext,
    ) -> SaveResult<Option<Message>> {
        retry_transient(
            &self.config.retry,
            self.config.dependency_timeout,
            "find_by_client_message",
            || {
                self.store.find_by_client_message(
                    key.tenant_id(),
                    key.sender_id(),
                    key.client_message_id(),
                )
            },
        )
        .await
        .map_err(|err| SaveMessageError::write_failed(context, err))
    }

    /// Shrinks the pending record so the client can retry soon.
    async fn roll_back(&self, attempt: &Attempt, cause: &SaveMessageError) {
        let rolled_back = with_deadline(
            "rollback_short_ttl",
            self.config.dependency_timeout,
            self.index.rollback_short_ttl(&attempt.key),
        )
        .await;
        match rolled_back {
            Ok(()) => warn!(error = %cause, "save failed, idempotency record rolled back"),
            Err(err) => error!(
                error = %err,
                cause = %cause,
                "save failed and idempotency rollback failed"
            ),
        }
    }
}
