//! Message storage and the commit workflow.
//!
//! This module owns the stored message record, the store port with its
//! uniqueness guarantees, and the [`services::CommitOrchestrator`] that ties
//! sequence allocation and deduplication together into one `save_message`
//! call.
//!
//! # Architecture
//!
//! The module follows hexagonal architecture principles:
//!
//! - **Domain**: Pure domain types ([`domain::Message`], [`domain::Payload`], [`domain::Fingerprint`], etc.)
//! - **Ports**: Abstract trait interfaces ([`ports::store::MessageStore`], [`ports::id_generator::ServerIdGenerator`])
//! - **Adapters**: Concrete implementations ([`adapters::memory::InMemoryMessageStore`], [`adapters::postgres::PostgresMessageStore`])
//! - **Services**: The commit workflow ([`services::CommitOrchestrator`])
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use mockable::DefaultClock;
//! use parley::idempotency::adapters::memory::InMemoryIdempotencyIndex;
//! use parley::message::adapters::memory::InMemoryMessageStore;
//! use parley::message::domain::{
//!     ClientMessageId, ConversationId, MessageOrigin, Payload, SenderId, TenantId,
//! };
//! use parley::message::services::{CommitOrchestrator, SaveMessageRequest};
//! use parley::sequence::adapters::memory::{InMemorySegmentCache, InMemorySequenceLedger};
//! use parley::sequence::services::{SegmentAllocatorConfig, SequenceAllocator};
//!
//! let allocator = SequenceAllocator::segmented(
//!     Arc::new(InMemorySequenceLedger::new(DefaultClock)),
//!     Arc::new(InMemorySegmentCache::new(DefaultClock)),
//!     Arc::new(DefaultClock),
//!     SegmentAllocatorConfig::default(),
//! );
//! let orchestrator = CommitOrchestrator::new(
//!     Arc::new(InMemoryMessageStore::new()),
//!     Arc::new(InMemoryIdempotencyIndex::new(DefaultClock)),
//!     allocator,
//!     Arc::new(DefaultClock),
//! );
//!
//! let origin = MessageOrigin::new(
//!     TenantId::new("t1").expect("tenant"),
//!     ConversationId::new("c1").expect("conversation"),
//!     SenderId::new("u1").expect("sender"),
//!     ClientMessageId::new("abc").expect("client id"),
//! );
//! let runtime = tokio::runtime::Builder::new_current_thread()
//!     .enable_all()
//!     .build()
//!     .expect("runtime");
//! let meta = runtime
//!     .block_on(orchestrator.save_message(SaveMessageRequest::new(origin, Payload::from("hello"))))
//!     .expect("message saved");
//! assert_eq!(meta.sequence.value(), 1);
//! ```

pub mod adapters;
pub mod domain;
pub mod error;
pub mod ports;
pub mod services;
