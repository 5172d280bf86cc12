//! Port trait definitions for the message subsystem.
//!
//! Ports define the abstract interfaces that the domain requires from
//! infrastructure. Adapters implement these ports to connect the domain
//! to databases, external services, and other infrastructure.

pub mod id_generator;
pub mod store;

pub use id_generator::{RandomServerIdGenerator, ServerIdGenerator};
pub use store::{MessageStore, StoreResult};
