//! Exactly-once storage under at-least-once delivery.
//!
//! Clients retry sends with the same client message identifier. The
//! idempotency index remembers, for a bounded window, which server
//! identifier each `(tenant, sender, client message id)` was given and
//! whether the message has been stored, so a retry is answered from the
//! original write instead of producing a second message.
//!
//! Record lifecycle: absent, then pending, then either committed or rolled
//! back. A rolled-back record lingers only briefly so the client can retry.

pub mod adapters;
pub mod domain;
pub mod error;
pub mod ports;

#[cfg(test)]
mod tests;
