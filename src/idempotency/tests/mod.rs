//! Unit tests for the idempotency index.
