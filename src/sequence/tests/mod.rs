//! Unit tests for sequence allocation.
