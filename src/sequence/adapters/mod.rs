//! Adapter implementations of the sequence ports.

pub mod memory;
pub mod postgres;
