//! Persistence adapters for the message module.
//!
//! This module provides concrete implementations of the [`MessageStore`]
//! port, following hexagonal architecture principles. Adapters handle all
//! infrastructure concerns while the domain remains pure.
//!
//! # Available Adapters
//!
//! - [`memory::InMemoryMessageStore`]: Thread-safe in-memory storage for
//!   unit testing and single-node deployments
//! - [`postgres::PostgresMessageStore`]: Production-grade `PostgreSQL`
//!   persistence using Diesel ORM
//!
//! [`MessageStore`]: crate::message::ports::store::MessageStore

pub mod memory;
pub mod models;
pub mod postgres;
pub mod schema;
