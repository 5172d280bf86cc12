//! Error types for message domain validation and parsing.

use thiserror::Error;

/// Errors returned while constructing identifiers.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IdentifierError {
    /// The identifier is empty after trimming.
    #[error("{kind} must not be empty")]
    Empty {
        /// Which identifier failed validation.
        kind: &'static str,
    },

    /// The identifier exceeds the storage limit.
    #[error("{kind} is {length} bytes, exceeds limit of {max}")]
    TooLong {
        /// Which identifier failed validation.
        kind: &'static str,
        /// The rejected length in bytes.
        length: usize,
        /// The maximum permitted length in bytes.
        max: usize,
    },
}

/// Error returned while parsing a stored fingerprint.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid fingerprint '{0}': expected 1 to 128 characters")]
pub struct ParseFingerprintError(pub String);
