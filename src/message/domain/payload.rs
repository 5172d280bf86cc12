//! Opaque message payloads and their content fingerprints.

use super::ParseFingerprintError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Maximum length of a caller-supplied fingerprint.
const MAX_FINGERPRINT_LENGTH: usize = 128;

/// Opaque message body as received from the transport layer.
///
/// The ingestion core never inspects payload bytes; it only stores them and
/// fingerprints them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Payload(Vec<u8>);

impl Payload {
    /// Wraps raw payload bytes.
    #[must_use]
    pub const fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Returns the payload bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Consumes the payload, returning its bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// Returns the payload length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` when the payload carries no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for Payload {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Self(text.as_bytes().to_vec())
    }
}

/// Content hash of a payload.
///
/// Fingerprints detect a client reusing a message identifier for different
/// content. They are never used as message identity.
///
/// # Examples
///
/// ```
/// use parley::message::domain::{Fingerprint, Payload};
///
/// let a = Fingerprint::of(&Payload::from("hello"));
/// let b = Fingerprint::of(&Payload::from("hello"));
/// let c = Fingerprint::of(&Payload::from("world"));
/// assert_eq!(a, b);
/// assert_ne!(a, c);
/// assert_eq!(a.as_str().len(), 64);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Computes the SHA-256 fingerprint of a payload as lowercase hex.
    #[must_use]
    pub fn of(payload: &Payload) -> Self {
        Self(hex::encode(Sha256::digest(payload.as_bytes())))
    }

    /// Accepts a caller-supplied or persisted fingerprint.
    ///
    /// # Errors
    ///
    /// Returns [`ParseFingerprintError`] when the value is empty or longer
    /// than 128 characters.
    pub fn new(value: impl Into<String>) -> Result<Self, ParseFingerprintError> {
        let raw = value.into();
        if raw.is_empty() || raw.len() > MAX_FINGERPRINT_LENGTH {
            return Err(ParseFingerprintError(raw));
        }
        Ok(Self(raw))
    }

    /// Returns the fingerprint as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Fingerprint {
    type Error = ParseFingerprintError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Fingerprint> for String {
    fn from(value: Fingerprint) -> Self {
        value.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
