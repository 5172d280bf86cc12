//! Domain identifier newtypes for tenants, conversations, senders, and
//! messages.
//!
//! Upstream collaborators (authentication, conversation resolution) hand the
//! ingestion core opaque string identifiers; these types validate them once at
//! the boundary so the rest of the crate cannot mix a sender with a
//! conversation. Server-assigned message identifiers wrap UUIDs.

use super::IdentifierError;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Maximum length of a caller-supplied identifier, matching the `TEXT`
/// columns' index limit used by the `PostgreSQL` adapters.
const MAX_IDENTIFIER_LENGTH: usize = 255;

fn validate_identifier(kind: &'static str, value: String) -> Result<String, IdentifierError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(IdentifierError::Empty { kind });
    }
    if trimmed.len() > MAX_IDENTIFIER_LENGTH {
        return Err(IdentifierError::TooLong {
            kind,
            length: trimmed.len(),
            max: MAX_IDENTIFIER_LENGTH,
        });
    }
    Ok(trimmed.to_owned())
}

macro_rules! string_identifier {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Creates a validated identifier.
            ///
            /// Surrounding whitespace is trimmed.
            ///
            /// # Errors
            ///
            /// Returns [`IdentifierError::Empty`] when nothing remains after
            /// trimming, or [`IdentifierError::TooLong`] when the value exceeds
            /// 255 bytes.
            pub fn new(value: impl Into<String>) -> Result<Self, IdentifierError> {
                validate_identifier($kind, value.into()).map(Self)
            }

            /// Returns the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = IdentifierError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl TryFrom<&str> for $name {
            type Error = IdentifierError;

            fn try_from(value: &str) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                self.as_str()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_identifier!(
    /// Identifier of the tenant that owns a conversation.
    ///
    /// # Examples
    ///
    /// ```
    /// use parley::message::domain::TenantId;
    ///
    /// let tenant = TenantId::new(" acme ").expect("valid tenant");
    /// assert_eq!(tenant.as_str(), "acme");
    /// ```
    TenantId,
    "tenant id"
);

string_identifier!(
    /// Identifier of a conversation within a tenant.
    ConversationId,
    "conversation id"
);

string_identifier!(
    /// Identifier of the authenticated sender of a message.
    SenderId,
    "sender id"
);

string_identifier!(
    /// Client-generated message identifier used to deduplicate retries.
    ///
    /// Clients reuse the same value when they resend a message they have not
    /// seen acknowledged.
    ClientMessageId,
    "client message id"
);

/// Server-assigned unique identifier for a stored message.
///
/// # Examples
///
/// ```
/// use parley::message::domain::ServerMessageId;
///
/// let id = ServerMessageId::new();
/// assert!(!id.as_ref().is_nil());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServerMessageId(Uuid);

impl ServerMessageId {
    /// Creates a new random server message identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a server message identifier from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID value.
    #[must_use]
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

/// Note: This implementation generates a new random UUID on each call,
/// which is non-standard behaviour for `Default`. Use
/// `ServerMessageId::new()` if the intent to generate a random ID should be
/// explicit.
impl Default for ServerMessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl AsRef<Uuid> for ServerMessageId {
    fn as_ref(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for ServerMessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Position of a message within its conversation.
///
/// Sequence numbers start at 1 and are strictly increasing within a
/// conversation. Gaps are permitted; reuse is not.
///
/// # Examples
///
/// ```
/// use parley::message::domain::SequenceNumber;
///
/// let seq = SequenceNumber::new(1);
/// assert_eq!(seq.value(), 1);
/// assert_eq!(seq.next().value(), 2);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SequenceNumber(u64);

impl SequenceNumber {
    /// The value before the first issued sequence number.
    pub const ZERO: Self = Self(0);

    /// Creates a sequence number from a value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the underlying sequence value.
    #[must_use]
    pub const fn value(&self) -> u64 {
        self.0
    }

    /// Returns the next sequence number.
    ///
    /// Saturates at `u64::MAX`.
    #[must_use]
    pub const fn next(&self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl From<u64> for SequenceNumber {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for SequenceNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
