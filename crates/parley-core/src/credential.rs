//! Identity types.
//!
//! A [`Credential`] is the token/username pair issued by the authentication
//! service. A [`RoomAddress`] names the target of a connection.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Authentication token and the username it was issued for.
///
/// Both fields are always present together. Serializes to a JSON object with
/// the keys `token` and `username`, which is the persisted format.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    /// Opaque access token.
    pub token: String,
    /// Username the token was issued for.
    pub username: String,
}

impl Credential {
    /// Create a credential from a token and username.
    pub fn new(token: impl Into<String>, username: impl Into<String>) -> Self {
        Self { token: token.into(), username: username.into() }
    }

    /// True if either field is empty. Credential stores refuse to persist
    /// such a credential and treat a stored one as corrupt.
    pub fn is_blank(&self) -> bool {
        self.token.is_empty() || self.username.is_empty()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"<redacted>")
            .field("username", &self.username)
            .finish()
    }
}

/// Target of a connection: a room joined under a username.
///
/// Immutable once a connection is requested. Joining a different room means
/// requesting a new connection with a new address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoomAddress {
    room: String,
    username: String,
}

impl RoomAddress {
    /// Create an address for `username` in `room`.
    pub fn new(room: impl Into<String>, username: impl Into<String>) -> Self {
        Self { room: room.into(), username: username.into() }
    }

    /// Room name. Empty in the anonymous variant.
    pub fn room(&self) -> &str {
        &self.room
    }

    /// Username the connection is opened for.
    pub fn username(&self) -> &str {
        &self.username
    }
}

impl fmt::Display for RoomAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.room.is_empty() {
            write!(f, "{}", self.username)
        } else {
            write!(f, "#{} as {}", self.room, self.username)
        }
    }
}
