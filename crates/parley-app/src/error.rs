//! Session error types.
//!
//! Every failure the session sees is turned into a [`SessionError`] and kept
//! as observable state for the view. None of them are fatal.

use parley_client::{AuthError, CloseReason, PersistenceError};
use parley_core::ConnectionError;
use thiserror::Error;

/// An intent was issued without what it needs.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreconditionError {
    /// Joining a room requires signing in first
    #[error("sign in before joining a room")]
    NotAuthenticated,

    /// Joining the anonymous relay requires a display name
    #[error("choose a display name before joining")]
    MissingDisplayName,

    /// Room name is empty
    #[error("room name is empty")]
    EmptyRoom,

    /// Username or password is empty
    #[error("username and password are required")]
    MissingCredentials,
}

/// User-visible session error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Login or signup failed
    #[error("{0}")]
    Auth(#[from] AuthError),

    /// Credential could not be persisted; the session continues in memory
    #[error("{0}")]
    Persistence(#[from] PersistenceError),

    /// Intent rejected before any request was made
    #[error("{0}")]
    Precondition(#[from] PreconditionError),

    /// Message sent without an open connection
    #[error("not connected; join a room to send")]
    NotConnected,

    /// Transport failed; the connection is closed
    #[error("connection failed: {detail}")]
    Transport {
        /// Transport error description.
        detail: String,
    },

    /// Relay closed the connection abnormally
    #[error("relay closed the connection: {reason}")]
    Dropped {
        /// Close code and reason from the relay.
        reason: CloseReason,
    },
}

impl From<ConnectionError> for SessionError {
    fn from(err: ConnectionError) -> Self {
        match err {
            ConnectionError::NotConnected => Self::NotConnected,
            other @ ConnectionError::InvalidState { .. } => {
                Self::Transport { detail: other.to_string() }
            },
        }
    }
}

impl SessionError {
    /// True if rejoining a room may clear the error.
    pub fn needs_rejoin(&self) -> bool {
        matches!(self, Self::NotConnected | Self::Transport { .. } | Self::Dropped { .. })
    }
}
