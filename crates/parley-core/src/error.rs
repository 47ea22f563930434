//! Error types for the Parley core.
//!
//! Connection errors cover state machine misuse and sends without an open
//! connection. Endpoint errors cover relay base URLs that cannot address a
//! room.

use thiserror::Error;

use crate::connection::ConnectionState;

/// Errors from connection state machine operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    /// Invalid state transition attempted
    #[error("invalid state transition: cannot {operation} from {state:?}")]
    InvalidState {
        /// Current state when error occurred
        state: ConnectionState,
        /// Operation that was attempted
        operation: &'static str,
    },

    /// Send attempted without an open connection
    #[error("not connected")]
    NotConnected,
}

impl ConnectionError {
    /// Returns true if the caller can recover by reconnecting.
    ///
    /// Sending without a connection is expected after the relay drops us; an
    /// invalid transition is a bug in the caller.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::NotConnected)
    }
}

/// Errors from relay endpoint configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EndpointError {
    /// Base address could not be parsed
    #[error("invalid relay address {address:?}: {reason}")]
    Invalid {
        /// Address as given
        address: String,
        /// Parser message
        reason: String,
    },

    /// Base address is not a WebSocket URL
    #[error("unsupported relay scheme {0:?}, expected ws or wss")]
    UnsupportedScheme(String),
}
