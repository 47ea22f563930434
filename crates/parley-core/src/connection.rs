//! Connection state machine.
//!
//! One [`Connection`] represents one transport session to one
//! [`RoomAddress`]. It only moves forward; once `Closed` it stays closed and a
//! retry needs a fresh connection with a fresh [`ConnectionId`].
//!
//! # State Machine
//!
//! ```text
//! ┌──────┐  begin   ┌────────────┐  acknowledge  ┌──────┐
//! │ Idle │─────────>│ Connecting │──────────────>│ Open │
//! └──────┘          └────────────┘               └──────┘
//!     │                   │                         │
//!     │ close             │ close/error             │ close/remote close/error
//!     ↓                   ↓                         ↓
//!                    ┌────────┐
//!                    │ Closed │  (terminal)
//!                    └────────┘
//! ```
//!
//! Time is passed in by the caller, keeping the machine free of clocks.

use std::{
    fmt,
    time::{Duration, Instant},
};

use crate::{credential::RoomAddress, error::ConnectionError};

/// Identity of a connection.
///
/// Issued in increasing order by the connection manager. Events are matched
/// to connections by id, never by room name, so a quick rejoin of the same
/// room cannot confuse the old and new connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Wrap a raw id.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw id value.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Connection lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    /// Created, nothing requested yet
    Idle,
    /// Dial requested, waiting for the transport to acknowledge
    Connecting,
    /// Transport acknowledged, frames may flow
    Open,
    /// Closed by us, by the peer, or by an error
    Closed,
}

impl ConnectionState {
    /// True for `Connecting` and `Open`.
    pub fn is_live(self) -> bool {
        matches!(self, Self::Connecting | Self::Open)
    }
}

/// A single transport session to a room.
#[derive(Debug, Clone)]
pub struct Connection {
    id: ConnectionId,
    address: RoomAddress,
    url: String,
    state: ConnectionState,
    /// When the dial was requested
    requested_at: Instant,
}

impl Connection {
    /// Create a connection in [`ConnectionState::Idle`].
    pub fn new(id: ConnectionId, address: RoomAddress, url: String, now: Instant) -> Self {
        Self { id, address, url, state: ConnectionState::Idle, requested_at: now }
    }

    /// Connection identity.
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Room and username this connection targets.
    pub fn address(&self) -> &RoomAddress {
        &self.address
    }

    /// Fully composed endpoint URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Current state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// True while `Connecting` or `Open`.
    pub fn is_live(&self) -> bool {
        self.state.is_live()
    }

    /// Request the transport (Idle → Connecting).
    ///
    /// # Errors
    ///
    /// - `ConnectionError::InvalidState` if not in `Idle`
    pub fn begin(&mut self, now: Instant) -> Result<(), ConnectionError> {
        if self.state != ConnectionState::Idle {
            return Err(ConnectionError::InvalidState { state: self.state, operation: "begin" });
        }

        self.state = ConnectionState::Connecting;
        self.requested_at = now;
        Ok(())
    }

    /// Transport acknowledged the connection (Connecting → Open).
    ///
    /// # Errors
    ///
    /// - `ConnectionError::InvalidState` if not in `Connecting`
    pub fn acknowledge(&mut self) -> Result<(), ConnectionError> {
        if self.state != ConnectionState::Connecting {
            return Err(ConnectionError::InvalidState {
                state: self.state,
                operation: "acknowledge",
            });
        }

        self.state = ConnectionState::Open;
        Ok(())
    }

    /// Move to `Closed`.
    ///
    /// Returns `true` if this call performed the transition, `false` if the
    /// connection was already closed.
    pub fn close(&mut self) -> bool {
        if self.state == ConnectionState::Closed {
            return false;
        }
        self.state = ConnectionState::Closed;
        true
    }

    /// Elapsed time since the dial, if still connecting past `timeout`.
    pub fn check_timeout(&self, now: Instant, timeout: Duration) -> Option<Duration> {
        if self.state != ConnectionState::Connecting {
            return None;
        }

        let elapsed = now.saturating_duration_since(self.requested_at);
        if elapsed > timeout { Some(elapsed) } else { None }
    }
}
