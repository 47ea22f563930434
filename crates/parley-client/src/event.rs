//! Transport events and connection actions.

use std::fmt;

use parley_core::ConnectionId;

/// Close code for a normal closure.
pub const CLOSE_NORMAL: u16 = 1000;

/// Close code for an endpoint going away (server shutdown, page navigation).
pub const CLOSE_GOING_AWAY: u16 = 1001;

/// Close code the relay uses when it rejects the token.
pub const CLOSE_POLICY_VIOLATION: u16 = 1008;

/// Close code and reason sent by the peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseReason {
    /// WebSocket close code.
    pub code: u16,
    /// Free-form reason text. May be empty.
    pub reason: String,
}

impl CloseReason {
    /// Create a close reason.
    pub fn new(code: u16, reason: impl Into<String>) -> Self {
        Self { code, reason: reason.into() }
    }

    /// True for normal closure and going-away; anything else is worth
    /// surfacing to the user.
    pub fn is_clean(&self) -> bool {
        matches!(self.code, CLOSE_NORMAL | CLOSE_GOING_AWAY)
    }
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self.code {
            CLOSE_NORMAL => "normal closure",
            CLOSE_GOING_AWAY => "going away",
            CLOSE_POLICY_VIOLATION => "policy violation",
            _ => "closed",
        };
        if self.reason.is_empty() {
            write!(f, "{label} ({})", self.code)
        } else {
            write!(f, "{label} ({}): {}", self.code, self.reason)
        }
    }
}

/// What happened on a transport connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEventKind {
    /// Transport acknowledged the connection.
    Opened,
    /// One inbound text frame.
    Frame(String),
    /// Peer closed, or the stream ended. `None` if no close frame was seen.
    Closed(Option<CloseReason>),
    /// Transport error. Always terminal.
    Failed(String),
}

/// Event reported by a transport for one connection.
///
/// The caller feeds these into [`crate::ConnectionManager::handle`] in the
/// order the transport produced them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportEvent {
    /// Connection the event belongs to.
    pub id: ConnectionId,
    /// What happened.
    pub kind: TransportEventKind,
}

impl TransportEvent {
    /// Connection acknowledged.
    pub fn opened(id: ConnectionId) -> Self {
        Self { id, kind: TransportEventKind::Opened }
    }

    /// Inbound text frame.
    pub fn frame(id: ConnectionId, text: impl Into<String>) -> Self {
        Self { id, kind: TransportEventKind::Frame(text.into()) }
    }

    /// Connection closed.
    pub fn closed(id: ConnectionId, reason: Option<CloseReason>) -> Self {
        Self { id, kind: TransportEventKind::Closed(reason) }
    }

    /// Transport error.
    pub fn failed(id: ConnectionId, detail: impl Into<String>) -> Self {
        Self { id, kind: TransportEventKind::Failed(detail.into()) }
    }
}

/// Actions produced by the connection manager.
///
/// `Dial`, `Transmit` and `HangUp` are commands for the transport. `Opened`,
/// `Deliver`, `Failed` and `Closed` are lifecycle notifications for the
/// session: one `Deliver` per inbound frame in arrival order, `Failed` always
/// immediately followed by `Closed`, and nothing after `Closed` for that id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionAction {
    /// Open a transport connection to `url`.
    Dial {
        /// Connection being opened.
        id: ConnectionId,
        /// Composed endpoint URL.
        url: String,
    },

    /// Send one text frame.
    Transmit {
        /// Connection to send on.
        id: ConnectionId,
        /// Raw frame text.
        text: String,
    },

    /// Close the transport connection.
    HangUp {
        /// Connection to close.
        id: ConnectionId,
    },

    /// Connection is open.
    Opened {
        /// Connection that opened.
        id: ConnectionId,
    },

    /// Inbound message.
    Deliver {
        /// Connection that received it.
        id: ConnectionId,
        /// Frame text.
        text: String,
    },

    /// Connection failed.
    Failed {
        /// Connection that failed.
        id: ConnectionId,
        /// Error description.
        detail: String,
    },

    /// Connection closed.
    Closed {
        /// Connection that closed.
        id: ConnectionId,
        /// Peer close reason, if any.
        reason: Option<CloseReason>,
    },
}

impl ConnectionAction {
    /// Connection this action refers to.
    pub fn id(&self) -> ConnectionId {
        match self {
            Self::Dial { id, .. }
            | Self::Transmit { id, .. }
            | Self::HangUp { id }
            | Self::Opened { id }
            | Self::Deliver { id, .. }
            | Self::Failed { id, .. }
            | Self::Closed { id, .. } => *id,
        }
    }
}
