//! Observable session state types.
//!
//! View-model structures the view renders: the message log entries and the
//! coarse status line.

use std::fmt;

use parley_core::ConnectionId;

/// One received message.
///
/// Immutable once appended. Records the connection that delivered it so a
/// view can group messages by join.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Connection the frame arrived on.
    pub connection: ConnectionId,
    /// Frame text, as received.
    pub text: String,
}

/// Coarse session status for the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// No identity yet.
    SignedOut,
    /// Login/signup request in flight.
    Authenticating,
    /// Identity known, no connection.
    Ready,
    /// Connection requested.
    Connecting,
    /// Connection open.
    Connected,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::SignedOut => "signed out",
            Self::Authenticating => "authenticating",
            Self::Ready => "ready",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
        };
        f.write_str(text)
    }
}
