//! Session side-effects.
//!
//! This module defines the [`SessionAction`] enum, the instructions produced
//! by the [`crate::Session`] state machine for the runtime to execute.

use parley_client::{AuthRequest, ConnectionAction};
use parley_core::ConnectionId;

/// Actions produced by the Session state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    /// Render the view.
    Render,

    /// Quit the application.
    Quit,

    /// Call the auth service. Completion comes back as
    /// [`crate::SessionEvent::AuthCompleted`].
    Authenticate(AuthRequest),

    /// Open a transport connection.
    Dial {
        /// Connection being opened.
        id: ConnectionId,
        /// Composed relay URL.
        url: String,
    },

    /// Send one text frame.
    Transmit {
        /// Connection to send on.
        id: ConnectionId,
        /// Frame text.
        text: String,
    },

    /// Close a transport connection.
    HangUp {
        /// Connection to close.
        id: ConnectionId,
    },
}

impl SessionAction {
    /// Transport command for a connection action, if it is one.
    pub(crate) fn from_transport(action: &ConnectionAction) -> Option<Self> {
        match action {
            ConnectionAction::Dial { id, url } => Some(Self::Dial { id: *id, url: url.clone() }),
            ConnectionAction::Transmit { id, text } => {
                Some(Self::Transmit { id: *id, text: text.clone() })
            },
            ConnectionAction::HangUp { id } => Some(Self::HangUp { id: *id }),
            ConnectionAction::Opened { .. }
            | ConnectionAction::Deliver { .. }
            | ConnectionAction::Failed { .. }
            | ConnectionAction::Closed { .. } => None,
        }
    }
}
