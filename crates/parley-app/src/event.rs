//! Session input events.
//!
//! Intents come from the view (see [`crate::Intent`]). Everything else that
//! drives the [`crate::Session`] arrives as a [`SessionEvent`]: auth
//! completions, transport notifications and clock ticks.

use std::time::Instant;

use parley_client::{AuthError, TransportEvent};
use parley_core::Credential;

/// Asynchronous completions processed by the Session state machine.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// Auth service answered the pending login/signup.
    AuthCompleted(Result<Credential, AuthError>),

    /// Transport reported on a connection.
    Transport(TransportEvent),

    /// Periodic tick.
    Tick {
        /// Current time.
        now: Instant,
    },
}

impl From<TransportEvent> for SessionEvent {
    fn from(event: TransportEvent) -> Self {
        Self::Transport(event)
    }
}
