//! Observable state snapshots for invariant checking.
//!
//! Snapshots capture the observable state of a session at a point in time.
//! Invariants operate on snapshots rather than live state so every check in
//! a pass sees the same view.

use parley_app::Session;
use parley_client::CredentialStore;
use parley_core::{ConnectionId, ConnectionState, Variant};

/// Snapshot of one session's observable state.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    /// Relay variant the session is configured for.
    pub variant: Variant,
    /// Session holds a credential.
    pub has_credential: bool,
    /// Session has a display name.
    pub has_display_name: bool,
    /// Connection whose events the session applies.
    pub active: Option<ConnectionId>,
    /// State of the active connection.
    pub active_state: Option<ConnectionState>,
    /// Connection the manager currently owns.
    pub current: Option<ConnectionId>,
    /// Connections in `Connecting` or `Open`.
    pub live_connections: usize,
    /// Connection id of each logged message, in log order.
    pub message_connections: Vec<ConnectionId>,
    /// Draft text.
    pub draft: String,
}

impl SessionSnapshot {
    /// Capture a session.
    pub fn from_session<S: CredentialStore>(session: &Session<S>) -> Self {
        Self {
            variant: session.config().variant(),
            has_credential: session.credential().is_some(),
            has_display_name: session.display_name().is_some(),
            active: session.active_connection(),
            active_state: session.connection_state(),
            current: session.connections().current().map(|c| c.id()),
            live_connections: session.connections().live_count(),
            message_connections: session.messages().iter().map(|m| m.connection).collect(),
            draft: session.draft().to_string(),
        }
    }

    /// True if the session has the identity its variant requires to join.
    pub fn has_identity(&self) -> bool {
        match self.variant {
            Variant::RoomScoped => self.has_credential,
            Variant::Anonymous => self.has_display_name,
        }
    }
}
