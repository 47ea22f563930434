//! Standard invariant checks.
//!
//! These invariants capture behavioral properties of a session that must hold
//! after every step, whatever the inputs were.

use super::{Invariant, InvariantKind, InvariantResult, SessionSnapshot, Violation};

/// At most one connection is `Connecting` or `Open`.
pub struct SingleLiveConnection;

impl Invariant for SingleLiveConnection {
    fn kind(&self) -> InvariantKind {
        InvariantKind::SingleLiveConnection
    }

    fn check(&self, state: &SessionSnapshot) -> InvariantResult {
        if state.live_connections > 1 {
            return Err(Violation {
                invariant: self.kind(),
                message: format!("{} live connections", state.live_connections),
            });
        }
        Ok(())
    }
}

/// An active connection implies the identity its variant requires.
///
/// Room-scoped sessions need a credential, anonymous sessions a display name.
pub struct ConnectionRequiresIdentity;

impl Invariant for ConnectionRequiresIdentity {
    fn kind(&self) -> InvariantKind {
        InvariantKind::ConnectionRequiresIdentity
    }

    fn check(&self, state: &SessionSnapshot) -> InvariantResult {
        if let Some(active) = state.active
            && !state.has_identity()
        {
            return Err(Violation {
                invariant: self.kind(),
                message: format!("{active} active without identity ({:?})", state.variant),
            });
        }
        Ok(())
    }
}

/// The active connection is the manager's current one and is live.
///
/// Anything else means the session would apply events from a superseded or
/// closed connection.
pub struct ActiveIsCurrent;

impl Invariant for ActiveIsCurrent {
    fn kind(&self) -> InvariantKind {
        InvariantKind::ActiveIsCurrent
    }

    fn check(&self, state: &SessionSnapshot) -> InvariantResult {
        let Some(active) = state.active else {
            return Ok(());
        };

        if state.current != Some(active) {
            return Err(Violation {
                invariant: self.kind(),
                message: format!("active {active} but manager owns {:?}", state.current),
            });
        }

        if !state.active_state.is_some_and(|s| s.is_live()) {
            return Err(Violation {
                invariant: self.kind(),
                message: format!("active {active} in state {:?}", state.active_state),
            });
        }
        Ok(())
    }
}

/// Messages are logged in connection order.
///
/// Connections are issued in increasing id order and only the newest one
/// delivers, so the ids along the log never decrease.
pub struct LogFollowsConnections;

impl Invariant for LogFollowsConnections {
    fn kind(&self) -> InvariantKind {
        InvariantKind::LogFollowsConnections
    }

    fn check(&self, state: &SessionSnapshot) -> InvariantResult {
        for window in state.message_connections.windows(2) {
            if window[1] < window[0] {
                return Err(Violation {
                    invariant: self.kind(),
                    message: format!("message from {} logged after {}", window[1], window[0]),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use parley_core::{ConnectionId, ConnectionState, Variant};

    use super::*;

    fn snapshot() -> SessionSnapshot {
        SessionSnapshot {
            variant: Variant::RoomScoped,
            has_credential: true,
            has_display_name: false,
            active: None,
            active_state: None,
            current: None,
            live_connections: 0,
            message_connections: vec![],
            draft: String::new(),
        }
    }

    #[test]
    fn single_live_connection() {
        let mut state = snapshot();
        state.live_connections = 1;
        assert!(SingleLiveConnection.check(&state).is_ok());

        state.live_connections = 2;
        assert!(SingleLiveConnection.check(&state).is_err());
    }

    #[test]
    fn connection_requires_identity() {
        let mut state = snapshot();
        state.active = Some(ConnectionId::new(1));
        assert!(ConnectionRequiresIdentity.check(&state).is_ok());

        state.has_credential = false;
        assert!(ConnectionRequiresIdentity.check(&state).is_err());

        state.variant = Variant::Anonymous;
        state.has_display_name = true;
        assert!(ConnectionRequiresIdentity.check(&state).is_ok());
    }

    #[test]
    fn active_must_be_current_and_live() {
        let mut state = snapshot();
        state.active = Some(ConnectionId::new(2));
        state.current = Some(ConnectionId::new(2));
        state.active_state = Some(ConnectionState::Open);
        assert!(ActiveIsCurrent.check(&state).is_ok());

        state.current = Some(ConnectionId::new(3));
        assert!(ActiveIsCurrent.check(&state).is_err());

        state.current = Some(ConnectionId::new(2));
        state.active_state = Some(ConnectionState::Closed);
        assert!(ActiveIsCurrent.check(&state).is_err());
    }

    #[test]
    fn log_order_follows_connections() {
        let mut state = snapshot();
        state.message_connections =
            vec![ConnectionId::new(1), ConnectionId::new(1), ConnectionId::new(3)];
        assert!(LogFollowsConnections.check(&state).is_ok());

        state.message_connections.push(ConnectionId::new(2));
        assert!(LogFollowsConnections.check(&state).is_err());
    }
}
