//! Connection manager.
//!
//! Owns at most one [`Connection`] at a time and translates its lifecycle into
//! [`ConnectionAction`]s. Pure: no sockets, no clocks. Time is passed in where
//! the optional connect timeout needs it.
//!
//! # Responsibilities
//!
//! - Composes endpoint URLs and issues fresh [`ConnectionId`]s.
//! - Closes the previous connection before opening a new one.
//! - Drops transport events for any connection other than the current one.
//! - Guarantees `Failed` is always followed by `Closed`, and that nothing is
//!   reported for a connection after its `Closed`.

use std::time::{Duration, Instant};

use parley_core::{
    Connection, ConnectionError, ConnectionId, ConnectionState, Credential, Endpoint, RoomAddress,
};

use crate::event::{ConnectionAction, TransportEvent, TransportEventKind};

/// Sans-IO owner of the single relay connection.
#[derive(Debug, Clone)]
pub struct ConnectionManager {
    endpoint: Endpoint,
    /// Most recently opened connection, kept after close for inspection.
    current: Option<Connection>,
    /// Next id to issue.
    next_id: u64,
    /// Give up on `Connecting` after this long. `None` waits forever.
    connect_timeout: Option<Duration>,
}

impl ConnectionManager {
    /// Create a manager for the given relay endpoint.
    pub fn new(endpoint: Endpoint) -> Self {
        Self { endpoint, current: None, next_id: 1, connect_timeout: None }
    }

    /// Abandon connections that stay `Connecting` longer than `timeout`.
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Relay endpoint.
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Most recently opened connection, if any.
    pub fn current(&self) -> Option<&Connection> {
        self.current.as_ref()
    }

    /// State of connection `id`.
    ///
    /// Superseded connections are always `Closed`. `None` for ids this
    /// manager never issued.
    pub fn state(&self, id: ConnectionId) -> Option<ConnectionState> {
        match &self.current {
            Some(conn) if conn.id() == id => Some(conn.state()),
            _ if id.get() >= 1 && id.get() < self.next_id => Some(ConnectionState::Closed),
            _ => None,
        }
    }

    /// Number of connections in `Connecting` or `Open`. Never more than one.
    pub fn live_count(&self) -> usize {
        usize::from(self.current.as_ref().is_some_and(Connection::is_live))
    }

    /// Open a fresh connection to `address`.
    ///
    /// Any live connection is closed first. The new connection is moved to
    /// `Connecting` and the caller learns of success or failure through
    /// [`Self::handle`], not through the return value.
    pub fn open(
        &mut self,
        address: RoomAddress,
        credential: Option<&Credential>,
        now: Instant,
    ) -> (ConnectionId, Vec<ConnectionAction>) {
        let mut actions = Vec::new();
        if let Some(previous) = self.current.as_ref().map(Connection::id) {
            actions.extend(self.close(previous));
        }

        let id = ConnectionId::new(self.next_id);
        self.next_id += 1;

        let url = self.endpoint.url_for(&address, credential);
        let mut conn = Connection::new(id, address, url.clone(), now);
        // Fresh connections are always Idle
        let begun = conn.begin(now);
        debug_assert!(begun.is_ok());

        tracing::debug!(%id, address = %conn.address(), "dialing relay");
        self.current = Some(conn);

        actions.push(ConnectionAction::Dial { id, url });
        (id, actions)
    }

    /// Send `text` as one frame on connection `id`.
    ///
    /// Whitespace-only text is never transmitted and yields no actions.
    ///
    /// # Errors
    ///
    /// - `ConnectionError::NotConnected` if `id` is not the current connection
    ///   or it is not `Open`
    pub fn send(
        &mut self,
        id: ConnectionId,
        text: &str,
    ) -> Result<Vec<ConnectionAction>, ConnectionError> {
        match &self.current {
            Some(conn) if conn.id() == id && conn.state() == ConnectionState::Open => {},
            _ => return Err(ConnectionError::NotConnected),
        }

        if text.trim().is_empty() {
            return Ok(vec![]);
        }

        Ok(vec![ConnectionAction::Transmit { id, text: text.to_string() }])
    }

    /// Close connection `id`.
    ///
    /// Returns `HangUp` and `Closed` if the connection was live. Idempotent:
    /// closing an already closed or unknown connection yields no actions.
    pub fn close(&mut self, id: ConnectionId) -> Vec<ConnectionAction> {
        let closed = self.current.as_mut().is_some_and(|conn| conn.id() == id && conn.close());
        if !closed {
            return vec![];
        }

        tracing::debug!(%id, "closing connection");
        vec![ConnectionAction::HangUp { id }, ConnectionAction::Closed { id, reason: None }]
    }

    /// Process an event reported by the transport.
    pub fn handle(&mut self, event: TransportEvent) -> Vec<ConnectionAction> {
        let TransportEvent { id, kind } = event;

        let Some(conn) = self.current.as_mut().filter(|conn| conn.id() == id) else {
            tracing::debug!(%id, "dropping event for superseded connection");
            return vec![];
        };

        match kind {
            TransportEventKind::Opened => match conn.acknowledge() {
                Ok(()) => {
                    tracing::debug!(%id, "connection open");
                    vec![ConnectionAction::Opened { id }]
                },
                Err(e) => {
                    tracing::debug!(%id, error = %e, "ignoring late open");
                    vec![]
                },
            },
            TransportEventKind::Frame(text) => {
                if conn.state() == ConnectionState::Open {
                    vec![ConnectionAction::Deliver { id, text }]
                } else {
                    tracing::warn!(%id, state = ?conn.state(), "dropping frame outside open state");
                    vec![]
                }
            },
            TransportEventKind::Closed(reason) => {
                if conn.close() {
                    tracing::debug!(%id, ?reason, "connection closed by peer");
                    vec![ConnectionAction::Closed { id, reason }]
                } else {
                    vec![]
                }
            },
            TransportEventKind::Failed(detail) => {
                if conn.close() {
                    tracing::warn!(%id, %detail, "connection failed");
                    vec![ConnectionAction::Failed { id, detail }, ConnectionAction::Closed {
                        id,
                        reason: None,
                    }]
                } else {
                    vec![]
                }
            },
        }
    }

    /// Process periodic maintenance (connect timeout).
    pub fn tick(&mut self, now: Instant) -> Vec<ConnectionAction> {
        let Some(timeout) = self.connect_timeout else {
            return vec![];
        };
        let Some(conn) = self.current.as_mut() else {
            return vec![];
        };
        let Some(elapsed) = conn.check_timeout(now, timeout) else {
            return vec![];
        };

        let id = conn.id();
        conn.close();
        tracing::warn!(%id, ?elapsed, "connect timed out");

        vec![
            ConnectionAction::HangUp { id },
            ConnectionAction::Failed { id, detail: format!("connect timed out after {elapsed:?}") },
            ConnectionAction::Closed { id, reason: None },
        ]
    }
}
