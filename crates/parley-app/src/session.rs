//! Session state machine.
//!
//! This module defines the [`Session`] state machine, which owns the user's
//! identity, the single relay connection and the message log, completely
//! decoupled from I/O.
//!
//! This is a pure state machine: intents are methods that return
//! [`crate::SessionAction`] instructions for the runtime to execute, and
//! completions come back through [`Session::handle`].
//!
//! # Responsibilities
//!
//! - Adopts credentials from the auth service and persists them.
//! - Checks join preconditions before any connection is requested.
//! - Keeps at most one live connection, ignoring events from superseded ones.
//! - Appends inbound frames to the message log in arrival order.
//! - Turns every failure into an observable [`SessionError`].

use std::time::Instant;

use parley_client::{
    AuthError, AuthFailure, AuthKind, AuthRequest, ConnectionAction, ConnectionManager,
    CredentialStore,
};
use parley_core::{ConnectionId, ConnectionState, Credential, RoomAddress, Variant};

use crate::{
    Intent, Message, PreconditionError, SessionAction, SessionConfig, SessionError, SessionEvent,
    Status,
};

/// Session state machine.
///
/// Generic over the credential store so the same logic runs against a file in
/// production and memory in simulation.
#[derive(Debug)]
pub struct Session<S: CredentialStore> {
    config: SessionConfig,
    store: S,
    connections: ConnectionManager,
    /// Signed-in identity. `None` when anonymous.
    credential: Option<Credential>,
    /// Name chosen for the anonymous relay.
    display_name: Option<String>,
    /// Room of the most recent join. `None` after leaving.
    room: Option<String>,
    /// Connection whose events are applied. `None` when disconnected.
    active: Option<ConnectionId>,
    /// Append-only message log.
    messages: Vec<Message>,
    draft: String,
    /// Most recent failure, shown until the next successful intent.
    error: Option<SessionError>,
    /// Auth request awaiting its completion.
    pending_auth: Option<AuthKind>,
}

impl<S: CredentialStore> Session<S> {
    /// Create a session, restoring any credential the store holds.
    pub fn new(config: SessionConfig, store: S) -> Self {
        let connections = ConnectionManager::new(config.endpoint.clone())
            .with_connect_timeout(config.connect_timeout);
        let credential = store.get();

        if let Some(credential) = &credential {
            tracing::info!(username = %credential.username, "restored credential");
        }

        Self {
            config,
            store,
            connections,
            credential,
            display_name: None,
            room: None,
            active: None,
            messages: Vec::new(),
            draft: String::new(),
            error: None,
            pending_auth: None,
        }
    }

    /// Process a completion and return actions.
    pub fn handle(&mut self, event: SessionEvent) -> Vec<SessionAction> {
        match event {
            SessionEvent::AuthCompleted(result) => self.complete_auth(result),
            SessionEvent::Transport(event) => {
                let actions = self.connections.handle(event);
                self.apply_connection_actions(actions)
            },
            SessionEvent::Tick { now } => {
                let actions = self.connections.tick(now);
                self.apply_connection_actions(actions)
            },
        }
    }

    /// Dispatch a user intent.
    pub fn apply(&mut self, intent: Intent, now: Instant) -> Vec<SessionAction> {
        match intent {
            Intent::Authenticate(request) => self.authenticate(request),
            Intent::ChooseDisplayName { name } => self.choose_display_name(name),
            Intent::JoinRoom { room } => self.join_room(&room, now),
            Intent::EditDraft(text) => self.set_draft(text),
            Intent::SendMessage { text } => self.send_message(&text),
            Intent::SubmitDraft => self.submit_draft(),
            Intent::LeaveRoom => self.leave_room(),
            Intent::Logout => self.logout(),
            Intent::Quit => self.quit(),
        }
    }

    /// Log in with a username and password.
    pub fn login(&mut self, username: &str, password: &str) -> Vec<SessionAction> {
        self.authenticate(AuthRequest::login(username, password))
    }

    /// Create an account and log in.
    pub fn signup(&mut self, username: &str, password: &str) -> Vec<SessionAction> {
        self.authenticate(AuthRequest::signup(username, password))
    }

    /// Request a credential from the auth service.
    ///
    /// Ignored while another request is in flight.
    pub fn authenticate(&mut self, mut request: AuthRequest) -> Vec<SessionAction> {
        if let Some(pending) = self.pending_auth {
            tracing::debug!(%pending, requested = %request.kind, "auth already in flight");
            return vec![];
        }

        request.username = request.username.trim().to_string();
        if request.username.is_empty() || request.password.is_empty() {
            self.error = Some(PreconditionError::MissingCredentials.into());
            return vec![SessionAction::Render];
        }

        tracing::debug!(kind = %request.kind, username = %request.username, "authenticating");
        self.pending_auth = Some(request.kind);
        self.error = None;
        vec![SessionAction::Authenticate(request), SessionAction::Render]
    }

    /// Choose the name used on the anonymous relay. Takes effect on the next
    /// join. Blank clears it, except while connected under it.
    pub fn choose_display_name(&mut self, name: impl Into<String>) -> Vec<SessionAction> {
        let name = name.into();
        let name = name.trim();
        if name.is_empty() && self.active.is_some() {
            return vec![];
        }
        self.display_name = (!name.is_empty()).then(|| name.to_string());
        vec![SessionAction::Render]
    }

    /// Join `room`, closing any current connection first.
    ///
    /// The room-scoped relay requires a credential and a room name; the
    /// anonymous relay requires a display name and ignores the room. On a
    /// failed precondition nothing is dialed and the error is surfaced.
    pub fn join_room(&mut self, room: &str, now: Instant) -> Vec<SessionAction> {
        let room = room.trim();
        let (address, credential) = match self.join_target(room) {
            Ok(target) => target,
            Err(e) => {
                tracing::debug!(error = %e, "join rejected");
                self.error = Some(e.into());
                return vec![SessionAction::Render];
            },
        };

        tracing::info!(%address, "joining room");
        self.error = None;

        let (id, actions) = self.connections.open(address, credential.as_ref(), now);
        let mut out = self.apply_connection_actions(actions);

        self.active = Some(id);
        self.room = (!room.is_empty()).then(|| room.to_string());

        out.push(SessionAction::Render);
        out
    }

    fn join_target(
        &self,
        room: &str,
    ) -> Result<(RoomAddress, Option<Credential>), PreconditionError> {
        match self.config.variant() {
            Variant::RoomScoped => {
                let credential =
                    self.credential.as_ref().ok_or(PreconditionError::NotAuthenticated)?;
                if room.is_empty() {
                    return Err(PreconditionError::EmptyRoom);
                }
                Ok((RoomAddress::new(room, &credential.username), Some(credential.clone())))
            },
            Variant::Anonymous => {
                let name = self.display_name.as_ref().ok_or(PreconditionError::MissingDisplayName)?;
                Ok((RoomAddress::new(room, name), None))
            },
        }
    }

    /// Leave the current room. The message log is kept.
    pub fn leave_room(&mut self) -> Vec<SessionAction> {
        let mut out = match self.active {
            Some(id) => {
                let actions = self.connections.close(id);
                self.apply_connection_actions(actions)
            },
            None => vec![],
        };

        self.active = None;
        self.room = None;
        out.push(SessionAction::Render);
        out
    }

    /// Replace the draft.
    pub fn set_draft(&mut self, text: impl Into<String>) -> Vec<SessionAction> {
        self.draft = text.into();
        vec![SessionAction::Render]
    }

    /// Send `text` on the current connection.
    ///
    /// Clears the draft on success. Without an open connection the error is
    /// surfaced and neither the draft nor the message log changes.
    /// Whitespace-only text does nothing.
    pub fn send_message(&mut self, text: &str) -> Vec<SessionAction> {
        let Some(id) = self.active else {
            self.error = Some(SessionError::NotConnected);
            return vec![SessionAction::Render];
        };

        let actions = match self.connections.send(id, text) {
            Ok(actions) => actions,
            Err(e) => {
                tracing::debug!(%id, error = %e, "send rejected");
                self.error = Some(e.into());
                return vec![SessionAction::Render];
            },
        };

        if actions.is_empty() {
            return vec![];
        }

        self.draft.clear();
        self.error = None;
        let mut out = self.apply_connection_actions(actions);
        out.push(SessionAction::Render);
        out
    }

    /// Send the current draft.
    pub fn submit_draft(&mut self) -> Vec<SessionAction> {
        let text = self.draft.clone();
        self.send_message(&text)
    }

    /// Sign out.
    ///
    /// Closes any connection, clears the store and resets the session to its
    /// initial anonymous shape, discarding the message log. A store failure is
    /// surfaced after the reset.
    pub fn logout(&mut self) -> Vec<SessionAction> {
        let mut out = match self.active {
            Some(id) => {
                let actions = self.connections.close(id);
                self.apply_connection_actions(actions)
            },
            None => vec![],
        };

        tracing::info!("logging out");

        self.credential = None;
        self.display_name = None;
        self.room = None;
        self.active = None;
        self.messages.clear();
        self.draft.clear();
        self.error = None;
        self.pending_auth = None;

        if let Err(e) = self.store.clear() {
            tracing::warn!(error = %e, "failed to clear stored credential");
            self.error = Some(e.into());
        }

        out.push(SessionAction::Render);
        out
    }

    /// Close the connection and quit.
    pub fn quit(&mut self) -> Vec<SessionAction> {
        let mut out = match self.active.take() {
            Some(id) => {
                let actions = self.connections.close(id);
                self.apply_connection_actions(actions)
            },
            None => vec![],
        };
        out.push(SessionAction::Quit);
        out
    }

    /// Dismiss the current error.
    pub fn clear_error(&mut self) -> Vec<SessionAction> {
        self.error = None;
        vec![SessionAction::Render]
    }

    fn complete_auth(&mut self, result: Result<Credential, AuthError>) -> Vec<SessionAction> {
        let Some(kind) = self.pending_auth.take() else {
            tracing::debug!("ignoring auth completion with no request in flight");
            return vec![];
        };

        let result = result.and_then(|credential| {
            if credential.is_blank() {
                return Err(AuthError::with_detail(AuthFailure::ServerError, "blank credential"));
            }
            Ok(credential)
        });

        match result {
            Ok(credential) => {
                tracing::info!(%kind, username = %credential.username, "signed in");
                self.credential = Some(credential.clone());
                self.error = None;

                if let Err(e) = self.store.set(credential) {
                    tracing::warn!(error = %e, "credential kept in memory only");
                    self.error = Some(e.into());
                }
            },
            Err(e) => {
                tracing::info!(%kind, error = %e, "authentication failed");
                self.error = Some(e.into());
            },
        }

        vec![SessionAction::Render]
    }

    /// Apply manager output: forward transport commands, fold notifications
    /// for the active connection into state.
    fn apply_connection_actions(&mut self, actions: Vec<ConnectionAction>) -> Vec<SessionAction> {
        let mut out = Vec::new();
        let mut changed = false;

        for action in actions {
            if let Some(command) = SessionAction::from_transport(&action) {
                out.push(command);
                continue;
            }

            if self.active != Some(action.id()) {
                tracing::debug!(id = %action.id(), "ignoring notification for inactive connection");
                continue;
            }

            changed = true;
            match action {
                ConnectionAction::Opened { id } => {
                    tracing::info!(%id, room = ?self.room, "connected");
                    self.error = None;
                },
                ConnectionAction::Deliver { id, text } => {
                    self.messages.push(Message { connection: id, text });
                },
                ConnectionAction::Failed { detail, .. } => {
                    self.error = Some(SessionError::Transport { detail });
                },
                ConnectionAction::Closed { id, reason } => {
                    tracing::info!(%id, ?reason, "disconnected");
                    self.active = None;
                    if let Some(reason) = reason.filter(|r| !r.is_clean()) {
                        self.error = Some(SessionError::Dropped { reason });
                    }
                },
                ConnectionAction::Dial { .. }
                | ConnectionAction::Transmit { .. }
                | ConnectionAction::HangUp { .. } => {},
            }
        }

        if changed {
            out.push(SessionAction::Render);
        }
        out
    }

    /// Session configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Credential store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Connection manager.
    pub fn connections(&self) -> &ConnectionManager {
        &self.connections
    }

    /// Signed-in identity. `None` when anonymous.
    pub fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    /// Display name for the anonymous relay.
    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    /// Name the user joins under for the configured variant.
    pub fn identity(&self) -> Option<&str> {
        match self.config.variant() {
            Variant::RoomScoped => self.credential.as_ref().map(|c| c.username.as_str()),
            Variant::Anonymous => self.display_name.as_deref(),
        }
    }

    /// Room of the current or most recent join. `None` after leaving.
    pub fn room(&self) -> Option<&str> {
        self.room.as_deref()
    }

    /// Connection whose events are applied. `None` when disconnected.
    pub fn active_connection(&self) -> Option<ConnectionId> {
        self.active
    }

    /// State of the active connection. `None` when disconnected.
    pub fn connection_state(&self) -> Option<ConnectionState> {
        self.active.and_then(|id| self.connections.state(id))
    }

    /// True while the active connection is `Open`.
    pub fn is_connected(&self) -> bool {
        self.connection_state() == Some(ConnectionState::Open)
    }

    /// Message log in arrival order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Current draft.
    pub fn draft(&self) -> &str {
        &self.draft
    }

    /// Most recent failure. `None` if the last intent succeeded.
    pub fn error(&self) -> Option<&SessionError> {
        self.error.as_ref()
    }

    /// Auth request in flight, if any.
    pub fn pending_auth(&self) -> Option<AuthKind> {
        self.pending_auth
    }

    /// Coarse status for the view.
    pub fn status(&self) -> Status {
        if self.pending_auth.is_some() {
            return Status::Authenticating;
        }
        match self.connection_state() {
            Some(ConnectionState::Open) => Status::Connected,
            Some(ConnectionState::Connecting | ConnectionState::Idle) => Status::Connecting,
            Some(ConnectionState::Closed) | None if self.identity().is_some() => Status::Ready,
            Some(ConnectionState::Closed) | None => Status::SignedOut,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use parley_client::{
        AuthFailure, CloseReason, MemoryCredentialStore, PersistenceError, TransportEvent,
    };
    use parley_core::Endpoint;

    use super::*;

    fn config(variant: Variant) -> SessionConfig {
        SessionConfig::new(Endpoint::parse("wss://host", variant).unwrap())
    }

    fn alice() -> Credential {
        Credential::new("T1", "alice")
    }

    fn signed_in() -> Session<MemoryCredentialStore> {
        Session::new(
            config(Variant::RoomScoped),
            MemoryCredentialStore::with_credential(alice()),
        )
    }

    fn dialed(actions: &[SessionAction]) -> Option<(ConnectionId, String)> {
        actions.iter().find_map(|a| match a {
            SessionAction::Dial { id, url } => Some((*id, url.clone())),
            _ => None,
        })
    }

    fn joined(session: &mut Session<MemoryCredentialStore>, room: &str) -> ConnectionId {
        let actions = session.join_room(room, Instant::now());
        let (id, _) = dialed(&actions).unwrap();
        let _ = session.handle(TransportEvent::opened(id).into());
        id
    }

    #[test]
    fn restores_credential_from_store() {
        let session = signed_in();
        assert_eq!(session.credential(), Some(&alice()));
        assert_eq!(session.status(), Status::Ready);
    }

    #[test]
    fn login_success_persists_credential() {
        let mut session =
            Session::new(config(Variant::RoomScoped), MemoryCredentialStore::new());

        let actions = session.login("alice", "pw");
        assert!(matches!(actions.as_slice(), [
            SessionAction::Authenticate(AuthRequest { kind: AuthKind::Login, .. }),
            SessionAction::Render
        ]));
        assert_eq!(session.status(), Status::Authenticating);

        let _ = session.handle(SessionEvent::AuthCompleted(Ok(alice())));

        assert_eq!(session.credential(), Some(&alice()));
        assert_eq!(session.store().get(), Some(alice()));
        assert_eq!(session.pending_auth(), None);
        assert_eq!(session.error(), None);
    }

    #[test]
    fn login_failure_leaves_state_unchanged() {
        let mut session =
            Session::new(config(Variant::RoomScoped), MemoryCredentialStore::new());

        let _ = session.login("alice", "wrong");
        let failure = AuthError::new(AuthFailure::InvalidCredentials);
        let _ = session.handle(SessionEvent::AuthCompleted(Err(failure.clone())));

        assert_eq!(session.credential(), None);
        assert_eq!(session.store().get(), None);
        assert_eq!(session.error(), Some(&SessionError::Auth(failure)));
    }

    #[test]
    fn blank_credential_from_auth_is_a_server_error() {
        let mut session =
            Session::new(config(Variant::RoomScoped), MemoryCredentialStore::new());

        let _ = session.login("alice", "pw");
        let _ = session.handle(SessionEvent::AuthCompleted(Ok(Credential::new("", "alice"))));

        assert_eq!(session.credential(), None);
        assert_eq!(session.store().get(), None);
        assert!(matches!(
            session.error(),
            Some(SessionError::Auth(AuthError { reason: AuthFailure::ServerError, .. }))
        ));
    }

    #[test]
    fn empty_password_is_rejected_without_request() {
        let mut session =
            Session::new(config(Variant::RoomScoped), MemoryCredentialStore::new());

        let actions = session.signup("alice", "");

        assert_eq!(actions, vec![SessionAction::Render]);
        assert_eq!(session.pending_auth(), None);
        assert_eq!(
            session.error(),
            Some(&SessionError::Precondition(PreconditionError::MissingCredentials))
        );
    }

    #[test]
    fn username_is_trimmed_before_request() {
        let mut session =
            Session::new(config(Variant::RoomScoped), MemoryCredentialStore::new());

        let actions = session.login("  alice ", " pw ");

        assert_eq!(
            actions,
            vec![
                SessionAction::Authenticate(AuthRequest::login("alice", " pw ")),
                SessionAction::Render,
            ]
        );
    }

    #[test]
    fn second_auth_request_ignored_while_pending() {
        let mut session =
            Session::new(config(Variant::RoomScoped), MemoryCredentialStore::new());

        let _ = session.login("alice", "pw");
        assert!(session.signup("bob", "pw").is_empty());
        assert_eq!(session.pending_auth(), Some(AuthKind::Login));
    }

    #[test]
    fn unsolicited_auth_completion_is_ignored() {
        let mut session =
            Session::new(config(Variant::RoomScoped), MemoryCredentialStore::new());

        assert!(session.handle(SessionEvent::AuthCompleted(Ok(alice()))).is_empty());
        assert_eq!(session.credential(), None);
    }

    #[test]
    fn persistence_failure_keeps_credential_in_memory() {
        let mut session =
            Session::new(config(Variant::RoomScoped), MemoryCredentialStore::unavailable());

        let _ = session.login("alice", "pw");
        let _ = session.handle(SessionEvent::AuthCompleted(Ok(alice())));

        assert_eq!(session.credential(), Some(&alice()));
        assert!(matches!(
            session.error(),
            Some(SessionError::Persistence(PersistenceError::Unavailable(_)))
        ));
    }

    #[test]
    fn join_without_credential_is_precondition_error() {
        let mut session =
            Session::new(config(Variant::RoomScoped), MemoryCredentialStore::new());

        let actions = session.join_room("lobby", Instant::now());

        assert_eq!(actions, vec![SessionAction::Render]);
        assert_eq!(session.active_connection(), None);
        assert_eq!(
            session.error(),
            Some(&SessionError::Precondition(PreconditionError::NotAuthenticated))
        );
    }

    #[test]
    fn join_with_blank_room_is_precondition_error() {
        let mut session = signed_in();

        let actions = session.join_room("   ", Instant::now());

        assert!(dialed(&actions).is_none());
        assert_eq!(
            session.error(),
            Some(&SessionError::Precondition(PreconditionError::EmptyRoom))
        );
    }

    #[test]
    fn join_dials_room_scoped_url() {
        let mut session = signed_in();

        let actions = session.join_room("lobby", Instant::now());
        let (id, url) = dialed(&actions).unwrap();

        assert_eq!(url, "wss://host/ws/lobby/alice?token=T1");
        assert_eq!(session.active_connection(), Some(id));
        assert_eq!(session.status(), Status::Connecting);
        assert_eq!(session.room(), Some("lobby"));
    }

    #[test]
    fn anonymous_join_needs_display_name() {
        let mut session = Session::new(config(Variant::Anonymous), MemoryCredentialStore::new());

        let _ = session.join_room("", Instant::now());
        assert_eq!(
            session.error(),
            Some(&SessionError::Precondition(PreconditionError::MissingDisplayName))
        );

        let _ = session.choose_display_name("  bob ");
        let actions = session.join_room("", Instant::now());
        let (_, url) = dialed(&actions).unwrap();

        assert_eq!(url, "wss://host/ws/bob");
        assert_eq!(session.error(), None);
    }

    #[test]
    fn display_name_cannot_be_cleared_while_connected() {
        let mut session = Session::new(config(Variant::Anonymous), MemoryCredentialStore::new());
        let _ = session.choose_display_name("bob");
        let _ = session.join_room("", Instant::now());

        assert!(session.choose_display_name(" ").is_empty());
        assert_eq!(session.display_name(), Some("bob"));

        let _ = session.choose_display_name("robert");
        assert_eq!(session.display_name(), Some("robert"));
    }

    #[test]
    fn inbound_frames_append_to_log() {
        let mut session = signed_in();
        let id = joined(&mut session, "lobby");

        let _ = session.handle(TransportEvent::frame(id, "hi").into());
        let _ = session.handle(TransportEvent::frame(id, "there").into());

        let texts: Vec<_> = session.messages().iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, ["hi", "there"]);
        assert!(session.messages().iter().all(|m| m.connection == id));
    }

    #[test]
    fn send_while_open_transmits_and_clears_draft() {
        let mut session = signed_in();
        let id = joined(&mut session, "lobby");
        let _ = session.set_draft("hello");

        let actions = session.submit_draft();

        assert_eq!(actions, vec![
            SessionAction::Transmit { id, text: "hello".to_string() },
            SessionAction::Render
        ]);
        assert_eq!(session.draft(), "");
    }

    #[test]
    fn send_while_connecting_keeps_draft() {
        let mut session = signed_in();
        let _ = session.join_room("lobby", Instant::now());
        let _ = session.set_draft("hello");

        let actions = session.submit_draft();

        assert_eq!(actions, vec![SessionAction::Render]);
        assert_eq!(session.draft(), "hello");
        assert_eq!(session.error(), Some(&SessionError::NotConnected));
        assert!(session.messages().is_empty());
    }

    #[test]
    fn open_clears_stale_error() {
        let mut session = signed_in();
        let actions = session.join_room("lobby", Instant::now());
        let (id, _) = dialed(&actions).unwrap();

        let _ = session.send_message("too early");
        assert_eq!(session.error(), Some(&SessionError::NotConnected));

        let _ = session.handle(TransportEvent::opened(id).into());
        assert_eq!(session.error(), None);
        assert_eq!(session.status(), Status::Connected);
    }

    #[test]
    fn successful_send_clears_error() {
        let mut session = signed_in();
        let id = joined(&mut session, "lobby");
        let _ = session.join_room("   ", Instant::now());
        assert!(session.error().is_some());

        let actions = session.send_message("hello");

        assert!(actions.contains(&SessionAction::Transmit { id, text: "hello".to_string() }));
        assert_eq!(session.error(), None);
    }

    #[test]
    fn send_without_connection_is_not_connected() {
        let mut session = signed_in();
        let _ = session.send_message("hello");
        assert_eq!(session.error(), Some(&SessionError::NotConnected));
    }

    #[test]
    fn whitespace_draft_is_noop() {
        let mut session = signed_in();
        let _ = joined(&mut session, "lobby");
        let _ = session.set_draft("   ");

        assert!(session.submit_draft().is_empty());
        assert_eq!(session.draft(), "   ");
    }

    #[test]
    fn rejoin_supersedes_previous_connection() {
        let mut session = signed_in();
        let first = joined(&mut session, "lobby");

        let actions = session.join_room("random", Instant::now());
        let (second, _) = dialed(&actions).unwrap();

        assert!(actions.contains(&SessionAction::HangUp { id: first }));
        assert_eq!(session.active_connection(), Some(second));
        assert_eq!(session.connections().live_count(), 1);

        // Late events from the first connection are not applied
        let _ = session.handle(TransportEvent::frame(first, "stale").into());
        let _ = session.handle(TransportEvent::closed(first, None).into());
        assert!(session.messages().is_empty());
        assert_eq!(session.active_connection(), Some(second));
    }

    #[test]
    fn rejoin_keeps_message_log() {
        let mut session = signed_in();
        let first = joined(&mut session, "lobby");
        let _ = session.handle(TransportEvent::frame(first, "hi").into());

        let _ = joined(&mut session, "random");

        assert_eq!(session.messages().len(), 1);
    }

    #[test]
    fn remote_close_clears_connection_keeps_log() {
        let mut session = signed_in();
        let id = joined(&mut session, "lobby");
        let _ = session.handle(TransportEvent::frame(id, "hi").into());

        let _ = session.handle(TransportEvent::closed(id, None).into());

        assert_eq!(session.active_connection(), None);
        assert!(!session.is_connected());
        assert_eq!(session.messages().len(), 1);
        assert_eq!(session.error(), None);
    }

    #[test]
    fn policy_close_is_surfaced() {
        let mut session = signed_in();
        let id = joined(&mut session, "lobby");
        let reason = CloseReason::new(1008, "invalid token");

        let _ = session.handle(TransportEvent::closed(id, Some(reason.clone())).into());

        assert_eq!(session.error(), Some(&SessionError::Dropped { reason }));
    }

    #[test]
    fn transport_failure_is_surfaced() {
        let mut session = signed_in();
        let id = joined(&mut session, "lobby");

        let _ = session.handle(TransportEvent::failed(id, "reset").into());

        assert_eq!(session.active_connection(), None);
        assert_eq!(
            session.error(),
            Some(&SessionError::Transport { detail: "reset".to_string() })
        );
    }

    #[test]
    fn leave_room_keeps_log_and_identity() {
        let mut session = signed_in();
        let id = joined(&mut session, "lobby");
        let _ = session.handle(TransportEvent::frame(id, "hi").into());

        let actions = session.leave_room();

        assert!(actions.contains(&SessionAction::HangUp { id }));
        assert_eq!(session.active_connection(), None);
        assert_eq!(session.room(), None);
        assert_eq!(session.messages().len(), 1);
        assert_eq!(session.status(), Status::Ready);
    }

    #[test]
    fn logout_resets_everything() {
        let mut session = signed_in();
        let id = joined(&mut session, "lobby");
        let _ = session.handle(TransportEvent::frame(id, "hi").into());
        let _ = session.set_draft("unsent");

        let actions = session.logout();

        assert!(actions.contains(&SessionAction::HangUp { id }));
        assert_eq!(session.connections().state(id), Some(ConnectionState::Closed));
        assert_eq!(session.store().get(), None);
        assert_eq!(session.credential(), None);
        assert!(session.messages().is_empty());
        assert_eq!(session.draft(), "");
        assert_eq!(session.status(), Status::SignedOut);
    }

    #[test]
    fn logout_during_connect_ignores_late_open() {
        let mut session = signed_in();
        let actions = session.join_room("lobby", Instant::now());
        let (id, _) = dialed(&actions).unwrap();

        let _ = session.logout();
        let _ = session.handle(TransportEvent::opened(id).into());
        let _ = session.handle(TransportEvent::frame(id, "late").into());

        assert_eq!(session.active_connection(), None);
        assert!(session.messages().is_empty());
    }

    #[test]
    fn logout_with_unavailable_store_surfaces_error() {
        let mut session = Session::new(
            config(Variant::RoomScoped),
            MemoryCredentialStore::unavailable(),
        );

        let _ = session.logout();

        assert!(matches!(session.error(), Some(SessionError::Persistence(_))));
        assert_eq!(session.credential(), None);
    }

    #[test]
    fn auth_completion_after_logout_is_ignored() {
        let mut session =
            Session::new(config(Variant::RoomScoped), MemoryCredentialStore::new());
        let _ = session.login("alice", "pw");
        let _ = session.logout();

        let _ = session.handle(SessionEvent::AuthCompleted(Ok(alice())));

        assert_eq!(session.credential(), None);
    }

    #[test]
    fn connect_timeout_surfaces_failure() {
        let config = config(Variant::RoomScoped).with_connect_timeout(Some(Duration::from_secs(5)));
        let mut session = Session::new(config, MemoryCredentialStore::with_credential(alice()));
        let start = Instant::now();
        let actions = session.join_room("lobby", start);
        let (id, _) = dialed(&actions).unwrap();

        let actions = session.handle(SessionEvent::Tick { now: start + Duration::from_secs(6) });

        assert!(actions.contains(&SessionAction::HangUp { id }));
        assert_eq!(session.active_connection(), None);
        assert!(matches!(session.error(), Some(SessionError::Transport { .. })));
    }

    #[test]
    fn quit_hangs_up_first() {
        let mut session = signed_in();
        let id = joined(&mut session, "lobby");

        let actions = session.apply(Intent::Quit, Instant::now());

        assert_eq!(actions.first(), Some(&SessionAction::HangUp { id }));
        assert_eq!(actions.last(), Some(&SessionAction::Quit));
    }

    #[test]
    fn intents_dispatch() {
        let mut session = signed_in();
        let now = Instant::now();

        let _ = session.apply(Intent::JoinRoom { room: "lobby".to_string() }, now);
        let id = session.active_connection().unwrap();
        let _ = session.handle(TransportEvent::opened(id).into());

        let _ = session.apply(Intent::EditDraft("hey".to_string()), now);
        let actions = session.apply(Intent::SubmitDraft, now);

        assert!(actions.contains(&SessionAction::Transmit { id, text: "hey".to_string() }));
    }
}
