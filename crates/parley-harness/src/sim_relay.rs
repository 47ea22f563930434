//! In-memory chat relay.
//!
//! Stands in for the WebSocket relay. Clients attach to get an inbox of
//! [`TransportEvent`]s; connecting validates the token against the auth
//! service, then the relay announces the join to the room and fans out every
//! frame as `"<username>: <text>"`. Anonymous relays put everyone in one room.
//!
//! Everything happens synchronously: events land in the inboxes before the
//! call returns, which keeps simulations deterministic.

use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use parley_client::{CLOSE_POLICY_VIOLATION, CloseReason, TransportEvent};
use parley_core::{ConnectionId, Variant};
use percent_encoding::percent_decode_str;
use url::Url;

use crate::SimAuthService;

/// Identity of an attached client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientKey(u64);

/// Errors from relay operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimRelayError {
    /// Client never attached
    UnknownClient(ClientKey),
    /// Connection is not joined to any room
    NotJoined(ConnectionId),
}

impl std::fmt::Display for SimRelayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownClient(key) => write!(f, "unknown client {}", key.0),
            Self::NotJoined(id) => write!(f, "{id} is not joined"),
        }
    }
}

impl std::error::Error for SimRelayError {}

#[derive(Debug, Clone)]
struct Member {
    client: ClientKey,
    id: ConnectionId,
    room: String,
    username: String,
}

#[derive(Default)]
struct RelayState {
    next_client: u64,
    inboxes: HashMap<ClientKey, VecDeque<TransportEvent>>,
    members: Vec<Member>,
    /// Connects waiting for [`SimRelay::accept_pending`].
    held: Vec<(ClientKey, ConnectionId, String)>,
    hold_connects: bool,
}

impl RelayState {
    fn push(&mut self, client: ClientKey, event: TransportEvent) {
        if let Some(inbox) = self.inboxes.get_mut(&client) {
            inbox.push_back(event);
        }
    }

    fn broadcast(&mut self, room: &str, text: &str) {
        let targets: Vec<_> = self
            .members
            .iter()
            .filter(|m| m.room == room)
            .map(|m| (m.client, m.id))
            .collect();

        for (client, id) in targets {
            self.push(client, TransportEvent::frame(id, text));
        }
    }

    fn remove(&mut self, client: ClientKey, id: ConnectionId) -> Option<Member> {
        let index = self.members.iter().position(|m| m.client == client && m.id == id)?;
        Some(self.members.remove(index))
    }
}

/// Shared in-memory relay.
#[derive(Clone)]
pub struct SimRelay {
    state: Arc<Mutex<RelayState>>,
    variant: Variant,
    /// Validates tokens for room-scoped joins.
    auth: Option<SimAuthService>,
}

impl SimRelay {
    /// Room-scoped relay accepting tokens issued by `auth`.
    pub fn room_scoped(auth: SimAuthService) -> Self {
        Self { state: Arc::default(), variant: Variant::RoomScoped, auth: Some(auth) }
    }

    /// Anonymous relay with a single global room.
    pub fn anonymous() -> Self {
        Self { state: Arc::default(), variant: Variant::Anonymous, auth: None }
    }

    /// Relay variant.
    pub fn variant(&self) -> Variant {
        self.variant
    }

    /// Attach a client and give it an inbox.
    pub fn attach(&self) -> ClientKey {
        let mut state = self.lock();
        state.next_client += 1;
        let key = ClientKey(state.next_client);
        state.inboxes.insert(key, VecDeque::new());
        key
    }

    /// Take every queued event for `client`, oldest first.
    pub fn drain(&self, client: ClientKey) -> Vec<TransportEvent> {
        self.lock()
            .inboxes
            .get_mut(&client)
            .map(|inbox| inbox.drain(..).collect())
            .unwrap_or_default()
    }

    /// Queue an arbitrary event for `client`.
    pub fn inject(&self, client: ClientKey, event: TransportEvent) {
        self.lock().push(client, event);
    }

    /// Hold new connects in `Connecting` until [`Self::accept_pending`].
    pub fn hold_connects(&self, hold: bool) {
        self.lock().hold_connects = hold;
    }

    /// Complete every held connect, in the order they were requested.
    pub fn accept_pending(&self) {
        let held = std::mem::take(&mut self.lock().held);
        for (client, id, url) in held {
            self.admit(client, id, &url);
        }
    }

    /// Handle a dial from `client`.
    ///
    /// # Errors
    ///
    /// - `SimRelayError::UnknownClient` if `client` never attached
    pub fn connect(
        &self,
        client: ClientKey,
        id: ConnectionId,
        url: &str,
    ) -> Result<(), SimRelayError> {
        let mut state = self.lock();
        if !state.inboxes.contains_key(&client) {
            return Err(SimRelayError::UnknownClient(client));
        }

        if state.hold_connects {
            state.held.push((client, id, url.to_string()));
            return Ok(());
        }
        drop(state);

        self.admit(client, id, url);
        Ok(())
    }

    fn admit(&self, client: ClientKey, id: ConnectionId, url: &str) {
        let target = self.parse_target(url);
        let mut state = self.lock();

        let Some((room, username, token)) = target else {
            state.push(client, TransportEvent::failed(id, format!("bad relay path: {url}")));
            return;
        };

        // A rejected token never completes the handshake
        if let Some(auth) = &self.auth {
            let owner = token.as_deref().and_then(|t| auth.token_owner(t));
            if owner.as_deref() != Some(username.as_str()) {
                tracing::debug!(%id, %username, "sim relay rejected token");
                let reason = CloseReason::new(CLOSE_POLICY_VIOLATION, "invalid token");
                state.push(client, TransportEvent::closed(id, Some(reason)));
                return;
            }
        }

        state.push(client, TransportEvent::opened(id));
        tracing::debug!(%id, %room, %username, "sim relay join");
        state.members.push(Member { client, id, room: room.clone(), username: username.clone() });
        let notice = match self.variant {
            Variant::RoomScoped => format!("🟢 {username} joined room: {room}"),
            Variant::Anonymous => format!("🟢 {username} joined the chat"),
        };
        state.broadcast(&room, &notice);
    }

    /// Relay a frame from `client` on connection `id` to its room.
    ///
    /// # Errors
    ///
    /// - `SimRelayError::NotJoined` if `id` is not a member
    pub fn send(
        &self,
        client: ClientKey,
        id: ConnectionId,
        text: &str,
    ) -> Result<(), SimRelayError> {
        let mut state = self.lock();
        let member = state
            .members
            .iter()
            .find(|m| m.client == client && m.id == id)
            .cloned()
            .ok_or(SimRelayError::NotJoined(id))?;

        state.broadcast(&member.room, &format!("{}: {text}", member.username));
        Ok(())
    }

    /// Client closed connection `id`. Idempotent.
    pub fn disconnect(&self, client: ClientKey, id: ConnectionId) {
        let mut state = self.lock();
        state.held.retain(|(c, held, _)| !(*c == client && *held == id));

        if let Some(member) = state.remove(client, id) {
            tracing::debug!(%id, username = %member.username, "sim relay leave");
            let notice = match self.variant {
                Variant::RoomScoped => {
                    format!("🔴 {} left room: {}", member.username, member.room)
                },
                Variant::Anonymous => format!("🔴 {} left the chat", member.username),
            };
            state.broadcast(&member.room, &notice);
        }
    }

    /// Close every connection of `client`.
    pub fn detach(&self, client: ClientKey) {
        let ids: Vec<_> =
            self.lock().members.iter().filter(|m| m.client == client).map(|m| m.id).collect();
        for id in ids {
            self.disconnect(client, id);
        }
    }

    /// Server-side close of every connection joined as `username`.
    pub fn kick(&self, username: &str, reason: CloseReason) {
        let kicked: Vec<_> =
            self.lock().members.iter().filter(|m| m.username == username).cloned().collect();

        for member in kicked {
            self.lock()
                .push(member.client, TransportEvent::closed(member.id, Some(reason.clone())));
            self.disconnect(member.client, member.id);
        }
    }

    /// Usernames joined to `room`, in join order. Anonymous relays use `""`.
    pub fn members(&self, room: &str) -> Vec<String> {
        self.lock().members.iter().filter(|m| m.room == room).map(|m| m.username.clone()).collect()
    }

    /// Parse `(room, username, token)` from a relay URL.
    fn parse_target(&self, url: &str) -> Option<(String, String, Option<String>)> {
        let url = Url::parse(url).ok()?;
        let segments: Vec<String> = url
            .path_segments()?
            .map(|s| percent_decode_str(s).decode_utf8_lossy().into_owned())
            .collect();

        let ws = segments.iter().rposition(|s| s == "ws")?;
        let rest = &segments[ws + 1..];

        let (room, username) = match (self.variant, rest) {
            (Variant::RoomScoped, [room, username]) => (room.clone(), username.clone()),
            (Variant::Anonymous, [username]) => (String::new(), username.clone()),
            _ => return None,
        };

        let token = url.query_pairs().find(|(k, _)| k == "token").map(|(_, v)| v.into_owned());
        Some((room, username, token))
    }

    fn lock(&self) -> MutexGuard<'_, RelayState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
