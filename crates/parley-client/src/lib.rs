//! Client
//!
//! Collaborators of the Parley session controller: the connection manager
//! that owns the single live relay connection, the credential store that keeps
//! the signed-in identity across restarts, and the auth client that talks to
//! the authentication service.
//!
//! # Architecture
//!
//! The [`ConnectionManager`] is Sans-IO. It receives [`TransportEvent`]s and
//! intents, updates the [`parley_core::Connection`] it owns, and returns
//! [`ConnectionAction`]s for the caller to execute. The caller decides how
//! frames actually move.
//!
//! # Components
//!
//! - [`ConnectionManager`]: one connection at a time, stale events dropped
//! - [`CredentialStore`]: get/set/clear contract with memory and file backends
//! - [`AuthClient`]: login/signup contract and failure taxonomy
//!
//! # Transport (optional)
//!
//! With the `transport` feature enabled, this crate also provides:
//! - [`transport::Transport`]: WebSocket connections via tokio-tungstenite
//! - [`http::HttpAuthClient`]: the auth service over HTTP via reqwest

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod auth;
mod event;
mod manager;
mod store;

#[cfg(feature = "transport")]
pub mod http;
#[cfg(feature = "transport")]
pub mod transport;

pub use auth::{AuthClient, AuthError, AuthFailure, AuthKind, AuthRequest};
pub use event::{
    CLOSE_GOING_AWAY, CLOSE_NORMAL, CLOSE_POLICY_VIOLATION, CloseReason, ConnectionAction,
    TransportEvent, TransportEventKind,
};
pub use manager::ConnectionManager;
pub use parley_core::{
    Connection, ConnectionError, ConnectionId, ConnectionState, Credential, Endpoint, RoomAddress,
    Variant,
};
pub use store::{
    CredentialStore, FileCredentialStore, MemoryCredentialStore, PersistenceError,
    default_credential_path,
};
