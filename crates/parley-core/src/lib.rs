//! Parley Core
//!
//! Data model shared by every Parley crate: the credential that proves an
//! identity to the relay, the address of a room, the endpoint URL composition,
//! and the [`Connection`] state machine that represents one transport session.
//!
//! Nothing in this crate performs I/O. The connection manager in
//! `parley-client` and the session controller in `parley-app` drive these
//! types and hand the resulting actions to a runtime.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod connection;
pub mod credential;
pub mod endpoint;
pub mod error;

pub use connection::{Connection, ConnectionId, ConnectionState};
pub use credential::{Credential, RoomAddress};
pub use endpoint::{Endpoint, Variant};
pub use error::{ConnectionError, EndpointError};
