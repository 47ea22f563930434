//! Driver trait for abstracting I/O operations.
//!
//! The [`Driver`] trait decouples the session runtime from specific I/O
//! implementations. Each frontend implements the trait to provide
//! platform-specific I/O, while the generic [`crate::Runtime`] handles all
//! orchestration.

use std::{future::Future, time::Instant};

use parley_client::{AuthError, AuthRequest, CredentialStore};
use parley_core::{ConnectionId, Credential};

use crate::{Session, SessionAction};

/// Abstracts I/O operations for the session runtime.
///
/// # Implementations
///
/// - **TUI**: crossterm for terminal events, tokio-tungstenite for the relay,
///   reqwest for the auth service
/// - **Simulation**: scripted intents against an in-memory relay and auth
///   service
pub trait Driver: Send {
    /// Platform-specific error type.
    type Error: std::error::Error + Send + 'static;

    /// Credential store the session persists into.
    type Store: CredentialStore;

    /// Wait for the next input and apply it to the session.
    ///
    /// Inputs are user intents, transport events and clock ticks. Returns the
    /// actions the session produced, possibly none.
    ///
    /// # Errors
    ///
    /// Returns an error if the input source fails.
    fn poll_event(
        &mut self,
        session: &mut Session<Self::Store>,
    ) -> impl Future<Output = Result<Vec<SessionAction>, Self::Error>> + Send;

    /// Perform a login or signup against the auth service.
    fn authenticate(
        &mut self,
        request: AuthRequest,
    ) -> impl Future<Output = Result<Credential, AuthError>> + Send;

    /// Start opening connection `id` to `url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be started. The runtime
    /// reports it to the session as a transport failure.
    fn dial(&mut self, id: ConnectionId, url: &str) -> Result<(), Self::Error>;

    /// Send one text frame on `id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection is gone. The runtime reports it to
    /// the session as a transport failure.
    fn transmit(&mut self, id: ConnectionId, text: String) -> Result<(), Self::Error>;

    /// Close connection `id`. Idempotent.
    fn hang_up(&mut self, id: ConnectionId);

    /// Current time.
    fn now(&self) -> Instant;

    /// Render the session state.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails.
    fn render(&mut self, session: &Session<Self::Store>) -> Result<(), Self::Error>;

    /// Close all connections and clean up resources.
    fn stop(&mut self);
}
