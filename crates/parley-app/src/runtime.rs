//! Generic runtime for session orchestration.
//!
//! The Runtime drives the session event loop, coordinating between:
//! - [`Session`]: the session state machine
//! - [`Driver`]: platform-specific I/O

use parley_client::TransportEvent;

use crate::{Driver, Session, SessionAction, SessionEvent};

/// Generic runtime that orchestrates a [`Session`] through a [`Driver`].
pub struct Runtime<D: Driver> {
    driver: D,
    session: Session<D::Store>,
}

impl<D: Driver> Runtime<D> {
    /// Create a runtime for `session` using `driver` for I/O.
    pub fn new(driver: D, session: Session<D::Store>) -> Self {
        Self { driver, session }
    }

    /// Run the event loop until the session quits, then stop the driver.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver encounters an I/O error.
    pub async fn run(mut self) -> Result<(), D::Error> {
        let result = self.drive().await;
        self.driver.stop();
        result
    }

    /// Run the event loop until the session quits.
    ///
    /// Each cycle polls the driver for input, then executes the resulting
    /// actions. Leaves the driver running so callers can inspect it.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver encounters an I/O error.
    pub async fn drive(&mut self) -> Result<(), D::Error> {
        self.driver.render(&self.session)?;

        loop {
            let actions = self.driver.poll_event(&mut self.session).await?;
            if !actions.is_empty() && self.process_actions(actions).await? {
                return Ok(());
            }
        }
    }

    /// Execute actions, feeding completions back into the session.
    ///
    /// Returns `true` if should quit.
    async fn process_actions(
        &mut self,
        initial_actions: Vec<SessionAction>,
    ) -> Result<bool, D::Error> {
        let mut pending_actions = initial_actions;

        while !pending_actions.is_empty() {
            let actions = std::mem::take(&mut pending_actions);

            for action in actions {
                match action {
                    SessionAction::Render => self.driver.render(&self.session)?,
                    SessionAction::Quit => return Ok(true),
                    SessionAction::Authenticate(request) => {
                        let result = self.driver.authenticate(request).await;
                        pending_actions
                            .extend(self.session.handle(SessionEvent::AuthCompleted(result)));
                    },
                    SessionAction::Dial { id, url } => {
                        if let Err(e) = self.driver.dial(id, &url) {
                            tracing::warn!(%id, error = %e, "dial failed");
                            let event = TransportEvent::failed(id, e.to_string());
                            pending_actions.extend(self.session.handle(event.into()));
                        }
                    },
                    SessionAction::Transmit { id, text } => {
                        if let Err(e) = self.driver.transmit(id, text) {
                            tracing::warn!(%id, error = %e, "transmit failed");
                            let event = TransportEvent::failed(id, e.to_string());
                            pending_actions.extend(self.session.handle(event.into()));
                        }
                    },
                    SessionAction::HangUp { id } => self.driver.hang_up(id),
                }
            }
        }
        Ok(false)
    }

    /// Get a reference to the Session
    pub fn session(&self) -> &Session<D::Store> {
        &self.session
    }

    /// Get a mutable reference to the Session
    pub fn session_mut(&mut self) -> &mut Session<D::Store> {
        &mut self.session
    }

    /// Get a reference to the Driver
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Get a mutable reference to the Driver
    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    /// Split into driver and session.
    pub fn into_parts(self) -> (D, Session<D::Store>) {
        (self.driver, self.session)
    }
}
