//! Simulation driver implementing the Driver trait.
//!
//! `SimDriver` provides the same interface as `TerminalDriver` but for
//! deterministic testing. It implements [`Driver`] so the same
//! [`parley_app::Runtime`] orchestration code runs in both production and
//! simulation.
//!
//! Inputs come from a script of intents and clock advances; the relay's
//! inbox for this client is always drained before the next scripted input.
//! When both run dry the driver asks the runtime to quit without hanging up,
//! so a test can queue more input and drive the same runtime again. That is
//! how several clients take turns on one relay.

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::{Duration, Instant},
};

use parley_app::{Driver, Intent, Session, SessionAction, SessionEvent};
use parley_client::{AuthClient, AuthError, AuthRequest, MemoryCredentialStore};
use parley_core::{ConnectionId, Credential};

use crate::{
    ClientKey, SimAuthService, SimRelay,
    invariants::{InvariantRegistry, SessionSnapshot},
};

/// Error type for simulation driver.
#[derive(Debug, Clone)]
pub struct SimDriverError(pub String);

impl std::fmt::Display for SimDriverError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SimDriverError: {}", self.0)
    }
}

impl std::error::Error for SimDriverError {}

/// One scripted input.
#[derive(Debug, Clone)]
pub enum SimInput {
    /// User intent, applied at the current virtual time.
    Intent(Intent),
    /// Move the virtual clock forward and deliver a tick.
    Advance(Duration),
}

impl From<Intent> for SimInput {
    fn from(intent: Intent) -> Self {
        Self::Intent(intent)
    }
}

/// Shared state for input injection and I/O capture.
///
/// The runtime owns the driver; [`SimHandle`] reaches this from the test.
#[derive(Default)]
struct SharedState {
    script: VecDeque<SimInput>,
    dialed: Vec<(ConnectionId, String)>,
    transmitted: Vec<(ConnectionId, String)>,
    hung_up: Vec<ConnectionId>,
    auth_requests: usize,
    renders: usize,
    stopped: bool,
}

/// Test-side handle to a [`SimDriver`].
#[derive(Clone)]
pub struct SimHandle {
    state: Arc<Mutex<SharedState>>,
}

impl SimHandle {
    fn lock(&self) -> MutexGuard<'_, SharedState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue an input.
    pub fn push(&self, input: impl Into<SimInput>) {
        self.lock().script.push_back(input.into());
    }

    /// Queue several inputs in order.
    pub fn extend(&self, inputs: impl IntoIterator<Item = SimInput>) {
        self.lock().script.extend(inputs);
    }

    /// Queue a clock advance.
    pub fn advance(&self, by: Duration) {
        self.push(SimInput::Advance(by));
    }

    /// Every dial so far as `(id, url)`.
    pub fn dialed(&self) -> Vec<(ConnectionId, String)> {
        self.lock().dialed.clone()
    }

    /// Every transmitted frame so far as `(id, text)`.
    pub fn transmitted(&self) -> Vec<(ConnectionId, String)> {
        self.lock().transmitted.clone()
    }

    /// Every hang-up so far.
    pub fn hung_up(&self) -> Vec<ConnectionId> {
        self.lock().hung_up.clone()
    }

    /// Number of auth requests the runtime made.
    pub fn auth_requests(&self) -> usize {
        self.lock().auth_requests
    }

    /// Number of renders.
    pub fn renders(&self) -> usize {
        self.lock().renders
    }

    /// True once the runtime stopped the driver.
    pub fn is_stopped(&self) -> bool {
        self.lock().stopped
    }
}

/// Simulation driver for deterministic testing.
///
/// Implements [`Driver`] so the same [`parley_app::Runtime`] orchestration
/// code runs in both production TUI and simulation tests.
pub struct SimDriver {
    state: Arc<Mutex<SharedState>>,
    relay: SimRelay,
    client: ClientKey,
    auth: SimAuthService,
    /// Virtual clock. Only moves on [`SimInput::Advance`].
    now: Instant,
    invariants: Option<InvariantRegistry>,
}

impl SimDriver {
    /// Create a driver attached to `relay`, authenticating against `auth`.
    pub fn new(relay: SimRelay, auth: SimAuthService) -> Self {
        let client = relay.attach();
        Self {
            state: Arc::default(),
            relay,
            client,
            auth,
            now: Instant::now(),
            invariants: None,
        }
    }

    /// Enable invariant checking after every poll.
    #[must_use]
    pub fn with_invariants(mut self, registry: InvariantRegistry) -> Self {
        self.invariants = Some(registry);
        self
    }

    /// Handle for queueing input and inspecting I/O.
    pub fn handle(&self) -> SimHandle {
        SimHandle { state: Arc::clone(&self.state) }
    }

    /// This driver's key on the relay.
    pub fn client(&self) -> ClientKey {
        self.client
    }

    /// Relay this driver is attached to.
    pub fn relay(&self) -> &SimRelay {
        &self.relay
    }

    fn lock(&self) -> MutexGuard<'_, SharedState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn next_actions(&mut self, session: &mut Session<MemoryCredentialStore>) -> Vec<SessionAction> {
        let inbox = self.relay.drain(self.client);
        if !inbox.is_empty() {
            return inbox.into_iter().flat_map(|event| session.handle(event.into())).collect();
        }

        let input = self.lock().script.pop_front();
        match input {
            Some(SimInput::Intent(intent)) => session.apply(intent, self.now),
            Some(SimInput::Advance(by)) => {
                self.now += by;
                session.handle(SessionEvent::Tick { now: self.now })
            },
            None => vec![SessionAction::Quit],
        }
    }

    /// Check invariants against session state.
    ///
    /// # Errors
    ///
    /// Returns every violation found, joined into one error.
    pub fn check_invariants(
        &self,
        session: &Session<MemoryCredentialStore>,
    ) -> Result<(), SimDriverError> {
        let Some(registry) = &self.invariants else {
            return Ok(());
        };

        registry.check_all(&SessionSnapshot::from_session(session)).map_err(|violations| {
            let messages: Vec<_> = violations.iter().map(ToString::to_string).collect();
            SimDriverError(format!("invariants violated: {}", messages.join("; ")))
        })
    }
}

impl Driver for SimDriver {
    type Error = SimDriverError;
    type Store = MemoryCredentialStore;

    async fn poll_event(
        &mut self,
        session: &mut Session<Self::Store>,
    ) -> Result<Vec<SessionAction>, Self::Error> {
        let actions = self.next_actions(session);
        self.check_invariants(session)?;
        Ok(actions)
    }

    async fn authenticate(&mut self, request: AuthRequest) -> Result<Credential, AuthError> {
        self.lock().auth_requests += 1;
        self.auth.authenticate(&request).await
    }

    fn dial(&mut self, id: ConnectionId, url: &str) -> Result<(), Self::Error> {
        self.lock().dialed.push((id, url.to_string()));
        self.relay.connect(self.client, id, url).map_err(|e| SimDriverError(e.to_string()))
    }

    fn transmit(&mut self, id: ConnectionId, text: String) -> Result<(), Self::Error> {
        self.lock().transmitted.push((id, text.clone()));
        self.relay.send(self.client, id, &text).map_err(|e| SimDriverError(e.to_string()))
    }

    fn hang_up(&mut self, id: ConnectionId) {
        self.lock().hung_up.push(id);
        self.relay.disconnect(self.client, id);
    }

    fn now(&self) -> Instant {
        self.now
    }

    fn render(&mut self, _session: &Session<Self::Store>) -> Result<(), Self::Error> {
        self.lock().renders += 1;
        Ok(())
    }

    fn stop(&mut self) {
        self.relay.detach(self.client);
        self.lock().stopped = true;
    }
}
