//! Session configuration.

use std::time::Duration;

use parley_core::{Endpoint, Variant};

/// Settings fixed for the lifetime of a session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Relay endpoint. Its variant selects anonymous or room-scoped joins.
    pub endpoint: Endpoint,
    /// Abandon a connection stuck in `Connecting` after this long. `None`
    /// waits forever.
    pub connect_timeout: Option<Duration>,
}

impl SessionConfig {
    /// Configuration with no connect timeout.
    pub fn new(endpoint: Endpoint) -> Self {
        Self { endpoint, connect_timeout: None }
    }

    /// Set the connect timeout.
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Endpoint variant.
    pub fn variant(&self) -> Variant {
        self.endpoint.variant()
    }

    /// True for the anonymous relay, where joining needs only a display name.
    pub fn is_anonymous(&self) -> bool {
        self.variant() == Variant::Anonymous
    }
}
