//! Deterministic simulation harness for Parley session testing.
//!
//! In-memory stand-ins for the auth service and the relay, plus a
//! [`SimDriver`] that runs the production [`parley_app::Runtime`] against
//! them with a virtual clock. Nothing touches the network or the real clock,
//! so every run of a scenario is identical.
//!
//! # Invariant Testing
//!
//! The `invariants` module provides behavioral testing through invariant
//! checks. Invariants verify WHAT must be true across all execution paths, not
//! specific scenarios. Use [`InvariantRegistry::standard()`] for the session
//! invariants.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod invariants;
pub mod sim_auth;
pub mod sim_driver;
pub mod sim_relay;

pub use invariants::{
    ActiveIsCurrent, ConnectionRequiresIdentity, Invariant, InvariantKind, InvariantRegistry,
    InvariantResult, LogFollowsConnections, SessionSnapshot, SingleLiveConnection, Violation,
};
pub use sim_auth::SimAuthService;
pub use sim_driver::{SimDriver, SimDriverError, SimHandle, SimInput};
pub use sim_relay::{ClientKey, SimRelay, SimRelayError};
