//! Application layer for Parley
//!
//! Pure session state machine and generic runtime, enabling deterministic
//! simulation testing with the same code that runs in production.
//!
//! # Components
//!
//! - [`Session`]: session controller (identity, single connection, message log)
//! - [`Intent`]: what the view asks the session to do
//! - [`Driver`]: trait for platform-specific I/O abstraction
//! - [`Runtime`]: generic orchestration loop using Driver

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod action;
mod config;
mod driver;
mod error;
mod event;
mod intent;
mod runtime;
mod session;
mod state;

pub use action::SessionAction;
pub use config::SessionConfig;
pub use driver::Driver;
pub use error::{PreconditionError, SessionError};
pub use event::SessionEvent;
pub use intent::Intent;
pub use runtime::Runtime;
pub use session::Session;
pub use state::{Message, Status};
