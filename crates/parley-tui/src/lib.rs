//! Terminal UI for Parley
//!
//! A thin shell over [`parley_app::Driver`] that provides terminal-specific
//! I/O. All orchestration logic lives in the generic [`parley_app::Runtime`].
//!
//! This crate only handles the form, key translation and rendering.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod form;
pub mod input;
pub mod terminal;
pub mod ui;

pub use form::{Field, FormState};
pub use input::{KeyInput, TextInput};
pub use parley_app::{Driver, Runtime, Session};
pub use terminal::{TerminalDriver, TerminalError};
