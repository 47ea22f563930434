//! Terminal driver for the TUI.
//!
//! Implements the [`Driver`] trait for terminal I/O using crossterm for
//! keyboard events and ratatui for rendering. The relay is reached over
//! WebSockets and the auth service over HTTP.

use std::{
    io::{self, Stdout, stdout},
    time::{Duration, Instant},
};

use crossterm::{
    ExecutableCommand,
    event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures::StreamExt;
use parley_app::{Driver, Session, SessionAction, SessionEvent};
use parley_client::{
    AuthClient, AuthError, AuthRequest, FileCredentialStore,
    http::HttpAuthClient,
    transport::{Transport, TransportError},
};
use parley_core::{ConnectionId, Credential};
use ratatui::{Terminal, backend::CrosstermBackend};
use thiserror::Error;
use tokio::time::{Interval, MissedTickBehavior};

use crate::{FormState, KeyInput, ui};

const TICK_INTERVAL: Duration = Duration::from_millis(250);

/// Terminal driver errors.
#[derive(Debug, Error)]
pub enum TerminalError {
    /// I/O error from terminal operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Transport error.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Terminal driver implementing the [`Driver`] trait.
///
/// Handles terminal I/O (crossterm), rendering (ratatui), the relay
/// connection and auth requests. Owns the form state for text editing.
pub struct TerminalDriver {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    event_stream: EventStream,
    transport: Transport,
    auth: HttpAuthClient,
    form: FormState,
    ticks: Interval,
}

impl TerminalDriver {
    /// Take over the terminal.
    ///
    /// Must be called inside a tokio runtime.
    pub fn new(auth: HttpAuthClient) -> Result<Self, TerminalError> {
        enable_raw_mode()?;
        stdout().execute(EnterAlternateScreen)?;

        let backend = CrosstermBackend::new(stdout());
        let terminal = Terminal::new(backend)?;

        let mut ticks = tokio::time::interval(TICK_INTERVAL);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);

        Ok(Self {
            terminal,
            event_stream: EventStream::new(),
            transport: Transport::new(),
            auth,
            form: FormState::new(),
            ticks,
        })
    }

    /// Convert a crossterm key event to `KeyInput`.
    pub fn convert_key(event: KeyEvent) -> Option<KeyInput> {
        if event.modifiers.contains(KeyModifiers::CONTROL) {
            return match event.code {
                KeyCode::Char(c) => Some(KeyInput::Ctrl(c.to_ascii_lowercase())),
                _ => None,
            };
        }

        match event.code {
            KeyCode::Char(c) => Some(KeyInput::Char(c)),
            KeyCode::Enter => Some(KeyInput::Enter),
            KeyCode::Backspace => Some(KeyInput::Backspace),
            KeyCode::Delete => Some(KeyInput::Delete),
            KeyCode::Tab => Some(KeyInput::Tab),
            KeyCode::BackTab => Some(KeyInput::BackTab),
            KeyCode::Esc => Some(KeyInput::Esc),
            KeyCode::Left => Some(KeyInput::Left),
            KeyCode::Right => Some(KeyInput::Right),
            KeyCode::Up => Some(KeyInput::Up),
            KeyCode::Down => Some(KeyInput::Down),
            KeyCode::Home => Some(KeyInput::Home),
            KeyCode::End => Some(KeyInput::End),
            _ => None,
        }
    }
}

impl Driver for TerminalDriver {
    type Error = TerminalError;
    type Store = FileCredentialStore;

    async fn poll_event(
        &mut self,
        session: &mut Session<Self::Store>,
    ) -> Result<Vec<SessionAction>, Self::Error> {
        tokio::select! {
            biased;

            // Terminal events
            maybe_event = self.event_stream.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key_event))) if key_event.kind == KeyEventKind::Press => {
                        match Self::convert_key(key_event) {
                            Some(key) => Ok(self.form.handle_key(key, session, Instant::now())),
                            None => Ok(vec![]),
                        }
                    },
                    Some(Ok(Event::Resize(..))) => Ok(vec![SessionAction::Render]),
                    Some(Err(e)) => Err(TerminalError::Io(e)),
                    // Input closed, nothing left to drive the session
                    None => Ok(session.quit()),
                    _ => Ok(vec![]),
                }
            }

            // Relay events
            Some(event) = self.transport.next_event() => {
                Ok(session.handle(event.into()))
            }

            // Connect timeout checks
            _ = self.ticks.tick() => {
                Ok(session.handle(SessionEvent::Tick { now: Instant::now() }))
            }
        }
    }

    async fn authenticate(&mut self, request: AuthRequest) -> Result<Credential, AuthError> {
        self.auth.authenticate(&request).await
    }

    fn dial(&mut self, id: ConnectionId, url: &str) -> Result<(), Self::Error> {
        self.transport.dial(id, url);
        Ok(())
    }

    fn transmit(&mut self, id: ConnectionId, text: String) -> Result<(), Self::Error> {
        Ok(self.transport.transmit(id, text)?)
    }

    fn hang_up(&mut self, id: ConnectionId) {
        self.transport.hang_up(id);
    }

    fn now(&self) -> Instant {
        Instant::now()
    }

    fn render(&mut self, session: &Session<Self::Store>) -> Result<(), Self::Error> {
        self.terminal.draw(|frame| {
            ui::render(frame, session, &self.form);
        })?;
        Ok(())
    }

    fn stop(&mut self) {
        self.transport.stop();
    }
}

impl Drop for TerminalDriver {
    fn drop(&mut self) {
        self.stop();
        let _ = disable_raw_mode();
        let _ = stdout().execute(LeaveAlternateScreen);
    }
}
