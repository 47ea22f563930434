//! Form state and key handling.
//!
//! The form owns the text the user is typing (username, password, room and
//! message draft) and turns keys into session intents. Everything the
//! session owns (identity, connection, message log, errors) is read back from
//! the [`Session`] when rendering.

use std::{fmt, time::Instant};

use parley_app::{Intent, Session, SessionAction};
use parley_client::CredentialStore;

use crate::{KeyInput, TextInput};

/// Focusable form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Field {
    /// Username, or display name on the anonymous relay.
    #[default]
    Username,
    /// Password, masked.
    Password,
    /// Room to join.
    Room,
    /// Message draft.
    Message,
}

impl Field {
    const ORDER: [Self; 4] = [Self::Username, Self::Password, Self::Room, Self::Message];

    fn index(self) -> usize {
        Self::ORDER.iter().position(|f| *f == self).unwrap_or(0)
    }

    fn next(self) -> Self {
        Self::ORDER[(self.index() + 1) % Self::ORDER.len()]
    }

    fn previous(self) -> Self {
        Self::ORDER[(self.index() + Self::ORDER.len() - 1) % Self::ORDER.len()]
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Username => "Username",
            Self::Password => "Password",
            Self::Room => "Room",
            Self::Message => "Message",
        };
        f.write_str(label)
    }
}

/// State of the on-screen form.
#[derive(Debug, Default)]
pub struct FormState {
    username: TextInput,
    password: TextInput,
    room: TextInput,
    message: TextInput,
    focus: Field,
}

impl FormState {
    /// Create an empty form focused on the username.
    pub fn new() -> Self {
        Self::default()
    }

    /// Focused field.
    pub fn focus(&self) -> Field {
        self.focus
    }

    /// Move focus to `field`.
    pub fn set_focus(&mut self, field: Field) {
        self.focus = field;
    }

    /// Input backing `field`.
    pub fn input(&self, field: Field) -> &TextInput {
        match field {
            Field::Username => &self.username,
            Field::Password => &self.password,
            Field::Room => &self.room,
            Field::Message => &self.message,
        }
    }

    fn input_mut(&mut self, field: Field) -> &mut TextInput {
        match field {
            Field::Username => &mut self.username,
            Field::Password => &mut self.password,
            Field::Room => &mut self.room,
            Field::Message => &mut self.message,
        }
    }

    /// Handle a key, applying intents to `session`.
    ///
    /// Returns the actions the session produced.
    pub fn handle_key<S: CredentialStore>(
        &mut self,
        key: KeyInput,
        session: &mut Session<S>,
        now: Instant,
    ) -> Vec<SessionAction> {
        match key {
            KeyInput::Esc | KeyInput::Ctrl('c') => session.apply(Intent::Quit, now),
            KeyInput::Tab | KeyInput::Down => self.refocus(self.focus.next()),
            KeyInput::BackTab | KeyInput::Up => self.refocus(self.focus.previous()),
            KeyInput::Enter => self.submit(session, now),
            KeyInput::Ctrl('s') => self.authenticate(session, now, true),
            KeyInput::Ctrl('d') => session.apply(Intent::LeaveRoom, now),
            KeyInput::Ctrl('l') => {
                self.username.clear();
                self.password.clear();
                self.message.clear();
                self.focus = Field::Username;
                session.apply(Intent::Logout, now)
            },
            KeyInput::Ctrl(_) => vec![],
            key => self.edit(key, session, now),
        }
    }

    fn refocus(&mut self, field: Field) -> Vec<SessionAction> {
        self.focus = field;
        vec![SessionAction::Render]
    }

    fn edit<S: CredentialStore>(
        &mut self,
        key: KeyInput,
        session: &mut Session<S>,
        now: Instant,
    ) -> Vec<SessionAction> {
        let field = self.focus;
        if !self.input_mut(field).edit(key) {
            return vec![];
        }

        // The session owns the draft
        if field == Field::Message {
            let text = self.message.text().to_string();
            return session.apply(Intent::EditDraft(text), now);
        }
        vec![SessionAction::Render]
    }

    fn submit<S: CredentialStore>(
        &mut self,
        session: &mut Session<S>,
        now: Instant,
    ) -> Vec<SessionAction> {
        match self.focus {
            Field::Username if session.config().is_anonymous() => {
                let name = self.username.text().to_string();
                self.focus = Field::Room;
                session.apply(Intent::ChooseDisplayName { name }, now)
            },
            Field::Username | Field::Password => self.authenticate(session, now, false),
            Field::Room => {
                let mut actions = Vec::new();
                if session.config().is_anonymous() {
                    let name = self.username.text().to_string();
                    actions.extend(session.apply(Intent::ChooseDisplayName { name }, now));
                }
                let room = self.room.text().to_string();
                actions.extend(session.apply(Intent::JoinRoom { room }, now));
                if session.error().is_none() {
                    self.focus = Field::Message;
                }
                actions
            },
            Field::Message => {
                let actions = session.apply(Intent::SubmitDraft, now);
                self.message.set(session.draft());
                actions
            },
        }
    }

    fn authenticate<S: CredentialStore>(
        &mut self,
        session: &mut Session<S>,
        now: Instant,
        signup: bool,
    ) -> Vec<SessionAction> {
        if session.config().is_anonymous() {
            return vec![];
        }

        let username = self.username.text().to_string();
        let password = self.password.text().to_string();
        self.password.clear();
        self.focus = Field::Room;

        let intent = if signup {
            Intent::signup(username, password)
        } else {
            Intent::login(username, password)
        };
        session.apply(intent, now)
    }
}
