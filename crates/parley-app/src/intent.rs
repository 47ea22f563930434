//! User intents.

use parley_client::AuthRequest;

/// What the user asked for.
///
/// The view translates raw input into intents and hands them to
/// [`crate::Session::apply`]. Decouples the session from any particular
/// input device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// Log in or sign up.
    Authenticate(AuthRequest),

    /// Pick the name to join under (anonymous relay).
    ChooseDisplayName {
        /// Display name.
        name: String,
    },

    /// Join a room, leaving the current one.
    JoinRoom {
        /// Room name. Ignored by the anonymous relay.
        room: String,
    },

    /// Replace the draft text.
    EditDraft(String),

    /// Send `text` as one message.
    SendMessage {
        /// Message text.
        text: String,
    },

    /// Send the current draft.
    SubmitDraft,

    /// Leave the current room.
    LeaveRoom,

    /// Sign out and forget the stored credential.
    Logout,

    /// Exit the application.
    Quit,
}

impl Intent {
    /// Sign in to an existing account.
    pub fn login(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Authenticate(AuthRequest::login(username, password))
    }

    /// Create an account and sign in.
    pub fn signup(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Authenticate(AuthRequest::signup(username, password))
    }
}
