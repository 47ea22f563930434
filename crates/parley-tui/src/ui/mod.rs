//! UI rendering
//!
//! Rendering functions that convert session and form state into terminal
//! output using ratatui widgets. All functions are pure (no I/O), taking
//! state and drawing into the frame.

mod chat;
mod form;
mod status;

use parley_app::Session;
use parley_client::CredentialStore;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout},
};

use crate::{Field, FormState};

/// Render the entire UI.
pub fn render<S: CredentialStore>(frame: &mut Frame, session: &Session<S>, form: &FormState) {
    const FORM_HEIGHT: u16 = 3;
    const CHAT_MIN_HEIGHT: u16 = 3;
    const DRAFT_HEIGHT: u16 = 3;
    const STATUS_HEIGHT: u16 = 1;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(FORM_HEIGHT),
            Constraint::Min(CHAT_MIN_HEIGHT),
            Constraint::Length(DRAFT_HEIGHT),
            Constraint::Length(STATUS_HEIGHT),
        ])
        .split(frame.area());

    let [form_area, chat_area, draft_area, status_area] = chunks.as_ref() else {
        return;
    };

    form::render_fields(frame, session, form, *form_area);
    chat::render(frame, session, *chat_area);
    form::render_field(frame, form, Field::Message, &format!(" {} ", Field::Message), *draft_area);
    status::render(frame, session, *status_area);
}
