//! Chat area
//!
//! Displays the message log, newest at the bottom.

use parley_app::Session;
use parley_client::CredentialStore;
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem},
};

const BORDER_SIZE: u16 = 2;

/// Render the chat area.
pub fn render<S: CredentialStore>(frame: &mut Frame, session: &Session<S>, area: Rect) {
    let title = match (session.room(), session.is_connected()) {
        (Some(room), _) => format!(" #{room} "),
        (None, true) => " Chat ".to_string(),
        (None, false) => " Not in a room ".to_string(),
    };

    let block = Block::default().borders(Borders::ALL).title(title);

    let items: Vec<ListItem> = if session.messages().is_empty() {
        vec![ListItem::new(Line::from(Span::styled(
            "Join a room to start chatting",
            Style::default().fg(Color::DarkGray),
        )))]
    } else {
        session.messages().iter().map(|msg| ListItem::new(msg.text.as_str())).collect()
    };

    let visible_height = area.height.saturating_sub(BORDER_SIZE) as usize;
    let skip = items.len().saturating_sub(visible_height);
    let visible_items: Vec<_> = items.into_iter().skip(skip).collect();

    frame.render_widget(List::new(visible_items).block(block), area);
}
