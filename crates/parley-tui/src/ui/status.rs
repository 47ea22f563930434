//! Status bar
//!
//! Displays identity, connection status and the last error.

use parley_app::{Session, Status};
use parley_client::CredentialStore;
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};

/// Render the status bar.
pub fn render<S: CredentialStore>(frame: &mut Frame, session: &Session<S>, area: Rect) {
    let status = session.status();
    let color = match status {
        Status::SignedOut => Color::Red,
        Status::Authenticating | Status::Connecting => Color::Yellow,
        Status::Ready => Color::White,
        Status::Connected => Color::Green,
    };

    let mut spans = vec![
        Span::raw(" "),
        Span::styled(status.to_string(), Style::default().fg(color).add_modifier(Modifier::BOLD)),
    ];

    if let Some(identity) = session.identity() {
        spans.push(Span::raw(format!(" | {identity}")));
    }

    if let Some(error) = session.error() {
        spans.push(Span::styled(format!(" | {error}"), Style::default().fg(Color::LightRed)));
    }

    let style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let paragraph = Paragraph::new(Line::from(spans)).style(style);

    frame.render_widget(paragraph, area);
}
