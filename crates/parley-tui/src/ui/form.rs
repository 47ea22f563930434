//! Form fields
//!
//! Username, password and room boxes, plus the message draft line. The
//! focused box gets a highlighted border and the terminal cursor.

use parley_app::Session;
use parley_client::CredentialStore;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    widgets::{Block, Borders, Paragraph},
};

use crate::{Field, FormState};

const MASK: char = '•';
const BORDER_OFFSET: u16 = 1;

/// Render the username, password and room boxes side by side.
pub fn render_fields<S: CredentialStore>(
    frame: &mut Frame,
    session: &Session<S>,
    form: &FormState,
    area: Rect,
) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 3), Constraint::Ratio(1, 3), Constraint::Ratio(1, 3)])
        .split(area);

    let [user_area, pass_area, room_area] = chunks.as_ref() else {
        return;
    };

    let user_title = if session.config().is_anonymous() {
        " Display name ".to_string()
    } else {
        format!(" {} ", Field::Username)
    };
    render_field(frame, form, Field::Username, &user_title, *user_area);
    render_field(frame, form, Field::Password, &format!(" {} ", Field::Password), *pass_area);
    render_field(frame, form, Field::Room, &format!(" {} ", Field::Room), *room_area);
}

/// Render one field in a bordered box.
pub fn render_field(frame: &mut Frame, form: &FormState, field: Field, title: &str, area: Rect) {
    let input = form.input(field);
    let focused = form.focus() == field;

    let text = if field == Field::Password {
        MASK.to_string().repeat(input.len())
    } else {
        input.text().to_string()
    };

    let border = if focused { Color::Yellow } else { Color::DarkGray };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
        .title(title.to_string());

    frame.render_widget(Paragraph::new(text).block(block), area);

    if focused {
        let max_x = area.x.saturating_add(area.width).saturating_sub(BORDER_OFFSET + 1);
        let cursor_x = area
            .x
            .saturating_add(BORDER_OFFSET)
            .saturating_add(input.cursor() as u16)
            .min(max_x);
        frame.set_cursor_position((cursor_x, area.y.saturating_add(BORDER_OFFSET)));
    }
}
