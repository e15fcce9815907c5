//! UI rendering for the live presence view

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
    Frame,
};

use super::app::App;
use super::card;
use crate::models::Status;
use crate::poller::PollerState;

/// Status indicator glyph and color for a Discord status.
pub fn status_indicator(status: Status) -> (&'static str, Color) {
    match status {
        Status::Online => ("*", Color::Green),
        Status::Idle => ("*", Color::Yellow),
        Status::Dnd => ("*", Color::Red),
        Status::Offline => ("o", Color::DarkGray),
    }
}

/// Main render function
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    // Layout: header (1 line) + card + status bar (1 line)
    let [header_area, card_area, status_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Fill(1),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(header_area, frame.buffer_mut(), app);
    card::render(card_area, frame.buffer_mut(), &app.state);
    render_status(status_area, frame.buffer_mut(), app);
}

/// Render the header bar
fn render_header(area: Rect, buf: &mut Buffer, app: &App) {
    let title = Span::styled(
        " lanyard-cli",
        Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::BOLD),
    );

    let keys = Span::styled(" [r] Retry  [q] Quit ", Style::default().fg(Color::Gray));
    let user = Span::styled(
        format!(" {} ", app.user_id),
        Style::default().fg(Color::Cyan),
    );

    // Right-align the key hints and user id.
    let left_width = " lanyard-cli".len();
    let right_width = "[r] Retry  [q] Quit  ".len() + app.user_id.len() + 2;
    let padding_width = area.width.saturating_sub((left_width + right_width) as u16) as usize;
    let padding = Span::raw(" ".repeat(padding_width));

    let header_line = Line::from(vec![title, padding, keys, user]);
    Paragraph::new(header_line)
        .style(Style::default().bg(Color::DarkGray))
        .render(area, buf);
}

/// Render the status bar
fn render_status(area: Rect, buf: &mut Buffer, app: &App) {
    let line = match &app.state {
        PollerState::Loading => Line::from(Span::styled(
            " Fetching presence...",
            Style::default().fg(Color::DarkGray),
        )),
        PollerState::Ready(snapshot) => {
            let (symbol, color) = status_indicator(snapshot.discord_status);
            Line::from(vec![
                Span::styled(format!(" {} ", symbol), Style::default().fg(color)),
                Span::styled(
                    snapshot.discord_status.label(),
                    Style::default().fg(Color::Gray),
                ),
                Span::styled(
                    "  refreshes every 60s",
                    Style::default().fg(Color::DarkGray),
                ),
            ])
        }
        PollerState::RateLimited { retry_after } => Line::from(Span::styled(
            format!(" Rate limited -- polling paused for {}s ", retry_after),
            Style::default().fg(Color::Yellow),
        )),
        PollerState::Failed(message) => Line::from(Span::styled(
            format!(" {} -- press r to retry ", message),
            Style::default().fg(Color::Red),
        )),
    };

    Paragraph::new(line)
        .style(Style::default().bg(Color::DarkGray))
        .render(area, buf);
}
