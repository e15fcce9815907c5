//! Presence card: status, activities and Spotify listening data.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, Widget},
};
use unicode_width::UnicodeWidthChar;

use super::ui::status_indicator;
use crate::models::{now_unix_ms, PresenceSnapshot};
use crate::poller::PollerState;

/// Render the card for the current poller state.
pub fn render(area: Rect, buf: &mut Buffer, state: &PollerState) {
    match state {
        PollerState::Loading => render_skeleton(area, buf),
        PollerState::Ready(snapshot) => render_snapshot(area, buf, snapshot),
        PollerState::RateLimited { retry_after } => render_notice(
            area,
            buf,
            Color::Yellow,
            vec![
                "Rate limited by the presence API.".to_string(),
                format!("Polling resumes in about {}s.", retry_after),
            ],
        ),
        PollerState::Failed(message) => render_notice(
            area,
            buf,
            Color::Red,
            vec![message.clone(), "Press r to retry.".to_string()],
        ),
    }
}

fn card_block(border_color: Color) -> Block<'static> {
    Block::default()
        .title(" Discord Status ")
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(border_color))
}

/// Placeholder bars shown while the first fetch is pending.
fn render_skeleton(area: Rect, buf: &mut Buffer) {
    let block = card_block(Color::DarkGray);
    let inner = block.inner(area);
    block.render(area, buf);

    if inner.height == 0 || inner.width == 0 {
        return;
    }

    let dim = Style::default().fg(Color::DarkGray);
    let bar = |w: usize| "\u{2591}".repeat(w.min(inner.width as usize));
    let lines = vec![
        Line::from(Span::styled(bar(18), dim)),
        Line::from(Span::styled(bar(10), dim)),
        Line::from(""),
        Line::from(Span::styled(bar(24), dim)),
    ];
    Paragraph::new(lines).render(inner, buf);
}

/// Degraded card for rate-limit and failure states.
fn render_notice(area: Rect, buf: &mut Buffer, color: Color, messages: Vec<String>) {
    let block = card_block(color);
    let inner = block.inner(area);
    block.render(area, buf);

    if inner.height == 0 || inner.width == 0 {
        return;
    }

    let width = inner.width as usize;
    let lines: Vec<Line> = messages
        .into_iter()
        .map(|m| {
            Line::from(Span::styled(
                truncate_to_width(&m, width),
                Style::default().fg(color),
            ))
        })
        .collect();
    Paragraph::new(lines).render(inner, buf);
}

fn render_snapshot(area: Rect, buf: &mut Buffer, snapshot: &PresenceSnapshot) {
    let block = card_block(Color::Gray);
    let inner = block.inner(area);
    block.render(area, buf);

    if inner.height == 0 || inner.width == 0 {
        return;
    }

    let width = inner.width as usize;
    let now = now_unix_ms();
    let mut lines = Vec::new();

    let user = &snapshot.discord_user;
    let (symbol, color) = status_indicator(snapshot.discord_status);

    lines.push(Line::from(vec![
        Span::styled(format!(" {} ", symbol), Style::default().fg(color)),
        Span::styled(
            user.display_name().to_string(),
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!(" (@{})", user.username),
            Style::default().fg(Color::DarkGray),
        ),
    ]));
    lines.push(Line::from(vec![
        Span::raw("   "),
        Span::styled(
            snapshot.discord_status.label(),
            Style::default().fg(color),
        ),
        Span::styled(
            platform_suffix(snapshot),
            Style::default().fg(Color::DarkGray),
        ),
    ]));

    if !snapshot.activities.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            " ACTIVITIES",
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )));

        for activity in &snapshot.activities {
            let elapsed = activity.elapsed(now).unwrap_or_default();
            lines.push(two_col_line(
                format!("  {}", activity.name),
                elapsed,
                width,
                Style::default().fg(Color::White),
                Style::default().fg(Color::DarkGray),
            ));

            let detail = match (&activity.details, &activity.state) {
                (Some(details), Some(state)) => Some(format!("{} / {}", details, state)),
                (Some(details), None) => Some(details.clone()),
                (None, Some(state)) => Some(state.clone()),
                (None, None) => None,
            };
            if let Some(detail) = detail {
                lines.push(Line::from(Span::styled(
                    truncate_to_width(&format!("    {}", detail), width),
                    Style::default().fg(Color::Gray),
                )));
            }
        }
    }

    if snapshot.listening_to_spotify {
        if let Some(spotify) = &snapshot.spotify {
            lines.push(Line::from(""));
            lines.push(two_col_line(
                " \u{266A} Spotify".to_string(),
                spotify.elapsed(now).unwrap_or_default(),
                width,
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD),
                Style::default().fg(Color::DarkGray),
            ));
            lines.push(Line::from(Span::styled(
                truncate_to_width(&format!("    {}", spotify.song), width),
                Style::default().fg(Color::White),
            )));
            lines.push(Line::from(Span::styled(
                truncate_to_width(
                    &format!("    {} -- {}", spotify.artist, spotify.album),
                    width,
                ),
                Style::default().fg(Color::Gray),
            )));
        }
    }

    Paragraph::new(lines).render(inner, buf);
}

fn platform_suffix(snapshot: &PresenceSnapshot) -> String {
    let mut platforms = Vec::new();
    if snapshot.active_on_discord_desktop {
        platforms.push("desktop");
    }
    if snapshot.active_on_discord_mobile {
        platforms.push("mobile");
    }
    if snapshot.active_on_discord_web {
        platforms.push("web");
    }
    if platforms.is_empty() {
        String::new()
    } else {
        format!("  [{}]", platforms.join(", "))
    }
}

/// Left-aligned text with a right-aligned suffix, truncated to `width`.
fn two_col_line(
    left: String,
    right: String,
    width: usize,
    left_style: Style,
    right_style: Style,
) -> Line<'static> {
    let right_len = right.chars().count();
    let max_left = if right_len > 0 {
        width.saturating_sub(right_len + 1)
    } else {
        width
    };

    let left_truncated = truncate_to_width(&left, max_left);
    let left_len: usize = left_truncated.chars().filter_map(|c| c.width()).sum();
    let pad = width.saturating_sub(left_len + right_len);

    Line::from(vec![
        Span::styled(left_truncated, left_style),
        Span::styled(" ".repeat(pad), left_style),
        Span::styled(right, right_style),
    ])
}

/// Truncate a string to a terminal display width, unicode-aware.
fn truncate_to_width(s: &str, width: usize) -> String {
    let mut out = String::new();
    let mut used = 0;
    for ch in s.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w > width {
            break;
        }
        used += w;
        out.push(ch);
    }
    out
}
